//! Structured logging setup for the `taskwatch` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary.

use std::env;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter; `RUST_LOG` is the fallback.
pub const LOG_ENV: &str = "TASKWATCH_LOG";

/// Filter used when neither variable is set.
pub const DEFAULT_FILTER: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Raised when the filter directive cannot be parsed.
    #[error("invalid log filter '{directive}': {message}")]
    Filter {
        /// Directive as read from the environment.
        directive: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when a global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    SubscriberInit(String),
}

/// Builds the filter from [`LOG_ENV`], then `RUST_LOG`, then
/// [`DEFAULT_FILTER`].
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when the chosen directive is malformed.
pub fn build_filter() -> Result<EnvFilter, LoggingError> {
    let directive = non_blank_var(LOG_ENV)
        .or_else(|| non_blank_var("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_FILTER.to_owned());
    EnvFilter::try_new(&directive).map_err(|err| LoggingError::Filter {
        directive,
        message: err.to_string(),
    })
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Installs a human-readable subscriber writing to stderr, keeping stdout
/// free for command results.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is malformed or a subscriber is
/// already installed.
pub fn init() -> Result<(), LoggingError> {
    let filter = build_filter()?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| LoggingError::SubscriberInit(err.to_string()))
}
