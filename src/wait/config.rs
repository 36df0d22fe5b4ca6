//! Interval and deadline settings for a single wait.

use std::time::Duration;

use thiserror::Error;

/// Interval used when a caller does not supply one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Overall deadline used when a caller does not supply one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Failure text reported when no message has been attached to the config.
pub const DEFAULT_TIMEOUT_MESSAGE: &str = "condition not met";

/// Polling interval, overall timeout and failure message for one wait.
///
/// Both durations are validated at construction so a poll loop never spins
/// without sleeping and never gives up before its first check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaitConfig {
    interval: Duration,
    timeout: Duration,
    message: Option<String>,
}

impl WaitConfig {
    /// Creates a config from an interval and a timeout.
    ///
    /// A timeout shorter than the interval is accepted: the predicate is
    /// still evaluated at least once before the wait fails.
    ///
    /// # Errors
    ///
    /// Returns [`WaitConfigError::ZeroInterval`] or
    /// [`WaitConfigError::ZeroTimeout`] when either duration is zero.
    pub fn new(interval: Duration, timeout: Duration) -> Result<Self, WaitConfigError> {
        if interval.is_zero() {
            return Err(WaitConfigError::ZeroInterval);
        }
        if timeout.is_zero() {
            return Err(WaitConfigError::ZeroTimeout);
        }
        Ok(Self {
            interval,
            timeout,
            message: None,
        })
    }

    /// Convenience constructor taking whole seconds.
    ///
    /// # Errors
    ///
    /// Same as [`WaitConfig::new`].
    pub fn from_secs(interval_secs: u64, timeout_secs: u64) -> Result<Self, WaitConfigError> {
        Self::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
    }

    /// Attaches the message reported when the wait times out.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Time slept between two predicate evaluations.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time allowed before the wait fails.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Message reported on timeout.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(DEFAULT_TIMEOUT_MESSAGE)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            message: None,
        }
    }
}

/// Errors raised when a [`WaitConfig`] is built from invalid durations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitConfigError {
    /// Raised when the polling interval is zero.
    #[error("wait interval must be greater than zero")]
    ZeroInterval,
    /// Raised when the overall timeout is zero.
    #[error("wait timeout must be greater than zero")]
    ZeroTimeout,
}
