//! Error type returned by the condition poller.

use std::time::Duration;

use thiserror::Error;

/// Reasons a wait ends without the condition being met.
#[derive(Debug, Error)]
pub enum WaitError<E>
where
    E: std::error::Error + 'static,
{
    /// Raised when the deadline passes while the predicate still reports
    /// pending.
    #[error("timed out after {elapsed:?} ({attempts} checks): {message}")]
    Timeout {
        /// Message attached to the wait configuration.
        message: String,
        /// Time elapsed since the first predicate evaluation.
        elapsed: Duration,
        /// Number of predicate evaluations performed.
        attempts: u32,
    },
    /// Raised when the predicate asks for the wait to be abandoned.
    #[error("wait skipped: {reason}")]
    Skipped {
        /// Reason supplied by the predicate.
        reason: String,
    },
    /// Raised when the predicate itself fails; the wait stops immediately.
    #[error("condition check failed: {0}")]
    Predicate(#[source] E),
}

impl<E> WaitError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns `true` for [`WaitError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
