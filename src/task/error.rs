//! Errors raised while tracking a remote task.

use std::time::Duration;

use thiserror::Error;

/// Reasons a task wait ends without a successful task.
#[derive(Debug, Error)]
pub enum TrackError<E>
where
    E: std::error::Error + 'static,
{
    /// Raised when the task is still pending or running at the deadline.
    #[error("task {task} did not finish within {elapsed:?} ({attempts} checks)")]
    Timeout {
        /// Task label, `name (id N)` when the name is known.
        task: String,
        /// Time elapsed since the first status fetch.
        elapsed: Duration,
        /// Number of status fetches performed.
        attempts: u32,
    },
    /// Raised when the task reached a failed terminal state.
    #[error(
        "task {task} finished with status '{status}': {}",
        message.as_deref().unwrap_or("no error detail reported")
    )]
    TaskFailed {
        /// Task label.
        task: String,
        /// Status string as reported by the collaborator.
        status: String,
        /// Error detail reported with the task, if any.
        message: Option<String>,
    },
    /// Raised when a custom classifier abandoned the wait.
    #[error("wait for task {task} skipped: {reason}")]
    Skipped {
        /// Task label.
        task: String,
        /// Reason supplied by the classifier.
        reason: String,
    },
    /// Raised when fetching the task status failed; never retried.
    #[error("failed to fetch task status: {0}")]
    Source(#[source] E),
}

impl<E> TrackError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns `true` for [`TrackError::Timeout`].
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for [`TrackError::TaskFailed`].
    #[must_use]
    pub const fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed { .. })
    }
}
