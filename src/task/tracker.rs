//! Polling a remote task until it reaches a terminal state.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tracing::{error, info};

use super::error::TrackError;
use super::types::{TaskId, TaskSnapshot};
use crate::wait::{self, Check, WaitConfig, WaitError};

/// Future returned by [`AsyncTaskSource::fetch`].
pub type TaskFuture<'a, E> = Pin<Box<dyn Future<Output = Result<TaskSnapshot, E>> + Send + 'a>>;

/// Blocking provider of task snapshots.
pub trait TaskSource {
    /// Error raised when the status cannot be fetched.
    type Error: std::error::Error + 'static;

    /// Fetches the latest snapshot of the task.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the task cannot be read.
    fn fetch(&self, id: &TaskId) -> Result<TaskSnapshot, Self::Error>;
}

/// Async provider of task snapshots.
pub trait AsyncTaskSource {
    /// Error raised when the status cannot be fetched.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches the latest snapshot of the task.
    fn fetch<'a>(&'a self, id: &'a TaskId) -> TaskFuture<'a, Self::Error>;
}

/// Waits for remote tasks using a fixed poll interval and deadline.
#[derive(Clone, Debug, Default)]
pub struct TaskTracker {
    config: WaitConfig,
}

impl TaskTracker {
    /// Creates a tracker polling with `config`.
    #[must_use]
    pub const fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    /// Returns the polling configuration.
    #[must_use]
    pub const fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Blocks until the task is `ready` or `error`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::TaskFailed`] when the task ends in the error
    /// state, [`TrackError::Timeout`] when it is still active at the deadline,
    /// and [`TrackError::Source`] as soon as a fetch fails.
    pub fn wait_for_task<S>(
        &self,
        source: &S,
        id: &TaskId,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: TaskSource + ?Sized,
    {
        self.wait_for_task_with(source, id, terminal)
    }

    /// Blocks until the task's progress reaches `percent` or the task ends.
    ///
    /// # Errors
    ///
    /// Same as [`TaskTracker::wait_for_task`].
    pub fn wait_for_progress<S>(
        &self,
        source: &S,
        id: &TaskId,
        percent: u8,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: TaskSource + ?Sized,
    {
        self.wait_for_task_with(source, id, |snapshot| progress_reached(snapshot, percent))
    }

    /// Blocks until `classify` accepts a snapshot of the task.
    ///
    /// A snapshot accepted in the error state is still reported as
    /// [`TrackError::TaskFailed`].
    ///
    /// # Errors
    ///
    /// Same as [`TaskTracker::wait_for_task`], plus [`TrackError::Skipped`]
    /// when `classify` returns [`Check::Skip`].
    pub fn wait_for_task_with<S, C>(
        &self,
        source: &S,
        id: &TaskId,
        mut classify: C,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: TaskSource + ?Sized,
        C: FnMut(&TaskSnapshot) -> Check,
    {
        info!(task_id = %id, "waiting for task");
        let started = Instant::now();
        let mut label = id.to_string();
        let outcome = wait::wait_for(
            &self.config,
            || source.fetch(id),
            |snapshot| {
                label = snapshot.label();
                classify(snapshot)
            },
        );
        settle(id, label, started, outcome)
    }

    /// Async counterpart of [`TaskTracker::wait_for_task`].
    ///
    /// # Errors
    ///
    /// Same as [`TaskTracker::wait_for_task`].
    pub async fn wait_for_task_async<S>(
        &self,
        source: &S,
        id: &TaskId,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: AsyncTaskSource + ?Sized,
    {
        self.wait_for_task_with_async(source, id, terminal).await
    }

    /// Async counterpart of [`TaskTracker::wait_for_progress`].
    ///
    /// # Errors
    ///
    /// Same as [`TaskTracker::wait_for_task`].
    pub async fn wait_for_progress_async<S>(
        &self,
        source: &S,
        id: &TaskId,
        percent: u8,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: AsyncTaskSource + ?Sized,
    {
        self.wait_for_task_with_async(source, id, |snapshot| progress_reached(snapshot, percent))
            .await
    }

    /// Async counterpart of [`TaskTracker::wait_for_task_with`].
    ///
    /// # Errors
    ///
    /// Same as [`TaskTracker::wait_for_task_with`].
    pub async fn wait_for_task_with_async<S, C>(
        &self,
        source: &S,
        id: &TaskId,
        mut classify: C,
    ) -> Result<TaskSnapshot, TrackError<S::Error>>
    where
        S: AsyncTaskSource + ?Sized,
        C: FnMut(&TaskSnapshot) -> Check,
    {
        info!(task_id = %id, "waiting for task");
        let started = Instant::now();
        let mut label = id.to_string();
        let outcome = wait::wait_for_async(
            &self.config,
            || source.fetch(id),
            |snapshot| {
                label = snapshot.label();
                classify(snapshot)
            },
        )
        .await;
        settle(id, label, started, outcome)
    }
}

fn terminal(snapshot: &TaskSnapshot) -> Check {
    Check::from(snapshot.status.is_terminal())
}

fn progress_reached(snapshot: &TaskSnapshot, percent: u8) -> Check {
    let reached = snapshot.progress.is_some_and(|progress| progress >= percent);
    Check::from(reached || snapshot.status.is_terminal())
}

fn settle<E>(
    id: &TaskId,
    label: String,
    started: Instant,
    outcome: Result<TaskSnapshot, WaitError<E>>,
) -> Result<TaskSnapshot, TrackError<E>>
where
    E: std::error::Error + 'static,
{
    let elapsed_ms = wait::millis(started.elapsed());
    match outcome {
        Ok(snapshot) if snapshot.status.is_failure() => {
            error!(
                task_id = %id,
                status = %snapshot.raw_status,
                elapsed_ms,
                detail = snapshot.message.as_deref().unwrap_or_default(),
                "task failed"
            );
            Err(TrackError::TaskFailed {
                task: label,
                status: snapshot.raw_status,
                message: snapshot.message,
            })
        }
        Ok(snapshot) => {
            info!(task_id = %id, status = %snapshot.status, elapsed_ms, "task finished");
            Ok(snapshot)
        }
        Err(WaitError::Timeout {
            elapsed, attempts, ..
        }) => {
            error!(task_id = %id, elapsed_ms, attempts, "task wait timed out");
            Err(TrackError::Timeout {
                task: label,
                elapsed,
                attempts,
            })
        }
        Err(WaitError::Skipped { reason }) => {
            info!(task_id = %id, %reason, "task wait skipped");
            Err(TrackError::Skipped {
                task: label,
                reason,
            })
        }
        Err(WaitError::Predicate(err)) => {
            error!(task_id = %id, error = %err, "task status fetch failed");
            Err(TrackError::Source(err))
        }
    }
}
