//! Remote task tracking.
//!
//! A task is a long-running operation owned by a remote system, such as a
//! cluster deployment or a network verification run. This module maps the
//! status vocabularies of the different collaborators onto [`TaskStatus`] and
//! waits for a task to finish through [`TaskTracker`].

mod error;
mod status;
mod tracker;
mod types;

pub use error::TrackError;
pub use status::{TaskStatus, UnknownStatus};
pub use tracker::{AsyncTaskSource, TaskFuture, TaskSource, TaskTracker};
pub use types::{TaskId, TaskSnapshot};

pub(crate) use types::RawTask;

#[cfg(test)]
mod tests;
