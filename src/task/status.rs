//! Canonical task status and adaptation of collaborator vocabularies.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Lifecycle state of a remote task, independent of the collaborator that
/// reported it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TaskStatus {
    /// Accepted but not started.
    Pending,
    /// Started and not finished.
    Running,
    /// Finished successfully.
    Ready,
    /// Finished unsuccessfully.
    Error,
}

impl TaskStatus {
    /// Maps a collaborator's raw status string onto the canonical set.
    ///
    /// Matching ignores case and surrounding whitespace. Deployment manager
    /// tasks report `ready`/`error`, the benchmarking service reports
    /// `finished`, and export jobs report `success`/`failed`; all of them land
    /// on [`TaskStatus::Ready`] or [`TaskStatus::Error`].
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStatus`] for any string outside the known
    /// vocabularies, so an unexpected value never reads as "still running".
    pub fn from_raw(raw: &str) -> Result<Self, UnknownStatus> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "new" => Ok(Self::Pending),
            "running" | "in_progress" | "processing" => Ok(Self::Running),
            "ready" | "success" | "succeeded" | "finished" | "completed" | "done" => {
                Ok(Self::Ready)
            }
            "error" | "failed" | "failure" | "canceled" | "cancelled" | "aborted" => {
                Ok(Self::Error)
            }
            _ => Err(UnknownStatus {
                raw: raw.to_owned(),
            }),
        }
    }

    /// `true` once no further transition can happen.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// `true` for the successful terminal state.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// `true` for the failed terminal state.
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_raw(value)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a collaborator reports a status outside the known
/// vocabularies.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unrecognised task status '{raw}'")]
pub struct UnknownStatus {
    /// Status string exactly as reported.
    pub raw: String,
}
