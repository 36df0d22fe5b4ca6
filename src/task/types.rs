//! Task identifiers and snapshots.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use super::status::{TaskStatus, UnknownStatus};

/// Identifier of a task on the remote system.
///
/// The deployment manager hands out integers while other collaborators use
/// UUIDs, so the identifier is kept as text.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an identifier, trimming surrounding whitespace.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_owned())
    }

    /// Returns the identifier text.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time view of a remote task.
///
/// The authoritative copy lives on the remote system; a snapshot is re-fetched
/// on every poll and never mutated by this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSnapshot {
    /// Task identifier.
    pub id: TaskId,
    /// Task name (for example `deploy` or `verify_networks`), when reported.
    pub name: Option<String>,
    /// Canonical status.
    pub status: TaskStatus,
    /// Status string exactly as the collaborator reported it.
    pub raw_status: String,
    /// Completion percentage, clamped to 100.
    pub progress: Option<u8>,
    /// Error detail or informational message attached to the task.
    pub message: Option<String>,
    /// Result payload, if any.
    pub result: Option<Value>,
}

impl TaskSnapshot {
    /// Creates a snapshot with only an id and a canonical status.
    #[must_use]
    pub fn new(id: impl Into<TaskId>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
            raw_status: status.as_str().to_owned(),
            progress: None,
            message: None,
            result: None,
        }
    }

    /// Sets the task name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the completion percentage, clamped to 100.
    #[must_use]
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    /// Sets the error or informational message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Human-readable label used in logs and errors, such as `deploy (id 7)`.
    #[must_use]
    pub fn label(&self) -> String {
        task_label(&self.id, self.name.as_deref())
    }
}

pub(crate) fn task_label(id: &TaskId, name: Option<&str>) -> String {
    name.map_or_else(|| id.to_string(), |task_name| format!("{task_name} (id {id})"))
}

/// Task document as served by the deployment manager, over both its REST API
/// and its `fuel task --json` CLI.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub(crate) struct RawTask {
    id: RawTaskId,
    #[serde(default)]
    name: Option<String>,
    status: String,
    #[serde(default)]
    progress: Option<u64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum RawTaskId {
    Number(u64),
    Text(String),
}

impl TryFrom<RawTask> for TaskSnapshot {
    type Error = UnknownStatus;

    fn try_from(raw: RawTask) -> Result<Self, Self::Error> {
        let status = TaskStatus::from_raw(&raw.status)?;
        let id = match raw.id {
            RawTaskId::Number(number) => TaskId::from(number),
            RawTaskId::Text(text) => TaskId::new(text),
        };
        let progress = raw
            .progress
            .map(|value| u8::try_from(value.min(100)).unwrap_or(100));
        Ok(Self {
            id,
            name: raw.name,
            status,
            raw_status: raw.status,
            progress,
            message: raw.message.filter(|text| !text.trim().is_empty()),
            result: raw.result.filter(|value| !value.is_null()),
        })
    }
}
