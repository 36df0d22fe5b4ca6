//! Task source backed by the `fuel` command-line client on the admin node.
//!
//! Each fetch runs `fuel task --task-id <id> --json` over SSH and parses the
//! JSON array it prints. The first element is the task.

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::remote::{
    CommandRunner, ProcessCommandRunner, RemoteError, RemoteExecutor, render_command,
};
use crate::task::{RawTask, TaskId, TaskSnapshot, TaskSource, UnknownStatus};

/// Default name of the CLI binary on the admin node.
pub const DEFAULT_FUEL_BIN: &str = "fuel";

/// Errors raised while reading a task through the CLI.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FuelCliError {
    /// Raised when the admin host or binary name is blank.
    #[error("missing {field}")]
    InvalidConfig {
        /// Name of the blank field.
        field: String,
    },
    /// Raised when the SSH command fails or exits non-zero.
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// Raised when the CLI output is not a task document.
    #[error("failed to parse task output: {message}")]
    Parse {
        /// Parser error message.
        message: String,
    },
    /// Raised when the CLI returns an empty task list.
    #[error("task {id} not found")]
    TaskNotFound {
        /// Requested task identifier.
        id: TaskId,
    },
    /// Raised when the task reports a status outside the known vocabulary.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FuelTaskOutput {
    List(Vec<RawTask>),
    Single(Box<RawTask>),
}

/// Reads task status by running the `fuel` CLI on the admin node.
#[derive(Clone, Debug)]
pub struct CliTaskSource<R: CommandRunner> {
    executor: RemoteExecutor<R>,
    admin_host: String,
    fuel_bin: String,
}

impl CliTaskSource<ProcessCommandRunner> {
    /// Creates a source using the system SSH client.
    ///
    /// # Errors
    ///
    /// Returns [`FuelCliError::InvalidConfig`] when `admin_host` is blank.
    pub fn with_process_runner(
        executor: RemoteExecutor<ProcessCommandRunner>,
        admin_host: impl Into<String>,
    ) -> Result<Self, FuelCliError> {
        Self::new(executor, admin_host)
    }
}

impl<R: CommandRunner> CliTaskSource<R> {
    /// Creates a source that reaches `admin_host` through `executor`.
    ///
    /// # Errors
    ///
    /// Returns [`FuelCliError::InvalidConfig`] when `admin_host` is blank.
    pub fn new(
        executor: RemoteExecutor<R>,
        admin_host: impl Into<String>,
    ) -> Result<Self, FuelCliError> {
        let host = admin_host.into().trim().to_owned();
        if host.is_empty() {
            return Err(FuelCliError::InvalidConfig {
                field: String::from("admin_host"),
            });
        }
        Ok(Self {
            executor,
            admin_host: host,
            fuel_bin: DEFAULT_FUEL_BIN.to_owned(),
        })
    }

    /// Overrides the CLI binary, for example with an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`FuelCliError::InvalidConfig`] when `fuel_bin` is blank.
    pub fn with_fuel_bin(mut self, fuel_bin: impl Into<String>) -> Result<Self, FuelCliError> {
        let bin = fuel_bin.into().trim().to_owned();
        if bin.is_empty() {
            return Err(FuelCliError::InvalidConfig {
                field: String::from("fuel_bin"),
            });
        }
        self.fuel_bin = bin;
        Ok(self)
    }

    /// Host the CLI runs on.
    #[must_use]
    pub fn admin_host(&self) -> &str {
        &self.admin_host
    }

    /// Command line sent to the admin node for `id`.
    #[must_use]
    pub fn task_command(&self, id: &TaskId) -> String {
        render_command(&self.fuel_bin, &["task", "--task-id", id.as_str(), "--json"])
    }
}

impl<R: CommandRunner> TaskSource for CliTaskSource<R> {
    type Error = FuelCliError;

    fn fetch(&self, id: &TaskId) -> Result<TaskSnapshot, Self::Error> {
        let command = self.task_command(id);
        let output = self.executor.execute_checked(&self.admin_host, &command)?;
        let snapshot = parse_task_output(id, &output.stdout)?;
        debug!(
            task_id = %id,
            status = %snapshot.raw_status,
            progress = ?snapshot.progress,
            "fetched task via cli"
        );
        Ok(snapshot)
    }
}

fn parse_task_output(id: &TaskId, stdout: &str) -> Result<TaskSnapshot, FuelCliError> {
    let parsed: FuelTaskOutput =
        serde_json::from_str(stdout.trim()).map_err(|err| FuelCliError::Parse {
            message: err.to_string(),
        })?;
    let raw = match parsed {
        FuelTaskOutput::List(tasks) => tasks
            .into_iter()
            .next()
            .ok_or_else(|| FuelCliError::TaskNotFound { id: id.clone() })?,
        FuelTaskOutput::Single(task) => *task,
    };
    Ok(TaskSnapshot::try_from(raw)?)
}
