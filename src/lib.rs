//! Core library for the `taskwatch` tool.
//!
//! The crate provides a condition poller with a fixed interval and an overall
//! deadline, and a tracker that waits for long-running tasks on a remote
//! deployment manager until they reach a terminal state. Task status can be
//! read through the manager's REST API or through its command-line client on
//! the admin node.

pub mod config;
pub mod fuel_cli;
pub mod logging;
pub mod nailgun;
pub mod probe;
pub mod remote;
pub mod task;
pub mod test_support;
pub mod wait;

pub use config::{ConfigError, WaitSettings};
pub use fuel_cli::{CliTaskSource, FuelCliError};
pub use nailgun::{NailgunClient, NailgunConfig, NailgunError};
pub use remote::{
    CommandOutput, CommandRunner, ProcessCommandRunner, RemoteCommandOutput, RemoteConfig,
    RemoteError, RemoteExecutor,
};
pub use task::{
    AsyncTaskSource, TaskId, TaskSnapshot, TaskSource, TaskStatus, TaskTracker, TrackError,
    UnknownStatus,
};
pub use wait::{
    Check, WaitConfig, WaitError, wait, wait_async, wait_for, wait_for_async, wait_until,
};
