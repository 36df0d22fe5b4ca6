//! Command-line interface definitions for the `taskwatch` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `taskwatch` binary.
#[derive(Debug, Parser)]
#[command(
    name = "taskwatch",
    about = "Wait for deployment tasks and lab conditions with a fixed poll interval and deadline",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Wait for a task through the deployment manager's REST API.
    #[command(name = "task", about = "Wait for a task through the REST API")]
    Task(TaskCommand),
    /// Wait for a task by running the `fuel` CLI on the admin node over SSH.
    #[command(name = "cli-task", about = "Wait for a task through the fuel CLI over SSH")]
    CliTask(CliTaskCommand),
    /// Wait until a TCP port accepts connections.
    #[command(name = "port", about = "Wait until a TCP port accepts connections")]
    Port(PortCommand),
}

/// Poll timing overrides shared by every subcommand.
#[derive(Clone, Copy, Debug, Default, Args)]
pub(crate) struct WaitArgs {
    /// Give up after this many seconds (overrides the configured timeout).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) timeout: Option<u64>,
    /// Seconds between checks (overrides the configured interval).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) interval: Option<u64>,
}

/// Arguments for `taskwatch task`.
#[derive(Debug, Args)]
pub(crate) struct TaskCommand {
    /// Task identifier as reported by the deployment manager.
    #[arg(value_name = "TASK_ID")]
    pub(crate) task_id: String,
    /// Return once the task reports at least this completion percentage.
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) progress: Option<u8>,
    /// Poll timing overrides.
    #[command(flatten)]
    pub(crate) wait: WaitArgs,
}

/// Arguments for `taskwatch cli-task`.
#[derive(Debug, Args)]
pub(crate) struct CliTaskCommand {
    /// Address of the admin node running the `fuel` CLI.
    #[arg(long, value_name = "HOST", env = "TASKWATCH_ADMIN_HOST")]
    pub(crate) admin_host: String,
    /// Path to the `fuel` binary on the admin node.
    #[arg(long, value_name = "PATH", default_value = "fuel")]
    pub(crate) fuel_bin: String,
    /// Task identifier as reported by the deployment manager.
    #[arg(value_name = "TASK_ID")]
    pub(crate) task_id: String,
    /// Return once the task reports at least this completion percentage.
    #[arg(long, value_name = "PERCENT", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) progress: Option<u8>,
    /// Poll timing overrides.
    #[command(flatten)]
    pub(crate) wait: WaitArgs,
}

/// Arguments for `taskwatch port`.
#[derive(Debug, Args)]
pub(crate) struct PortCommand {
    /// Host name or address to probe.
    #[arg(value_name = "HOST")]
    pub(crate) host: String,
    /// TCP port to probe.
    #[arg(value_name = "PORT")]
    pub(crate) port: u16,
    /// Seconds each connection attempt may take.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub(crate) connect_timeout: u64,
    /// Poll timing overrides.
    #[command(flatten)]
    pub(crate) wait: WaitArgs,
}
