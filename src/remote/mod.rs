//! Running shell commands on lab hosts over SSH.
//!
//! The executor wraps the system `ssh` client and preserves the remote exit
//! code, so callers can tell a command that failed from one that could not be
//! started.

use std::borrow::Cow;
use std::ffi::OsString;

use thiserror::Error;
use tracing::debug;

mod config;
mod types;

pub use config::{DEFAULT_SSH_PORT, RemoteConfig, RemoteConfigLoadError};
pub use types::{CommandOutput, CommandRunner, ProcessCommandRunner, RemoteCommandOutput};

/// Errors surfaced while executing remote commands.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RemoteError {
    /// Raised when configuration is missing a required value. The message
    /// says where the value can be provided.
    #[error(
        "missing {field}: set TASKWATCH_SSH_{env_suffix} or add {field} \
         at the top level of taskwatch.toml",
        env_suffix = field.to_uppercase()
    )]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when the target host is empty or looks like an SSH option.
    #[error("invalid remote host '{host}'")]
    InvalidHost {
        /// Host as supplied by the caller.
        host: String,
    },
    /// Raised when the SSH client cannot be spawned.
    #[error("failed to spawn {program}: {message}")]
    Spawn {
        /// Command that failed to start.
        program: String,
        /// Operating system error string.
        message: String,
    },
    /// Raised when a checked remote command exits with a non-zero status.
    #[error("`{command}` on {host} exited with status {status_text}: {stderr}")]
    CommandFailure {
        /// Host the command ran on.
        host: String,
        /// Command line as sent to the host.
        command: String,
        /// Exit status, if any.
        status: Option<i32>,
        /// Human readable representation of the exit status.
        status_text: String,
        /// Stderr captured from the command.
        stderr: String,
    },
}

/// Executes commands on remote hosts via the configured SSH client.
#[derive(Clone, Debug)]
pub struct RemoteExecutor<R: CommandRunner> {
    config: RemoteConfig,
    runner: R,
}

impl RemoteExecutor<ProcessCommandRunner> {
    /// Convenience constructor that wires the real process runner.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] when validation fails.
    pub fn with_process_runner(config: RemoteConfig) -> Result<Self, RemoteError> {
        Self::new(config, ProcessCommandRunner)
    }
}

impl<R: CommandRunner> RemoteExecutor<R> {
    /// Creates an executor using the provided runner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] when configuration validation
    /// fails.
    pub fn new(config: RemoteConfig, runner: R) -> Result<Self, RemoteError> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Returns the SSH configuration.
    #[must_use]
    pub const fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Runs `command` on `host` and returns its output whatever the exit
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidHost`] for an unusable host and
    /// propagates failures to spawn the SSH client.
    ///
    /// # Security
    ///
    /// `command` is passed verbatim to the remote shell; quote untrusted
    /// arguments with [`render_command`] first.
    pub fn execute(&self, host: &str, command: &str) -> Result<RemoteCommandOutput, RemoteError> {
        let target = validate_host(host)?;
        let args = self.build_ssh_args(target, command);
        debug!(host = target, command, "running remote command");
        let output = self.runner.run(&self.config.bin, &args)?;
        debug!(host = target, exit_code = ?output.code, "remote command finished");
        Ok(output.into())
    }

    /// Runs `command` on `host` and requires a zero exit status.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteExecutor::execute`], plus
    /// [`RemoteError::CommandFailure`] for any other exit status.
    pub fn execute_checked(
        &self,
        host: &str,
        command: &str,
    ) -> Result<RemoteCommandOutput, RemoteError> {
        let output = self.execute(host, command)?;
        if output.is_success() {
            return Ok(output);
        }
        Err(RemoteError::CommandFailure {
            host: host.trim().to_owned(),
            command: command.to_owned(),
            status: output.exit_code,
            status_text: output
                .exit_code
                .map_or_else(|| String::from("unknown"), |code| code.to_string()),
            stderr: output.stderr.trim().to_owned(),
        })
    }

    fn build_ssh_args(&self, host: &str, command: &str) -> Vec<OsString> {
        let mut args = self.common_ssh_options();
        args.push(OsString::from(format!("{}@{host}", self.config.user)));
        args.push(OsString::from(command));
        args
    }

    fn common_ssh_options(&self) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-p"),
            OsString::from(self.config.port.to_string()),
            OsString::from("-o"),
            OsString::from(format!(
                "ConnectTimeout={}",
                self.config.connect_timeout_secs
            )),
        ];

        if let Some(ref identity_file) = self.config.identity_file {
            args.push(OsString::from("-i"));
            args.push(OsString::from(expand_tilde(identity_file)));
        }

        if self.config.batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        if !self.config.strict_host_key_checking {
            args.push(OsString::from("-o"));
            args.push(OsString::from("StrictHostKeyChecking=no"));
        }

        if !self.config.known_hosts_file.trim().is_empty() {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!(
                "UserKnownHostsFile={}",
                self.config.known_hosts_file
            )));
        }

        args
    }
}

/// Joins `program` and `args` into a single shell command line, quoting each
/// part for a POSIX shell.
#[must_use]
pub fn render_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .map(|part| shell_escape::unix::escape(Cow::Borrowed(part)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expands a leading `~/` to the user's home directory. Without `HOME` the
/// path is returned unchanged.
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}

fn validate_host(host: &str) -> Result<&str, RemoteError> {
    let trimmed = host.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') || trimmed.contains(char::is_whitespace) {
        return Err(RemoteError::InvalidHost {
            host: host.to_owned(),
        });
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests;
