//! SSH settings for reaching the admin node and cluster nodes.
//!
//! Loaded via `ortho-config`, which merges defaults, configuration files and
//! `TASKWATCH_SSH_*` environment variables. File keys such as `user` or
//! `port` sit at the top level of `taskwatch.toml`, next to the poll timings.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use super::RemoteError;

/// Default SSH port on lab nodes.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// SSH client settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "TASKWATCH_SSH",
    discovery(
        app_name = "taskwatch",
        env_var = "TASKWATCH_CONFIG_PATH",
        config_file_name = "taskwatch.toml",
        dotfile_name = ".taskwatch.toml",
        project_file_name = "taskwatch.toml"
    )
)]
pub struct RemoteConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub bin: String,
    /// Remote user to connect as; lab nodes only accept `root`.
    #[ortho_config(default = "root".to_owned())]
    pub user: String,
    /// TCP port of the SSH daemon.
    #[ortho_config(default = DEFAULT_SSH_PORT)]
    pub port: u16,
    /// Whether to force batch mode so SSH never prompts for a password.
    #[ortho_config(default = true)]
    pub batch_mode: bool,
    /// Whether to enforce host key checking. Lab nodes are reprovisioned
    /// constantly, so this is off by default.
    #[ortho_config(default = false)]
    pub strict_host_key_checking: bool,
    /// Known hosts file override; defaults to `/dev/null`.
    #[ortho_config(default = "/dev/null".to_owned())]
    pub known_hosts_file: String,
    /// Seconds SSH waits for the TCP connection before giving up.
    #[ortho_config(default = 10)]
    pub connect_timeout_secs: u64,
    /// Private key used for authentication. Supports `~/` expansion; when
    /// absent SSH falls back to its default key locations.
    pub identity_file: Option<String>,
}

/// Errors raised when loading the SSH configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RemoteConfigLoadError {
    /// Parsing or merging configuration layers failed.
    #[error("ssh configuration parsing failed: {0}")]
    Parse(String),
}

impl RemoteConfig {
    /// Ensures required values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidConfig`] naming the first empty field.
    pub fn validate(&self) -> Result<(), RemoteError> {
        Self::require_value(&self.bin, "bin")?;
        Self::require_value(&self.user, "user")?;
        Self::require_optional_value(self.identity_file.as_deref(), "identity_file")?;
        if self.port == 0 {
            return Err(RemoteError::InvalidConfig {
                field: String::from("port"),
            });
        }
        Ok(())
    }

    /// Loads configuration from defaults, configuration files and environment
    /// variables, ignoring the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, RemoteConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("taskwatch")])
            .map_err(|err| RemoteConfigLoadError::Parse(err.to_string()))
    }

    fn require_optional_value(value: Option<&str>, field: &str) -> Result<(), RemoteError> {
        match value {
            None => Ok(()),
            Some(text) if !text.trim().is_empty() => Ok(()),
            Some(_) => Err(RemoteError::InvalidConfig {
                field: field.to_owned(),
            }),
        }
    }

    fn require_value(value: &str, field: &str) -> Result<(), RemoteError> {
        Self::require_optional_value(Some(value), field)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            bin: String::from("ssh"),
            user: String::from("root"),
            port: DEFAULT_SSH_PORT,
            batch_mode: true,
            strict_host_key_checking: false,
            known_hosts_file: String::from("/dev/null"),
            connect_timeout_secs: 10,
            identity_file: None,
        }
    }
}
