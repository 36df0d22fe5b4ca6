//! Poll timing configuration loaded via `ortho-config`.
//!
//! [`WaitSettings`], [`crate::remote::RemoteConfig`] and
//! [`crate::nailgun::NailgunConfig`] read the same `taskwatch.toml`. Their
//! keys live side by side at the top level of that file; only the
//! environment prefixes differ.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::wait::WaitConfig;

/// Default interval between checks of a generic condition, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
/// Default deadline for a generic condition, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
/// Default interval between task status fetches, in seconds.
pub const DEFAULT_TASK_INTERVAL_SECS: u64 = 20;
/// Default deadline for a remote task; a full cluster deployment routinely
/// takes over an hour.
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 4200;

/// Poll timings derived from environment variables and configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "TASKWATCH",
    discovery(
        app_name = "taskwatch",
        env_var = "TASKWATCH_CONFIG_PATH",
        config_file_name = "taskwatch.toml",
        dotfile_name = ".taskwatch.toml",
        project_file_name = "taskwatch.toml"
    )
)]
pub struct WaitSettings {
    /// Seconds between checks of a generic condition such as an open port.
    #[ortho_config(default = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,
    /// Seconds before a generic condition wait gives up.
    #[ortho_config(default = DEFAULT_POLL_TIMEOUT_SECS)]
    pub poll_timeout_secs: u64,
    /// Seconds between task status fetches.
    #[ortho_config(default = DEFAULT_TASK_INTERVAL_SECS)]
    pub task_interval_secs: u64,
    /// Seconds before a task wait gives up.
    #[ortho_config(default = DEFAULT_TASK_TIMEOUT_SECS)]
    pub task_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl WaitSettings {
    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidField(format!(
                "{} must be at least one second: set {} or {} at the top level of taskwatch.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("taskwatch")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Rejects zero intervals and timeouts, naming where to fix them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first zero value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_positive(
            self.poll_interval_secs,
            &FieldMetadata::new(
                "poll interval",
                "TASKWATCH_POLL_INTERVAL_SECS",
                "poll_interval_secs",
            ),
        )?;
        Self::require_positive(
            self.poll_timeout_secs,
            &FieldMetadata::new(
                "poll timeout",
                "TASKWATCH_POLL_TIMEOUT_SECS",
                "poll_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.task_interval_secs,
            &FieldMetadata::new(
                "task poll interval",
                "TASKWATCH_TASK_INTERVAL_SECS",
                "task_interval_secs",
            ),
        )?;
        Self::require_positive(
            self.task_timeout_secs,
            &FieldMetadata::new(
                "task timeout",
                "TASKWATCH_TASK_TIMEOUT_SECS",
                "task_timeout_secs",
            ),
        )?;
        Ok(())
    }

    /// Builds the [`WaitConfig`] for generic condition waits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when validation fails.
    pub fn poll_config(&self) -> Result<WaitConfig, ConfigError> {
        self.validate()?;
        Self::wait_config(self.poll_interval_secs, self.poll_timeout_secs)
    }

    /// Builds the [`WaitConfig`] for remote task waits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when validation fails.
    pub fn task_config(&self) -> Result<WaitConfig, ConfigError> {
        self.validate()?;
        Self::wait_config(self.task_interval_secs, self.task_timeout_secs)
    }

    fn wait_config(interval_secs: u64, timeout_secs: u64) -> Result<WaitConfig, ConfigError> {
        WaitConfig::new(
            Duration::from_secs(interval_secs),
            Duration::from_secs(timeout_secs),
        )
        .map_err(|err| ConfigError::InvalidField(err.to_string()))
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            task_interval_secs: DEFAULT_TASK_INTERVAL_SECS,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a configuration field holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
