//! Connection settings for the deployment manager's REST API.
//!
//! Values come from `TASKWATCH_NAILGUN_*` environment variables or from the
//! top level of `taskwatch.toml`, where `url`, `auth_token` and
//! `request_timeout_secs` share the file with the SSH and poll settings.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use super::NailgunError;

/// API endpoint of a freshly installed admin node.
pub const DEFAULT_NAILGUN_URL: &str = "http://10.109.0.2:8000";

/// Default per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// REST API settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "TASKWATCH_NAILGUN",
    discovery(
        app_name = "taskwatch",
        env_var = "TASKWATCH_CONFIG_PATH",
        config_file_name = "taskwatch.toml",
        dotfile_name = ".taskwatch.toml",
        project_file_name = "taskwatch.toml"
    )
)]
pub struct NailgunConfig {
    /// Base URL of the API, without the `/api/v1` suffix.
    #[ortho_config(default = DEFAULT_NAILGUN_URL.to_owned())]
    pub url: String,
    /// Keystone token sent as `X-Auth-Token`; omitted when unset.
    pub auth_token: Option<String>,
    /// Seconds before a single request is abandoned.
    #[ortho_config(default = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

/// Errors raised when loading the API configuration from layered sources.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum NailgunConfigLoadError {
    /// Parsing or merging configuration layers failed.
    #[error("nailgun configuration parsing failed: {0}")]
    Parse(String),
}

impl NailgunConfig {
    /// Creates a config for `url` with no token and the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Checks that the URL is set, the token is not blank and the timeout is
    /// positive.
    ///
    /// # Errors
    ///
    /// Returns [`NailgunError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), NailgunError> {
        if self.url.trim().is_empty() {
            return Err(NailgunError::InvalidConfig {
                field: String::from("url"),
            });
        }
        if self
            .auth_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            return Err(NailgunError::InvalidConfig {
                field: String::from("auth_token"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(NailgunError::InvalidConfig {
                field: String::from("request_timeout_secs"),
            });
        }
        Ok(())
    }

    /// Loads configuration from defaults, configuration files and environment
    /// variables, ignoring the process arguments.
    ///
    /// # Errors
    ///
    /// Returns [`NailgunConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, NailgunConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("taskwatch")])
            .map_err(|err| NailgunConfigLoadError::Parse(err.to_string()))
    }
}

impl Default for NailgunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NAILGUN_URL)
    }
}
