//! Task source backed by the deployment manager's REST API.
//!
//! Tasks live under `GET {url}/api/v1/tasks/{id}/` and are served as the
//! same JSON document the CLI prints.

use std::time::Duration;

use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::debug;

mod config;

pub use config::{
    DEFAULT_NAILGUN_URL, DEFAULT_REQUEST_TIMEOUT_SECS, NailgunConfig, NailgunConfigLoadError,
};

use crate::task::{AsyncTaskSource, RawTask, TaskFuture, TaskId, TaskSnapshot, UnknownStatus};

/// Errors raised while talking to the REST API.
#[derive(Debug, Error)]
pub enum NailgunError {
    /// Raised when a configuration value is blank or zero.
    #[error(
        "missing or invalid {field}: set TASKWATCH_NAILGUN_{env_suffix} or add {field} \
         at the top level of taskwatch.toml",
        env_suffix = field.to_uppercase()
    )]
    InvalidConfig {
        /// Configuration field that failed validation.
        field: String,
    },
    /// Raised when the base URL cannot be parsed or cannot carry a path.
    #[error("invalid API url '{url}': {message}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when the request cannot be sent or the body cannot be read.
    #[error("request to {url} failed: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// Transport error message.
        message: String,
    },
    /// Raised for non-success responses other than 404.
    #[error("{url} returned {code}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        code: u16,
        /// Response body, lossily decoded.
        body: String,
    },
    /// Raised when the API answers 404 for the task.
    #[error("task {id} not found")]
    TaskNotFound {
        /// Requested task identifier.
        id: TaskId,
    },
    /// Raised when the response body is not a task document.
    #[error("failed to parse task {id}: {message}")]
    Parse {
        /// Requested task identifier.
        id: TaskId,
        /// Parser error message.
        message: String,
    },
    /// Raised when the task reports a status outside the known vocabulary.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
}

/// Minimal REST client for reading tasks.
#[derive(Clone, Debug)]
pub struct NailgunClient {
    base: Url,
    http: reqwest::Client,
    auth_token: Option<String>,
}

impl NailgunClient {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NailgunError::InvalidConfig`] or [`NailgunError::InvalidUrl`]
    /// for unusable settings, and [`NailgunError::Http`] when the HTTP client
    /// cannot be initialised.
    pub fn new(config: &NailgunConfig) -> Result<Self, NailgunError> {
        config.validate()?;
        let raw_url = config.url.trim();
        let base = Url::parse(raw_url).map_err(|err| NailgunError::InvalidUrl {
            url: raw_url.to_owned(),
            message: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(NailgunError::InvalidUrl {
                url: raw_url.to_owned(),
                message: String::from("url cannot carry a path"),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| NailgunError::Http {
                url: raw_url.to_owned(),
                message: err.to_string(),
            })?;
        Ok(Self {
            base,
            http,
            auth_token: config.auth_token.clone(),
        })
    }

    /// URL of the task document for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NailgunError::InvalidUrl`] when the base URL cannot carry a
    /// path.
    pub fn task_url(&self, id: &TaskId) -> Result<Url, NailgunError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| NailgunError::InvalidUrl {
                url: self.base.to_string(),
                message: String::from("url cannot carry a path"),
            })?
            .pop_if_empty()
            .extend(["api", "v1", "tasks", id.as_str(), ""]);
        Ok(url)
    }

    /// Fetches the current snapshot of task `id`.
    ///
    /// # Errors
    ///
    /// Returns [`NailgunError::TaskNotFound`] on 404, [`NailgunError::Status`]
    /// for other failures, [`NailgunError::Http`] for transport errors and
    /// [`NailgunError::Parse`] or [`NailgunError::UnknownStatus`] for bodies
    /// that do not describe a task.
    pub async fn task(&self, id: &TaskId) -> Result<TaskSnapshot, NailgunError> {
        let url = self.task_url(id)?;
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.auth_token {
            request = request.header("X-Auth-Token", token);
        }

        let response = request.send().await.map_err(|err| NailgunError::Http {
            url: url.to_string(),
            message: err.to_string(),
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|err| NailgunError::Http {
            url: url.to_string(),
            message: err.to_string(),
        })?;

        if status == StatusCode::NOT_FOUND {
            return Err(NailgunError::TaskNotFound { id: id.clone() });
        }
        if !status.is_success() {
            return Err(NailgunError::Status {
                url: url.to_string(),
                code: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_owned(),
            });
        }

        let raw: RawTask = serde_json::from_slice(&body).map_err(|err| NailgunError::Parse {
            id: id.clone(),
            message: err.to_string(),
        })?;
        let snapshot = TaskSnapshot::try_from(raw)?;
        debug!(
            task_id = %id,
            status = %snapshot.raw_status,
            progress = ?snapshot.progress,
            "fetched task via api"
        );
        Ok(snapshot)
    }
}

impl AsyncTaskSource for NailgunClient {
    type Error = NailgunError;

    fn fetch<'a>(&'a self, id: &'a TaskId) -> TaskFuture<'a, Self::Error> {
        Box::pin(self.task(id))
    }
}
