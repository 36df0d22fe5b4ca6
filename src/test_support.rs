//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::remote::{CommandOutput, CommandRunner, RemoteError};
use crate::task::{
    AsyncTaskSource, TaskFuture, TaskId, TaskSnapshot, TaskSource, TaskStatus, UnknownStatus,
};

/// Scripted command runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive deterministic SSH outcomes without spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns the arguments as lossy UTF-8 strings for assertions.
    #[must_use]
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    /// Returns the final argument, which carries the remote command line.
    #[must_use]
    pub fn remote_command(&self) -> Option<String> {
        self.args
            .last()
            .map(|arg| arg.to_string_lossy().into_owned())
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit with the given stdout.
    pub fn push_stdout(&self, stdout: impl Into<String>) {
        self.push_output(Some(0), stdout, "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32, stderr: impl Into<String>) {
        self.push_output(Some(code), "", stderr);
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RemoteError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| RemoteError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Failure returned by [`ScriptedTaskSource`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted task source failure: {0}")]
pub struct ScriptedSourceError(pub String);

type ScriptedFetch = Result<TaskSnapshot, ScriptedSourceError>;

/// Task source replaying a queue of snapshots.
///
/// Each fetch consumes one entry; the last entry repeats forever so a script
/// ending in `running` models a task that never finishes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTaskSource {
    responses: Arc<Mutex<VecDeque<ScriptedFetch>>>,
    fetches: Arc<AtomicU32>,
}

impl ScriptedTaskSource {
    /// Creates a source with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a script from `status[:progress]` entries such as
    /// `["pending", "running:40", "ready"]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::UnknownStatus`] when an entry carries an
    /// unknown status and [`ScriptError::InvalidProgress`] when its progress
    /// is not a whole number between 0 and 100.
    pub fn from_statuses(id: &TaskId, entries: &[&str]) -> Result<Self, ScriptError> {
        let source = Self::new();
        for entry in entries {
            source.push_snapshot(scripted_snapshot(id, entry)?);
        }
        Ok(source)
    }

    /// Appends a snapshot to the script.
    pub fn push_snapshot(&self, snapshot: TaskSnapshot) {
        self.lock().push_back(Ok(snapshot));
    }

    /// Appends a fetch failure to the script.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock()
            .push_back(Err(ScriptedSourceError(message.into())));
    }

    /// Number of fetches performed so far.
    #[must_use]
    pub fn fetches(&self) -> u32 {
        self.fetches.load(Ordering::SeqCst)
    }

    fn next(&self, id: &TaskId) -> ScriptedFetch {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.lock();
        if responses.len() > 1 {
            return responses
                .pop_front()
                .unwrap_or_else(|| Err(ScriptedSourceError(String::from("script exhausted"))));
        }
        responses.front().cloned().unwrap_or_else(|| {
            Err(ScriptedSourceError(format!(
                "no scripted snapshot for task {id}"
            )))
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ScriptedFetch>> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskSource for ScriptedTaskSource {
    type Error = ScriptedSourceError;

    fn fetch(&self, id: &TaskId) -> Result<TaskSnapshot, Self::Error> {
        self.next(id)
    }
}

impl AsyncTaskSource for ScriptedTaskSource {
    type Error = ScriptedSourceError;

    fn fetch<'a>(&'a self, id: &'a TaskId) -> TaskFuture<'a, Self::Error> {
        Box::pin(async move { self.next(id) })
    }
}

/// Errors raised while parsing a `status[:progress]` script.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptError {
    /// Raised when an entry names a status outside the known vocabulary.
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    /// Raised when the progress part of an entry is not 0 to 100.
    #[error("invalid progress in scripted entry '{entry}': expected 0 to 100")]
    InvalidProgress {
        /// Entry as written in the script.
        entry: String,
    },
}

fn scripted_snapshot(id: &TaskId, entry: &str) -> Result<TaskSnapshot, ScriptError> {
    let (raw, percent) = entry
        .split_once(':')
        .map_or((entry, None), |(status, percent)| (status, Some(percent)));
    let progress = percent
        .map(|text| parse_progress(entry, text))
        .transpose()?;
    let raw_status = raw.trim();
    let mut snapshot = TaskSnapshot {
        raw_status: raw_status.to_owned(),
        ..TaskSnapshot::new(id.clone(), TaskStatus::from_raw(raw_status)?)
    };
    if let Some(value) = progress {
        snapshot = snapshot.with_progress(value);
    }
    Ok(snapshot)
}

fn parse_progress(entry: &str, text: &str) -> Result<u8, ScriptError> {
    text.trim()
        .parse::<u8>()
        .ok()
        .filter(|value| *value <= 100)
        .ok_or_else(|| ScriptError::InvalidProgress {
            entry: entry.to_owned(),
        })
}

/// Produces a task document as served by the deployment manager.
#[must_use]
pub fn json_task(
    id: u64,
    name: &str,
    status: &str,
    progress: u8,
    message: Option<&str>,
) -> String {
    let message_json = message.map_or_else(|| String::from("null"), |text| format!("\"{text}\""));
    format!(
        "{{\"id\":{id},\"name\":\"{name}\",\"status\":\"{status}\",\"progress\":{progress},\"message\":{message_json},\"result\":{{}}}}"
    )
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
