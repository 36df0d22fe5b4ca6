//! Binary entry point for the `taskwatch` CLI.

use std::convert::Infallible;
use std::io::{self, Write};
use std::process;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing::info;

use taskwatch::config::WaitSettings;
use taskwatch::fuel_cli::CliTaskSource;
use taskwatch::nailgun::{NailgunClient, NailgunConfig};
use taskwatch::remote::{RemoteConfig, RemoteExecutor};
use taskwatch::task::{AsyncTaskSource, TaskId, TaskSnapshot, TaskTracker, TrackError};
use taskwatch::wait::{self, WaitConfig, WaitError};
use taskwatch::{logging, probe};

mod cli;

use cli::{Cli, CliTaskCommand, PortCommand, TaskCommand, WaitArgs};

/// Exit status used when a wait runs out of time, matching `timeout(1)`.
const EXIT_TIMEOUT: i32 = 124;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("{0}")]
    Timeout(String),
    #[error("{0}")]
    Failed(String),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Timeout(_) => EXIT_TIMEOUT,
            Self::Config(_) | Self::Failed(_) => 1,
        }
    }

    fn from_track<E>(err: &TrackError<E>) -> Self
    where
        E: std::error::Error + 'static,
    {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Failed(err.to_string())
        }
    }

    fn from_wait<E>(err: &WaitError<E>) -> Self
    where
        E: std::error::Error + 'static,
    {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Failed(err.to_string())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init() {
        writeln!(io::stderr(), "{err}").ok();
    }

    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            err.exit_code()
        }
    };

    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let settings =
        WaitSettings::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    match cli {
        Cli::Task(command) => run_task(&settings, command).await,
        Cli::CliTask(command) => run_cli_task(&settings, command).await,
        Cli::Port(command) => run_port(&settings, command).await,
    }
}

fn wait_config(
    base: Result<WaitConfig, taskwatch::config::ConfigError>,
    overrides: WaitArgs,
) -> Result<WaitConfig, CliError> {
    let config = base.map_err(|err| CliError::Config(err.to_string()))?;
    let interval = overrides
        .interval
        .map_or_else(|| config.interval(), Duration::from_secs);
    let timeout = overrides
        .timeout
        .map_or_else(|| config.timeout(), Duration::from_secs);
    WaitConfig::new(interval, timeout).map_err(|err| CliError::Config(err.to_string()))
}

async fn run_task(settings: &WaitSettings, command: TaskCommand) -> Result<(), CliError> {
    let config = wait_config(settings.task_config(), command.wait)?;
    let tracker = TaskTracker::new(config);
    let id = TaskId::new(command.task_id);

    #[cfg(feature = "test-backdoors")]
    if let Some(source) = backdoors::scripted_source(&id)? {
        return track_async(&tracker, &source, &id, command.progress).await;
    }

    let nailgun_config =
        NailgunConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let client =
        NailgunClient::new(&nailgun_config).map_err(|err| CliError::Config(err.to_string()))?;
    track_async(&tracker, &client, &id, command.progress).await
}

async fn track_async<S>(
    tracker: &TaskTracker,
    source: &S,
    id: &TaskId,
    progress: Option<u8>,
) -> Result<(), CliError>
where
    S: AsyncTaskSource + ?Sized,
{
    let outcome = match progress {
        Some(percent) => tracker.wait_for_progress_async(source, id, percent).await,
        None => tracker.wait_for_task_async(source, id).await,
    };
    let snapshot = outcome.map_err(|err| CliError::from_track(&err))?;
    write_snapshot(io::stdout(), &snapshot);
    Ok(())
}

async fn run_cli_task(settings: &WaitSettings, command: CliTaskCommand) -> Result<(), CliError> {
    let config = wait_config(settings.task_config(), command.wait)?;
    let remote_config =
        RemoteConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    let executor = RemoteExecutor::with_process_runner(remote_config)
        .map_err(|err| CliError::Config(err.to_string()))?;
    let source = CliTaskSource::with_process_runner(executor, command.admin_host)
        .and_then(|cli_source| cli_source.with_fuel_bin(command.fuel_bin))
        .map_err(|err| CliError::Config(err.to_string()))?;
    let id = TaskId::new(command.task_id);
    let progress = command.progress;

    let outcome = tokio::task::spawn_blocking(move || {
        let tracker = TaskTracker::new(config);
        match progress {
            Some(percent) => tracker.wait_for_progress(&source, &id, percent),
            None => tracker.wait_for_task(&source, &id),
        }
    })
    .await
    .map_err(|err| CliError::Failed(format!("task wait aborted: {err}")))?;

    let snapshot = outcome.map_err(|err| CliError::from_track(&err))?;
    write_snapshot(io::stdout(), &snapshot);
    Ok(())
}

async fn run_port(settings: &WaitSettings, command: PortCommand) -> Result<(), CliError> {
    let addr = probe::resolve(&command.host, command.port)
        .map_err(|err| CliError::Failed(err.to_string()))?;
    let connect_timeout = Duration::from_secs(command.connect_timeout);
    let config = wait_config(settings.poll_config(), command.wait)?
        .with_message(format!("{addr} is not accepting connections"));

    info!(%addr, "waiting for port");
    wait::wait_async(&config, || async move {
        Ok::<bool, Infallible>(probe::tcp_ping_async(addr, connect_timeout).await)
    })
    .await
    .map_err(|err| CliError::from_wait(&err))?;

    writeln!(io::stdout(), "reachable={addr}").ok();
    Ok(())
}

fn write_snapshot(mut target: impl Write, snapshot: &TaskSnapshot) {
    writeln!(target, "id={}", snapshot.id).ok();
    writeln!(target, "status={}", snapshot.raw_status).ok();
    if let Some(progress) = snapshot.progress {
        writeln!(target, "progress={progress}").ok();
    }
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(feature = "test-backdoors")]
mod backdoors {
    //! Scripted task sources for exercising the binary without a lab.

    use std::env;

    use taskwatch::task::TaskId;
    use taskwatch::test_support::ScriptedTaskSource;

    use super::CliError;

    /// Comma-separated `status[:progress]` script replayed instead of
    /// querying the REST API.
    pub(super) const FAKE_TASK_STATUSES_ENV: &str = "TASKWATCH_FAKE_TASK_STATUSES";

    pub(super) fn scripted_source(id: &TaskId) -> Result<Option<ScriptedTaskSource>, CliError> {
        let Ok(script) = env::var(FAKE_TASK_STATUSES_ENV) else {
            return Ok(None);
        };
        let entries = script.split(',').collect::<Vec<_>>();
        ScriptedTaskSource::from_statuses(id, &entries)
            .map(Some)
            .map_err(|err| CliError::Config(err.to_string()))
    }
}
