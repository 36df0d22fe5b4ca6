//! Condition polling with a fixed interval and an overall deadline.
//!
//! Every wait follows the same rule: evaluate the predicate, return as soon as
//! it holds, otherwise fail once the elapsed time has reached the timeout or
//! sleep for the interval and try again. The clock starts just before the
//! first evaluation, so at least one check always happens even when the
//! timeout is shorter than the interval, and the last check lands at or after
//! the deadline.
//!
//! Predicate errors are never treated as "not yet": they end the wait at once
//! as [`WaitError::Predicate`]. A predicate that wants to tolerate a transient
//! failure has to map it to [`Check::Pending`] itself.

use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{trace, warn};

mod config;
mod error;

pub use config::{
    DEFAULT_INTERVAL, DEFAULT_TIMEOUT, DEFAULT_TIMEOUT_MESSAGE, WaitConfig, WaitConfigError,
};
pub use error::WaitError;

/// Outcome of a single predicate evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Check {
    /// The condition holds; the wait returns.
    Done,
    /// The condition does not hold yet; keep polling.
    Pending,
    /// The condition can never be met in a meaningful way; abandon the wait
    /// with [`WaitError::Skipped`].
    Skip(String),
}

impl From<bool> for Check {
    fn from(value: bool) -> Self {
        if value { Self::Done } else { Self::Pending }
    }
}

/// Blocks the calling thread until `predicate` reports [`Check::Done`].
///
/// # Errors
///
/// Returns [`WaitError::Timeout`] once the deadline passes,
/// [`WaitError::Skipped`] when the predicate skips, and
/// [`WaitError::Predicate`] as soon as the predicate fails.
pub fn wait<C, E, F>(config: &WaitConfig, mut predicate: F) -> Result<(), WaitError<E>>
where
    C: Into<Check>,
    E: std::error::Error + 'static,
    F: FnMut() -> Result<C, E>,
{
    wait_for(config, || predicate().map(Into::into), Check::clone).map(drop)
}

/// Blocking wait for an infallible boolean predicate.
///
/// # Errors
///
/// Returns [`WaitError::Timeout`] once the deadline passes.
pub fn wait_until<F>(config: &WaitConfig, mut predicate: F) -> Result<(), WaitError<Infallible>>
where
    F: FnMut() -> bool,
{
    wait(config, || Ok::<bool, Infallible>(predicate()))
}

/// Blocks until `accept` approves a value produced by `fetch`, returning that
/// value.
///
/// # Errors
///
/// Same as [`wait`].
pub fn wait_for<T, E, F, A>(
    config: &WaitConfig,
    mut fetch: F,
    mut accept: A,
) -> Result<T, WaitError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Result<T, E>,
    A: FnMut(&T) -> Check,
{
    let mut clock = PollClock::start();
    loop {
        let value = fetch().map_err(WaitError::Predicate)?;
        clock.record_attempt();
        match accept(&value) {
            Check::Done => return Ok(value),
            Check::Skip(reason) => return Err(WaitError::Skipped { reason }),
            Check::Pending => clock.expire(config)?,
        }
        std::thread::sleep(config.interval());
    }
}

/// Async counterpart of [`wait`]; suspends on the Tokio timer between checks.
///
/// # Errors
///
/// Same as [`wait`].
pub async fn wait_async<C, E, F, Fut>(
    config: &WaitConfig,
    mut predicate: F,
) -> Result<(), WaitError<E>>
where
    C: Into<Check>,
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<C, E>>,
{
    let mut clock = PollClock::start();
    loop {
        let check: Check = predicate().await.map_err(WaitError::Predicate)?.into();
        clock.record_attempt();
        match check {
            Check::Done => return Ok(()),
            Check::Skip(reason) => return Err(WaitError::Skipped { reason }),
            Check::Pending => clock.expire(config)?,
        }
        tokio::time::sleep(config.interval()).await;
    }
}

/// Async counterpart of [`wait_for`].
///
/// # Errors
///
/// Same as [`wait`].
pub async fn wait_for_async<T, E, F, Fut, A>(
    config: &WaitConfig,
    mut fetch: F,
    mut accept: A,
) -> Result<T, WaitError<E>>
where
    E: std::error::Error + 'static,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    A: FnMut(&T) -> Check,
{
    let mut clock = PollClock::start();
    loop {
        let value = fetch().await.map_err(WaitError::Predicate)?;
        clock.record_attempt();
        match accept(&value) {
            Check::Done => return Ok(value),
            Check::Skip(reason) => return Err(WaitError::Skipped { reason }),
            Check::Pending => clock.expire(config)?,
        }
        tokio::time::sleep(config.interval()).await;
    }
}

/// Tracks elapsed time and attempts for one wait.
struct PollClock {
    started: Instant,
    attempts: u32,
}

impl PollClock {
    fn start() -> Self {
        Self {
            started: Instant::now(),
            attempts: 0,
        }
    }

    const fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    fn expire<E>(&self, config: &WaitConfig) -> Result<(), WaitError<E>>
    where
        E: std::error::Error + 'static,
    {
        let elapsed = self.started.elapsed();
        if elapsed < config.timeout() {
            trace!(
                attempt = self.attempts,
                elapsed_ms = millis(elapsed),
                "condition pending"
            );
            return Ok(());
        }

        warn!(
            attempts = self.attempts,
            elapsed_ms = millis(elapsed),
            timeout_ms = millis(config.timeout()),
            "{}",
            config.message()
        );
        Err(WaitError::Timeout {
            message: config.message().to_owned(),
            elapsed,
            attempts: self.attempts,
        })
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
