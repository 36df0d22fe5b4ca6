//! BDD step definitions for task tracking.

use rstest_bdd_macros::{given, then, when};
use taskwatch::test_support::ScriptedTaskSource;
use taskwatch::{TaskId, TaskSnapshot, TaskStatus, TrackError};

use super::test_helpers::{FailureKind, TaskContext, TrackOutcome, build_tracker};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a tracker polling every {interval:u64} ms for at most {timeout:u64} ms")]
fn tracker_timings(mut task_context: TaskContext, interval: u64, timeout: u64) -> TaskContext {
    task_context.tracker = build_tracker(interval, timeout);
    task_context
}

#[given("task {id:u64} reports statuses \"{script}\"")]
fn task_reports_statuses(mut task_context: TaskContext, id: u64, script: String) -> TaskContext {
    let task_id = TaskId::from(id);
    let entries = script.split(',').collect::<Vec<_>>();
    task_context.source = ScriptedTaskSource::from_statuses(&task_id, &entries)
        .unwrap_or_else(|err| panic!("test setup requires known statuses: {err}"));
    task_context.id = task_id;
    task_context
}

#[given("the task then fails with message \"{message}\"")]
fn task_then_fails(task_context: TaskContext, message: String) -> TaskContext {
    task_context.source.push_snapshot(
        TaskSnapshot::new(task_context.id.clone(), TaskStatus::Error)
            .with_name("deployment")
            .with_message(message),
    );
    task_context
}

#[given("task {id:u64} cannot be fetched because \"{reason}\"")]
fn task_cannot_be_fetched(mut task_context: TaskContext, id: u64, reason: String) -> TaskContext {
    task_context.id = TaskId::from(id);
    task_context.source = ScriptedTaskSource::new();
    task_context.source.push_error(reason);
    task_context
}

#[when("I wait for the task to finish")]
fn wait_for_finish(mut task_context: TaskContext) -> TaskContext {
    let result = task_context
        .tracker
        .wait_for_task(&task_context.source, &task_context.id);
    task_context.outcome = Some(record(result));
    task_context
}

#[when("I wait for the task to reach {percent:u8} percent")]
fn wait_for_progress(mut task_context: TaskContext, percent: u8) -> TaskContext {
    let result =
        task_context
            .tracker
            .wait_for_progress(&task_context.source, &task_context.id, percent);
    task_context.outcome = Some(record(result));
    task_context
}

fn record<E>(result: Result<TaskSnapshot, TrackError<E>>) -> TrackOutcome
where
    E: std::error::Error + 'static,
{
    match result {
        Ok(snapshot) => TrackOutcome::Finished(snapshot),
        Err(err) => {
            let kind = match err {
                TrackError::Timeout { .. } => FailureKind::Timeout,
                TrackError::TaskFailed { .. } => FailureKind::TaskFailed,
                TrackError::Skipped { .. } => FailureKind::Skipped,
                TrackError::Source(_) => FailureKind::Source,
            };
            TrackOutcome::Failed {
                kind,
                message: err.to_string(),
            }
        }
    }
}

fn finished(task_context: &TaskContext) -> Result<&TaskSnapshot, StepError> {
    match task_context.outcome.as_ref() {
        Some(TrackOutcome::Finished(snapshot)) => Ok(snapshot),
        Some(TrackOutcome::Failed { message, .. }) => Err(StepError::Assertion(format!(
            "expected the wait to succeed, got: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

fn failed(task_context: &TaskContext, expected: FailureKind) -> Result<&str, StepError> {
    match task_context.outcome.as_ref() {
        Some(TrackOutcome::Failed { kind, message }) if *kind == expected => Ok(message),
        Some(other) => Err(StepError::Assertion(format!(
            "expected {expected:?} failure, got: {other:?}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the wait returns status \"{status}\"")]
fn returns_status(task_context: &TaskContext, status: String) -> Result<(), StepError> {
    let snapshot = finished(task_context)?;
    if snapshot.raw_status == status {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected status {status}, got {}",
            snapshot.raw_status
        )))
    }
}

#[then("the reported progress is {percent:u8}")]
fn reported_progress(task_context: &TaskContext, percent: u8) -> Result<(), StepError> {
    let snapshot = finished(task_context)?;
    if snapshot.progress == Some(percent) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected progress {percent}, got {:?}",
            snapshot.progress
        )))
    }
}

#[then("the task was fetched {count:u32} times")]
fn fetch_count(task_context: &TaskContext, count: u32) -> Result<(), StepError> {
    let fetches = task_context.source.fetches();
    if fetches == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} fetches, got {fetches}"
        )))
    }
}

#[then("the wait fails as a task failure mentioning \"{text}\"")]
fn fails_as_task_failure(task_context: &TaskContext, text: String) -> Result<(), StepError> {
    let message = failed(task_context, FailureKind::TaskFailed)?;
    if message.contains(&text) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected failure to mention '{text}', got: {message}"
        )))
    }
}

#[then("the wait times out")]
fn times_out(task_context: &TaskContext) -> Result<(), StepError> {
    failed(task_context, FailureKind::Timeout).map(drop)
}

#[then("the wait fails with a fetch error")]
fn fails_with_fetch_error(task_context: &TaskContext) -> Result<(), StepError> {
    let message = failed(task_context, FailureKind::Source)?;
    if message.contains("connection refused") {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected fetch failure detail, got: {message}"
        )))
    }
}
