//! Shared fixtures for task tracker BDD scenarios.

use std::time::Duration;

use rstest::fixture;
use taskwatch::test_support::ScriptedTaskSource;
use taskwatch::{TaskId, TaskSnapshot, TaskTracker, WaitConfig};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Timeout,
    TaskFailed,
    Skipped,
    Source,
}

#[derive(Clone, Debug)]
pub enum TrackOutcome {
    Finished(TaskSnapshot),
    Failed { kind: FailureKind, message: String },
}

#[derive(Clone, Debug)]
pub struct TaskContext {
    pub id: TaskId,
    pub tracker: TaskTracker,
    pub source: ScriptedTaskSource,
    pub outcome: Option<TrackOutcome>,
}

#[fixture]
pub fn task_context() -> TaskContext {
    TaskContext {
        id: TaskId::from(1_u64),
        tracker: build_tracker(10, 500),
        source: ScriptedTaskSource::new(),
        outcome: None,
    }
}

pub fn build_tracker(interval_ms: u64, timeout_ms: u64) -> TaskTracker {
    let config = WaitConfig::new(
        Duration::from_millis(interval_ms),
        Duration::from_millis(timeout_ms),
    )
    .unwrap_or_else(|err| panic!("tracker config should be valid: {err}"));
    TaskTracker::new(config)
}
