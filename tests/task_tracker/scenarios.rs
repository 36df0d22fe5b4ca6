//! BDD scenarios for the task tracker.

use rstest_bdd_macros::scenario;

use super::test_helpers::{TaskContext, task_context};

#[scenario(
    path = "tests/features/task_tracker.feature",
    name = "Task finishes after pending and running"
)]
fn scenario_task_finishes(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task_tracker.feature",
    name = "Failed task surfaces its error detail"
)]
fn scenario_task_fails(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task_tracker.feature",
    name = "Task that never finishes times out"
)]
fn scenario_task_times_out(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task_tracker.feature",
    name = "Progress threshold returns a running task"
)]
fn scenario_progress_threshold(task_context: TaskContext) {
    let _ = task_context;
}

#[scenario(
    path = "tests/features/task_tracker.feature",
    name = "Status fetch failures are not retried"
)]
fn scenario_fetch_failure(task_context: TaskContext) {
    let _ = task_context;
}
