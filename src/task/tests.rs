//! Unit tests for task status mapping and the task tracker.

use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;
use crate::test_support::{ScriptError, ScriptedTaskSource};
use crate::wait::{Check, WaitConfig};

#[fixture]
fn task_id() -> TaskId {
    TaskId::from(42_u64)
}

#[fixture]
fn tracker() -> TaskTracker {
    let config = WaitConfig::new(Duration::from_millis(10), Duration::from_millis(500))
        .expect("test config should be valid");
    TaskTracker::new(config)
}

fn scripted(id: &TaskId, entries: &[&str]) -> ScriptedTaskSource {
    ScriptedTaskSource::from_statuses(id, entries).expect("script uses known statuses")
}

#[rstest]
#[case("pending", TaskStatus::Pending)]
#[case("queued", TaskStatus::Pending)]
#[case("running", TaskStatus::Running)]
#[case("in_progress", TaskStatus::Running)]
#[case("ready", TaskStatus::Ready)]
#[case("finished", TaskStatus::Ready)]
#[case("success", TaskStatus::Ready)]
#[case("  READY ", TaskStatus::Ready)]
#[case("error", TaskStatus::Error)]
#[case("failed", TaskStatus::Error)]
#[case("cancelled", TaskStatus::Error)]
fn raw_statuses_map_to_canonical(#[case] raw: &str, #[case] expected: TaskStatus) {
    assert_eq!(TaskStatus::from_raw(raw), Ok(expected));
}

#[rstest]
#[case("")]
#[case("stopped")]
#[case("readyish")]
fn unknown_statuses_are_rejected(#[case] raw: &str) {
    let err = TaskStatus::from_raw(raw).expect_err("status should be unknown");
    assert_eq!(err.raw, raw);
}

#[test]
fn terminal_states_are_ready_and_error() {
    assert!(TaskStatus::Ready.is_terminal());
    assert!(TaskStatus::Error.is_terminal());
    assert!(!TaskStatus::Running.is_terminal());
    assert!(!TaskStatus::Pending.is_terminal());
    assert!(TaskStatus::Ready.is_success());
    assert!(TaskStatus::Error.is_failure());
}

#[test]
fn raw_task_converts_into_snapshot() {
    let raw: RawTask = serde_json::from_str(
        r#"{"id": 7, "name": "deploy", "status": "running", "progress": 140, "message": "  ", "result": null}"#,
    )
    .expect("payload should parse");
    let snapshot = TaskSnapshot::try_from(raw).expect("status is known");

    assert_eq!(snapshot.id, TaskId::from(7_u64));
    assert_eq!(snapshot.name.as_deref(), Some("deploy"));
    assert_eq!(snapshot.status, TaskStatus::Running);
    assert_eq!(snapshot.progress, Some(100));
    assert_eq!(snapshot.message, None);
    assert_eq!(snapshot.result, None);
    assert_eq!(snapshot.label(), "deploy (id 7)");
}

#[test]
fn raw_task_accepts_text_identifiers() {
    let raw: RawTask = serde_json::from_str(
        r#"{"id": "0b5d8c4e-1d2f-4b8e-9d3c-5a6b7c8d9e0f", "status": "success"}"#,
    )
    .expect("payload should parse");
    let snapshot = TaskSnapshot::try_from(raw).expect("status is known");
    assert_eq!(snapshot.id.as_str(), "0b5d8c4e-1d2f-4b8e-9d3c-5a6b7c8d9e0f");
    assert_eq!(snapshot.raw_status, "success");
    assert_eq!(snapshot.status, TaskStatus::Ready);
}

#[rstest]
#[case("running:abc")]
#[case("running:4O")]
#[case("running:")]
#[case("running:101")]
fn scripts_reject_malformed_progress(task_id: TaskId, #[case] entry: &str) {
    let err = ScriptedTaskSource::from_statuses(&task_id, &["pending", entry])
        .expect_err("progress is malformed");

    assert_eq!(
        err,
        ScriptError::InvalidProgress {
            entry: entry.to_owned()
        }
    );
    assert!(err.to_string().contains(entry), "rendered: {err}");
}

#[rstest]
fn scripts_reject_unknown_statuses(task_id: TaskId) {
    let err = ScriptedTaskSource::from_statuses(&task_id, &["stopped:10"])
        .expect_err("status is unknown");

    assert!(matches!(err, ScriptError::UnknownStatus(_)), "unexpected error: {err}");
}

#[rstest]
fn scripts_keep_progress_and_raw_status(task_id: TaskId) {
    let source = scripted(&task_id, &[" finished : 100 "]);

    let snapshot = TaskSource::fetch(&source, &task_id).expect("script has an entry");

    assert_eq!(snapshot.raw_status, "finished");
    assert_eq!(snapshot.status, TaskStatus::Ready);
    assert_eq!(snapshot.progress, Some(100));
}

#[rstest]
fn wait_for_task_returns_final_snapshot(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["pending", "running", "ready"]);

    let snapshot = tracker
        .wait_for_task(&source, &task_id)
        .expect("task should finish");

    assert_eq!(snapshot.status, TaskStatus::Ready);
    assert_eq!(source.fetches(), 3);
}

#[rstest]
fn wait_for_task_waits_through_repeated_pending(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["pending", "pending", "running", "ready"]);

    let snapshot = tracker
        .wait_for_task(&source, &task_id)
        .expect("task should finish");

    assert_eq!(snapshot.raw_status, "ready");
    assert_eq!(source.fetches(), 4);
}

#[test]
fn wait_for_task_timeout_is_bounded_by_one_interval() {
    let id = TaskId::from(5_u64);
    let source = scripted(&id, &["running"]);
    let config = WaitConfig::new(Duration::from_millis(100), Duration::from_secs(1))
        .expect("test config should be valid");
    let started = std::time::Instant::now();

    let err = TaskTracker::new(config)
        .wait_for_task(&source, &id)
        .expect_err("task never finishes");

    let elapsed = started.elapsed();
    assert!(err.is_timeout(), "unexpected error: {err}");
    assert!(elapsed >= Duration::from_secs(1), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1_500), "elapsed {elapsed:?}");
}

#[rstest]
fn wait_for_task_reports_task_failure_with_detail(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["running"]);
    source.push_snapshot(
        TaskSnapshot::new(task_id.clone(), TaskStatus::Error)
            .with_name("deploy")
            .with_message("Provisioning failed on node-3"),
    );

    let err = tracker
        .wait_for_task(&source, &task_id)
        .expect_err("task ends in error");

    assert!(err.is_task_failure(), "unexpected error: {err}");
    let rendered = err.to_string();
    assert!(rendered.contains("deploy (id 42)"), "rendered: {rendered}");
    assert!(
        rendered.contains("Provisioning failed on node-3"),
        "rendered: {rendered}"
    );
}

#[rstest]
fn wait_for_task_failure_without_detail_says_so(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["failed"]);

    let err = tracker
        .wait_for_task(&source, &task_id)
        .expect_err("task ends in error");

    match err {
        TrackError::TaskFailed {
            status, message, ..
        } => {
            assert_eq!(status, "failed");
            assert_eq!(message, None);
        }
        other => panic!("expected task failure, got {other}"),
    }
}

#[test]
fn wait_for_task_times_out_on_a_running_task() {
    let id = TaskId::from(9_u64);
    let source = ScriptedTaskSource::new();
    source.push_snapshot(
        TaskSnapshot::new(id.clone(), TaskStatus::Running).with_name("verify_networks"),
    );
    let config = WaitConfig::new(Duration::from_millis(10), Duration::from_millis(60))
        .expect("test config should be valid");

    let err = TaskTracker::new(config)
        .wait_for_task(&source, &id)
        .expect_err("task never finishes");

    match err {
        TrackError::Timeout {
            ref task,
            elapsed,
            attempts,
        } => {
            assert_eq!(task, "verify_networks (id 9)");
            assert!(elapsed >= Duration::from_millis(60), "elapsed {elapsed:?}");
            assert!(attempts >= 2, "attempts {attempts}");
        }
        ref other => panic!("expected timeout, got {other}"),
    }
    assert!(err.is_timeout());
}

#[rstest]
fn wait_for_task_propagates_source_errors_immediately(tracker: TaskTracker, task_id: TaskId) {
    let source = ScriptedTaskSource::new();
    source.push_error("connection refused");

    let err = tracker
        .wait_for_task(&source, &task_id)
        .expect_err("fetch fails");

    assert!(matches!(err, TrackError::Source(_)), "unexpected error: {err}");
    assert_eq!(source.fetches(), 1);
}

#[rstest]
fn wait_for_progress_stops_at_threshold(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["running:10", "running:45", "running:60", "ready:100"]);

    let snapshot = tracker
        .wait_for_progress(&source, &task_id, 50)
        .expect("progress should reach 50");

    assert_eq!(snapshot.progress, Some(60));
    assert_eq!(snapshot.status, TaskStatus::Running);
    assert_eq!(source.fetches(), 3);
}

#[rstest]
fn wait_for_progress_ends_on_terminal_state(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["running:10", "error:20"]);

    let err = tracker
        .wait_for_progress(&source, &task_id, 90)
        .expect_err("task fails before reaching 90");

    assert!(err.is_task_failure(), "unexpected error: {err}");
}

#[rstest]
fn custom_classifier_can_skip(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["pending"]);

    let err = tracker
        .wait_for_task_with(&source, &task_id, |_| {
            Check::Skip(String::from("cluster has no controllers"))
        })
        .expect_err("classifier skips");

    assert!(
        matches!(
            err,
            TrackError::Skipped { ref reason, .. } if reason == "cluster has no controllers"
        ),
        "unexpected error: {err}"
    );
}

#[rstest]
#[tokio::test]
async fn wait_for_task_async_returns_final_snapshot(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["pending", "ready"]);

    let snapshot = tracker
        .wait_for_task_async(&source, &task_id)
        .await
        .expect("task should finish");

    assert_eq!(snapshot.status, TaskStatus::Ready);
    assert_eq!(source.fetches(), 2);
}

#[rstest]
#[tokio::test]
async fn wait_for_progress_async_reports_failure(tracker: TaskTracker, task_id: TaskId) {
    let source = scripted(&task_id, &["running:5", "error"]);

    let err = tracker
        .wait_for_progress_async(&source, &task_id, 50)
        .await
        .expect_err("task fails");

    assert!(err.is_task_failure(), "unexpected error: {err}");
}
