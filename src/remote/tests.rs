//! Unit tests for the SSH executor.

use rstest::{fixture, rstest};

use super::*;
use crate::test_support::ScriptedRunner;

#[fixture]
fn base_config() -> RemoteConfig {
    RemoteConfig {
        bin: String::from("ssh"),
        user: String::from("root"),
        port: 2222,
        batch_mode: true,
        strict_host_key_checking: false,
        known_hosts_file: String::from("/dev/null"),
        connect_timeout_secs: 5,
        identity_file: None,
    }
}

#[rstest]
fn remote_config_validate_accepts_defaults() {
    assert!(RemoteConfig::default().validate().is_ok());
}

#[rstest]
#[case::empty_bin(|cfg: &mut RemoteConfig| cfg.bin = String::new(), "bin")]
#[case::blank_user(|cfg: &mut RemoteConfig| cfg.user = String::from("  "), "user")]
#[case::blank_identity(|cfg: &mut RemoteConfig| cfg.identity_file = Some(String::from(" ")), "identity_file")]
#[case::zero_port(|cfg: &mut RemoteConfig| cfg.port = 0, "port")]
fn remote_config_validation_names_the_field(
    base_config: RemoteConfig,
    #[case] mutate: fn(&mut RemoteConfig),
    #[case] expected: &str,
) {
    let mut cfg = base_config;
    mutate(&mut cfg);
    let err = cfg.validate().expect_err("config should be rejected");
    assert_eq!(
        err,
        RemoteError::InvalidConfig {
            field: expected.to_owned()
        }
    );
}

#[test]
fn invalid_config_message_mentions_env_var() {
    let err = RemoteError::InvalidConfig {
        field: String::from("user"),
    };
    assert_eq!(
        err.to_string(),
        "missing user: set TASKWATCH_SSH_USER or add user at the top level of taskwatch.toml"
    );
}

#[rstest]
fn execute_builds_ssh_invocation(base_config: RemoteConfig) {
    let cfg = RemoteConfig {
        identity_file: Some(String::from("/keys/lab")),
        ..base_config
    };
    let runner = ScriptedRunner::new();
    runner.push_stdout("ok\n");
    let executor = RemoteExecutor::new(cfg, runner.clone()).expect("config should validate");

    let output = executor
        .execute(" 10.109.0.2 ", "fuel task --json")
        .expect("command should run");

    assert_eq!(output.stdout, "ok\n");
    assert!(output.is_success());
    let invocations = runner.invocations();
    let [invocation] = invocations.as_slice() else {
        panic!("expected one invocation, got {invocations:?}");
    };
    assert_eq!(invocation.program, "ssh");
    let args = invocation.arg_strings();
    assert_eq!(
        args,
        vec![
            "-p",
            "2222",
            "-o",
            "ConnectTimeout=5",
            "-i",
            "/keys/lab",
            "-o",
            "BatchMode=yes",
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            "root@10.109.0.2",
            "fuel task --json",
        ]
    );
}

#[rstest]
fn execute_omits_relaxed_options_when_strict(base_config: RemoteConfig) {
    let cfg = RemoteConfig {
        batch_mode: false,
        strict_host_key_checking: true,
        known_hosts_file: String::new(),
        ..base_config
    };
    let runner = ScriptedRunner::new();
    runner.push_stdout("");
    let executor = RemoteExecutor::new(cfg, runner.clone()).expect("config should validate");

    executor
        .execute("node-1", "true")
        .expect("command should run");

    let args = runner
        .invocations()
        .first()
        .map(|invocation| invocation.arg_strings().join(" "))
        .unwrap_or_default();
    assert!(!args.contains("BatchMode"), "args: {args}");
    assert!(!args.contains("StrictHostKeyChecking"), "args: {args}");
    assert!(!args.contains("UserKnownHostsFile"), "args: {args}");
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("-oProxyCommand=evil")]
#[case("node 1")]
fn execute_rejects_unusable_hosts(base_config: RemoteConfig, #[case] host: &str) {
    let runner = ScriptedRunner::new();
    let executor =
        RemoteExecutor::new(base_config, runner.clone()).expect("config should validate");

    let err = executor.execute(host, "true").expect_err("host is invalid");

    assert!(matches!(err, RemoteError::InvalidHost { .. }), "unexpected error: {err}");
    assert!(runner.invocations().is_empty());
}

#[rstest]
fn execute_returns_non_zero_output_unchecked(base_config: RemoteConfig) {
    let runner = ScriptedRunner::new();
    runner.push_failure(3, "boom");
    let executor = RemoteExecutor::new(base_config, runner).expect("config should validate");

    let output = executor.execute("node-1", "false").expect("unchecked run");

    assert_eq!(output.exit_code, Some(3));
    assert_eq!(output.stderr, "boom");
}

#[rstest]
fn execute_checked_reports_command_failure(base_config: RemoteConfig) {
    let runner = ScriptedRunner::new();
    runner.push_failure(1, "fuel: command not found\n");
    let executor = RemoteExecutor::new(base_config, runner).expect("config should validate");

    let err = executor
        .execute_checked("10.109.0.2", "fuel task")
        .expect_err("non-zero exit should fail");

    assert_eq!(
        err,
        RemoteError::CommandFailure {
            host: String::from("10.109.0.2"),
            command: String::from("fuel task"),
            status: Some(1),
            status_text: String::from("1"),
            stderr: String::from("fuel: command not found"),
        }
    );
}

#[rstest]
fn execute_checked_reports_missing_exit_code(base_config: RemoteConfig) {
    let runner = ScriptedRunner::new();
    runner.push_output(None, "", "");
    let executor = RemoteExecutor::new(base_config, runner).expect("config should validate");

    let err = executor
        .execute_checked("node-1", "sleep 1")
        .expect_err("signal termination should fail");

    assert!(err.to_string().contains("status unknown"), "message: {err}");
}

#[test]
fn render_command_quotes_each_part() {
    assert_eq!(
        render_command("fuel", &["task", "--task-id", "7; rm -rf /"]),
        "fuel task --task-id '7; rm -rf /'"
    );
}

#[test]
fn expand_tilde_leaves_absolute_paths() {
    assert_eq!(expand_tilde("/etc/ssh/key"), "/etc/ssh/key");
}
