//! Error-envelope and exit-code behavior that doesn't need a live backend.

use crate::prelude::*;

#[test]
fn unknown_command_is_usage_error_exit_2() {
    let run = amux().args(&["--json", "frobnicate", "widgets"]).fails();
    assert_eq!(run.code(), Some(2));
    let json = run.json();
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "unknown_command");
}

#[test]
fn missing_required_flag_is_usage_error() {
    let run = amux().args(&["--json", "terminal", "run"]).fails();
    assert_eq!(run.code(), Some(2));
    let json = run.json();
    assert_eq!(json["error"]["code"], "usage_error");
}

#[test]
fn malformed_timeout_is_usage_error_before_dispatch() {
    let run = amux().args(&["--json", "--timeout", "1sec", "session", "list"]).fails();
    assert_eq!(run.code(), Some(2));
}

#[test]
fn timeout_flag_alone_with_no_value_errors() {
    amux().args(&["session", "list", "--timeout"]).fails();
}

#[test]
fn cwd_into_missing_directory_is_usage_error() {
    let run = amux().args(&["--json", "--cwd", "/no/such/directory/amux-spec", "session", "list"]).fails();
    assert_eq!(run.code(), Some(2));
    assert_eq!(run.json()["error"]["code"], "usage_error");
}

#[test]
fn missing_tmux_dependency_is_reported_with_dependency_exit_code() {
    let run = amux().without_tmux().args(&["--json", "session", "list"]).fails();
    // Dependency errors map to exit code 4.
    assert_eq!(run.code(), Some(4));
    assert_eq!(run.json()["ok"], false);
}

#[test]
fn job_wait_on_unknown_job_id_is_not_found() {
    let project = Project::empty();
    let run = project.amux().args(&["--json", "agent", "job", "wait", "no-such-job", "--timeout", "50ms"]).fails();
    assert_eq!(run.code(), Some(3));
    assert_eq!(run.json()["error"]["code"], "not_found");
}

#[test]
fn job_cancel_on_unknown_job_id_is_not_found() {
    let project = Project::empty();
    let run = project.amux().args(&["--json", "agent", "job", "cancel", "no-such-job"]).fails();
    assert_eq!(run.code(), Some(3));
}

#[test]
fn session_prune_without_yes_is_unsafe_blocked() {
    let project = Project::empty();
    let run = project.amux().args(&["--json", "session", "prune"]).fails();
    assert_eq!(run.code(), Some(5));
    assert_eq!(run.json()["error"]["code"], "unsafe_blocked");
}
