//! Idempotent replay: a repeated `--idempotency-key` invocation must
//! reproduce the first response byte-for-byte, not just semantically.

use crate::prelude::*;

#[test]
fn replayed_response_is_byte_identical_to_the_original() {
    require_tmux!();
    let project = Project::empty();
    let session = project.session_name("idem-replay");
    project.tmux_new_session(&session);

    let first = project
        .amux()
        .args(&["--json", "agent", "send", "--session", &session, "--text", "echo idem", "--idempotency-key", "replay-key-1"])
        .passes();
    let second = project
        .amux()
        .args(&["--json", "agent", "send", "--session", &session, "--text", "echo idem", "--idempotency-key", "replay-key-1"])
        .passes();

    assert_eq!(first.stdout(), second.stdout(), "replayed stdout must match the original exactly, including whitespace and field order");
    assert_eq!(first.code(), second.code());

    project.tmux_kill_session(&session);
}

#[test]
fn replay_key_is_scoped_to_the_command() {
    require_tmux!();
    let project = Project::empty();
    let session = project.session_name("idem-scope");
    project.tmux_new_session(&session);

    let send = project
        .amux()
        .args(&["--json", "agent", "send", "--session", &session, "--text", "echo once", "--idempotency-key", "shared-key"])
        .passes();
    let job_id = send.json()["data"]["id"].as_str().unwrap().to_string();

    let cancel = project.amux().args(&["--json", "agent", "job", "cancel", &job_id, "--idempotency-key", "shared-key"]).passes();

    assert_ne!(send.stdout(), cancel.stdout(), "a different command path must not replay another command's entry");

    project.tmux_kill_session(&session);
}

#[test]
fn idempotency_key_in_human_mode_is_a_usage_error() {
    let project = Project::empty();
    let run = project.amux().args(&["session", "prune", "--yes", "--idempotency-key", "k1"]).fails();
    assert_eq!(run.code(), Some(2));
}
