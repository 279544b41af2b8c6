//! End-to-end `agent send`/`agent job wait`/`agent job cancel` against a
//! real tmux server, covering the single-job send/wait/cancel slice; FIFO
//! ordering itself is covered by `amux-engine`'s queue unit tests.

use crate::prelude::*;

#[test]
fn send_to_existing_session_completes_the_job() {
    require_tmux!();
    let project = Project::empty();
    let session = project.session_name("agent-send");
    project.tmux_new_session(&session);

    let run = project.amux().args(&["--json", "agent", "send", "--session", &session, "--text", "echo from-agent", "--enter=true"]).passes();
    let job = run.json();
    assert_eq!(job["data"]["status"], "completed");
    let job_id = job["data"]["id"].as_str().unwrap().to_string();

    let wait = project.amux().args(&["--json", "agent", "job", "wait", &job_id, "--timeout", "1s"]).passes();
    assert_eq!(wait.json()["data"]["status"], "completed");

    project.tmux_kill_session(&session);
}

#[test]
fn send_to_missing_session_fails_the_job() {
    require_tmux!();
    let project = Project::empty();
    let workspace = project.session_name("no-such-session");

    let run = project.amux().args(&["--json", "agent", "send", "--session", &workspace, "--text", "echo hi"]).fails();
    assert_eq!(run.json()["error"]["code"], "send_failed");
}

#[test]
fn job_cancel_after_completion_is_not_an_error_and_reports_not_cancelled() {
    require_tmux!();
    let project = Project::empty();
    let session = project.session_name("agent-cancel");
    project.tmux_new_session(&session);

    let send = project.amux().args(&["--json", "agent", "send", "--session", &session, "--text", "echo done"]).passes();
    let job_id = send.json()["data"]["id"].as_str().unwrap().to_string();

    // The job is already `completed` by the time `agent send` returns
    // (this CLI's `send` is synchronous), so cancelling it afterward
    // is a no-op rather than an error — `pending`-job cancellation is
    // exercised at the unit level against a controllable fake backend
    // instead, since this CLI surface has no way to hold a job open
    // from outside the process.
    let cancel = project.amux().args(&["--json", "agent", "job", "cancel", &job_id]).passes();
    assert_eq!(cancel.json()["data"], false);

    project.tmux_kill_session(&session);
}
