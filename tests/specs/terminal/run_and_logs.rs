//! End-to-end `terminal run`/`terminal logs` against a real tmux server.

use crate::prelude::*;

#[test]
fn run_without_create_on_missing_session_is_not_found() {
    require_tmux!();
    let project = Project::empty();
    let workspace = project.session_name("missing");
    let run = project
        .amux()
        .args(&["--json", "terminal", "run", "--workspace", &workspace, "--text", "echo hi"])
        .fails();
    assert_eq!(run.code(), Some(3));
    assert_eq!(run.json()["error"]["code"], "not_found");
}

#[test]
fn run_with_create_spawns_tagged_session_and_sends_text() {
    require_tmux!();
    let project = Project::empty();
    let workspace = project.session_name("ws1");

    let run = project
        .amux()
        .args(&["--json", "terminal", "run", "--workspace", &workspace, "--create=true", "--enter=true", "--text", "echo hello"])
        .passes();
    let data = run.json();
    let session_name = data["data"]["session"].as_str().unwrap().to_string();
    assert!(project.tmux_session_exists(&session_name));

    let ok = wait_for(SPEC_WAIT_MAX_MS, || {
        project.amux().args(&["--json", "terminal", "logs", "--workspace", &workspace]).passes().json()["data"]["content"].as_str().unwrap_or("").contains("hello")
    });
    assert!(ok, "expected captured pane output to contain the sent text");

    project.tmux_kill_session(&session_name);
}

#[test]
fn logs_one_shot_errors_when_session_missing() {
    require_tmux!();
    let project = Project::empty();
    let workspace = project.session_name("never-created");
    let run = project.amux().args(&["--json", "terminal", "logs", "--workspace", &workspace]).fails();
    assert_eq!(run.json()["error"]["code"], "capture_failed");
}

#[test]
fn logs_follow_emits_done_when_session_exits() {
    require_tmux!();
    let project = Project::empty();
    let workspace = project.session_name("follow-ws");
    let session = format!("amux-{workspace}-terminal");
    project.tmux_new_session(&session);

    // Kill the session shortly after starting `logs --follow` so the
    // watcher observes a real session exit and terminates on its own.
    let killer_session = session.clone();
    let killer = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(300));
        let _ = std::process::Command::new("tmux").args(["kill-session", "-t", &killer_session]).status();
    });

    let run = project
        .amux()
        .args(&[
            "terminal",
            "logs",
            "--workspace",
            &workspace,
            "--follow",
            "--interval",
            "50ms",
            "--idle-threshold",
            "10s",
        ])
        .passes();

    killer.join().unwrap();

    let events: Vec<serde_json::Value> = run.stdout().lines().filter(|l| !l.trim().is_empty()).map(|l| serde_json::from_str(l).expect("each follow line is JSON")).collect();
    assert!(!events.is_empty(), "expected at least the terminal done event");
    let last = events.last().unwrap();
    assert_eq!(last["type"], "done");
    assert_eq!(last["reason"], "session_exited");
}
