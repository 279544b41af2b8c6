//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing amux CLI behavior, grounded on
//! the teacher's `CliBuilder`/`Project` pattern but adapted to amux's
//! `AMUX_STATE_DIR`-scoped state and tmux-backed sessions.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use assert_cmd::cargo::CommandCargoExt;

pub const SPEC_WAIT_MAX_MS: u64 = 2000;
pub const SPEC_POLL_INTERVAL_MS: u64 = 20;

/// Is a real `tmux` binary on PATH? End-to-end scenarios that need a
/// live backend skip (rather than fail) when it isn't, since this
/// binary relies on `TmuxGateway` shelling out and nothing stands in
/// for that in the black-box suite.
pub fn tmux_available() -> bool {
    Command::new("tmux").arg("-V").output().map(|o| o.status.success()).unwrap_or(false)
}

macro_rules! require_tmux {
    () => {
        if !crate::prelude::tmux_available() {
            eprintln!("skipping: tmux not found on PATH");
            return;
        }
    };
}
pub(crate) use require_tmux;

fn amux_cmd() -> Command {
    Command::cargo_bin("amux").expect("amux binary should build")
}

pub fn amux() -> AmuxBuilder {
    AmuxBuilder::new()
}

/// Fluent builder for one `amux` invocation.
pub struct AmuxBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl AmuxBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: Vec::new(),
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((key.to_string(), value.as_ref().to_string_lossy().to_string()));
        self
    }

    /// Forces `tmux` to look like a missing dependency by handing the
    /// child an empty PATH — used for the `dependency_missing` scenario
    /// without requiring tmux to actually be absent from the host.
    pub fn without_tmux(mut self) -> Self {
        self.envs.push(("PATH".to_string(), "/nonexistent".to_string()));
        self
    }

    fn command(self) -> Command {
        let mut cmd = amux_cmd();
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        cmd.env_remove("AMUX_STATE_DIR");
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Runs without asserting on exit status, for callers that branch on it.
    pub fn run(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout().trim()).unwrap_or_else(|e| panic!("stdout is not valid JSON ({e}): {}", self.stdout()))
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

/// An isolated `AMUX_STATE_DIR` plus a disposable tmux session namespace,
/// so specs never collide with each other or with a developer's tmux.
pub struct Project {
    state_dir: tempfile::TempDir,
    session_prefix: String,
}

impl Project {
    pub fn empty() -> Self {
        let nanos = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            session_prefix: format!("amux-spec-{nanos:x}"),
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Runs `amux` with this project's isolated state directory.
    pub fn amux(&self) -> AmuxBuilder {
        amux().env("AMUX_STATE_DIR", self.state_path())
    }

    /// A session name scoped to this project, so parallel test runs
    /// never collide on a real tmux server.
    pub fn session_name(&self, suffix: &str) -> String {
        format!("{}-{}", self.session_prefix, suffix)
    }

    /// Creates a detached tmux session directly (bypassing amux), for
    /// scenarios that need a pre-existing session to act on.
    pub fn tmux_new_session(&self, name: &str) {
        let status = Command::new("tmux").args(["new-session", "-d", "-s", name]).status().expect("tmux new-session should run");
        assert!(status.success(), "tmux new-session failed for {name}");
    }

    pub fn tmux_set_tag(&self, session: &str, tag: &str, value: &str) {
        let status = Command::new("tmux").args(["set-option", "-t", session, tag, value]).status().expect("tmux set-option should run");
        assert!(status.success(), "tmux set-option {tag}={value} failed for {session}");
    }

    pub fn tmux_kill_session(&self, name: &str) {
        let _ = Command::new("tmux").args(["kill-session", "-t", name]).status();
    }

    pub fn tmux_session_exists(&self, name: &str) -> bool {
        Command::new("tmux").args(["has-session", "-t", name]).output().map(|o| o.status.success()).unwrap_or(false)
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let _ = Command::new("tmux").args(["kill-session", "-t"]).arg(&self.session_prefix).status();
    }
}
