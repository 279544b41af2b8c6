// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pane Watcher (C6): polls a tmux pane's tail and emits a normalized
//! event stream. Grounded on the teacher's `output::tail_file`
//! `tokio::select!` loop shape, adapted to poll `capture_pane_tail`
//! instead of watching a log file on disk.

use std::time::Duration;

use amux_adapters::{BackendGateway, CallOptions};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;

/// Configuration for a single watch loop.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub session: String,
    pub lines: u32,
    pub interval: Duration,
    pub idle_threshold: Duration,
    /// Consecutive capture failures tolerated before giving up.
    pub max_consecutive_failures: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            session: String::new(),
            lines: 200,
            interval: Duration::from_millis(500),
            idle_threshold: Duration::from_secs(5),
            max_consecutive_failures: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoneReason {
    SessionExited,
    Cancelled,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaneEvent {
    Line { text: String },
    Idle { elapsed_seconds: u64 },
    Error { message: String },
    Done { reason: DoneReason },
}

pub struct PaneWatcher;

impl PaneWatcher {
    /// Runs the tick loop until the session exits, a cancellation signal
    /// fires, or consecutive capture failures exceed the configured bound.
    /// `sink` is called synchronously for every emitted event so a single
    /// caller-owned writer controls stdout framing: one JSON object per
    /// line, flushed after every event.
    pub async fn run(
        &self,
        backend: &impl BackendGateway,
        cfg: WatchConfig,
        cancel: &CancellationToken,
        mut sink: impl FnMut(PaneEvent),
    ) -> Result<(), EngineError> {
        let mut last_lines: Vec<String> = Vec::new();
        let mut consecutive_failures = 0u32;
        let mut idle_since: Option<tokio::time::Instant> = None;
        let mut idle_emitted = false;

        if let Ok(result) = backend.capture_pane_tail(&cfg.session, cfg.lines, CallOptions::default()).await {
            if result.ok {
                last_lines = normalize_lines(&result.content);
            }
        }

        let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    sink(PaneEvent::Done { reason: DoneReason::Cancelled });
                    return Ok(());
                }
                _ = cancel.cancelled() => {
                    sink(PaneEvent::Done { reason: DoneReason::Cancelled });
                    return Ok(());
                }
                _ = tokio::time::sleep(cfg.interval) => {}
            }

            if !session_exists(backend, &cfg.session).await? {
                sink(PaneEvent::Done { reason: DoneReason::SessionExited });
                return Ok(());
            }

            let captured = backend.capture_pane_tail(&cfg.session, cfg.lines, CallOptions::default()).await;
            let result = match captured {
                Ok(result) if result.ok => result,
                Ok(_) | Err(_) => {
                    consecutive_failures += 1;
                    sink(PaneEvent::Error {
                        message: "pane capture failed".to_string(),
                    });
                    if consecutive_failures >= cfg.max_consecutive_failures {
                        sink(PaneEvent::Done { reason: DoneReason::Eof });
                        return Ok(());
                    }
                    continue;
                }
            };
            consecutive_failures = 0;

            let current_lines = normalize_lines(&result.content);
            let new_lines = append_since(&last_lines, &current_lines);

            if new_lines.is_empty() {
                let since = *idle_since.get_or_insert_with(tokio::time::Instant::now);
                if !idle_emitted && since.elapsed() >= cfg.idle_threshold {
                    sink(PaneEvent::Idle {
                        elapsed_seconds: since.elapsed().as_secs(),
                    });
                    idle_emitted = true;
                }
            } else {
                idle_since = None;
                idle_emitted = false;
                for line in new_lines {
                    sink(PaneEvent::Line { text: line });
                }
            }

            last_lines = current_lines;
        }
    }
}

async fn session_exists(backend: &impl BackendGateway, name: &str) -> Result<bool, EngineError> {
    let sessions = backend.sessions_with_tags(&[], CallOptions::default()).await?;
    Ok(sessions.iter().any(|s| s.name == name))
}

fn normalize_lines(content: &str) -> Vec<String> {
    content.lines().map(|l| l.trim_end().to_string()).collect()
}

/// Longest-common-prefix diff between the last observed lines and the
/// current capture, returning only the newly appended suffix. Tolerates
/// overwrites of in-progress lines at the boundary.
fn append_since(last: &[String], current: &[String]) -> Vec<String> {
    let prefix_len = last.iter().zip(current.iter()).take_while(|(a, b)| a == b).count();
    current[prefix_len..].to_vec()
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
