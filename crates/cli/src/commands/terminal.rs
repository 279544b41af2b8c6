// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux terminal list|run|logs` — terminal-tab sessions and the Pane
//! Watcher.

use std::path::Path;
use std::time::Duration;

use amux_adapters::{BackendGateway, CallOptions};
use amux_core::session::{classify, SessionType};
use amux_core::SessionRow;
use amux_engine::{PaneEvent, PaneWatcher, WatchConfig};
use tokio_util::sync::CancellationToken;

use crate::error::{from_engine_error, CliError};

pub async fn list(backend: &impl BackendGateway, now: u64) -> Result<Vec<SessionRow>, CliError> {
    let rows = amux_engine::query_session_rows(backend).await.map_err(|e| from_engine_error(e, "list_failed"))?;
    let mut terminals: Vec<SessionRow> = rows
        .into_iter()
        .filter(|r| matches!(classify(r, now).session_type, SessionType::Terminal | SessionType::TermTab))
        .collect();
    terminals.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(terminals)
}

/// Finds an existing terminal session by name, or creates one when
/// `--create` is given and it does not yet exist, then sends `text`.
pub async fn run(
    backend: &impl BackendGateway,
    session: &str,
    workspace: &str,
    cwd: &Path,
    shell_command: &str,
    create: bool,
    text: Option<&str>,
    send_enter: bool,
) -> Result<(), CliError> {
    let existing = backend
        .sessions_with_tags(&["@amux_workspace"], CallOptions::default())
        .await
        .map_err(|e| CliError::send_failed(e.to_string()))?;
    let found = existing.iter().any(|r| r.name == session);

    if !found {
        if !create {
            return Err(CliError::not_found(format!("terminal session not found: {session}")));
        }
        backend
            .new_session(session, cwd, shell_command, CallOptions::default())
            .await
            .map_err(|e| CliError::session_create_failed(e.to_string()))?;
        backend
            .set_session_tag(session, "@amux_workspace", workspace, CallOptions::default())
            .await
            .map_err(|e| CliError::session_create_failed(e.to_string()))?;
        backend
            .set_session_tag(session, "@amux_type", "terminal", CallOptions::default())
            .await
            .map_err(|e| CliError::session_create_failed(e.to_string()))?;
    }

    if let Some(text) = text {
        backend
            .send_keys(session, text, send_enter, CallOptions::default())
            .await
            .map_err(|e| CliError::send_failed(e.to_string()))?;
    }

    Ok(())
}

/// One-shot tail capture (non-`--follow` path).
pub async fn logs_once(backend: &impl BackendGateway, session: &str, lines: u32) -> Result<String, CliError> {
    let result = backend
        .capture_pane_tail(session, lines, CallOptions::default())
        .await
        .map_err(|e| CliError::capture_failed(e.to_string()))?;
    if !result.ok {
        return Err(CliError::capture_failed(format!("capture failed for {session}")));
    }
    Ok(result.content)
}

/// Drives the Pane Watcher until it emits `done`, calling `sink` for
/// every event. `sink` is expected to print one JSON line per call;
/// framing is the caller's responsibility so tests can capture it.
pub async fn logs_follow(
    backend: &impl BackendGateway,
    session: &str,
    lines: u32,
    interval: Duration,
    idle_threshold: Duration,
    cancel: &CancellationToken,
    sink: impl FnMut(PaneEvent),
) -> Result<(), CliError> {
    let cfg = WatchConfig {
        session: session.to_string(),
        lines,
        interval,
        idle_threshold,
        ..Default::default()
    };
    PaneWatcher.run(backend, cfg, cancel, sink).await.map_err(|e| from_engine_error(e, "capture_failed"))
}

#[cfg(test)]
#[path = "terminal_tests.rs"]
mod tests;
