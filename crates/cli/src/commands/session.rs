// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux session` — list and prune.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use amux_adapters::BackendGateway;
use amux_core::session::classify;
use amux_core::{format_age, SessionRow};
use amux_engine::{list_workspace_ids, prune_rows, PruneOutcome};

use crate::error::{from_engine_error, CliError};
use crate::render;

pub async fn list(backend: &impl BackendGateway, now: u64) -> Result<Vec<SessionRow>, CliError> {
    amux_engine::query_session_rows(backend)
        .await
        .map_err(|e| from_engine_error(e, "list_failed"))
        .map(|mut rows| {
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            let _ = now;
            rows
        })
}

/// Drives the full prune flow: resolve the valid-workspace set, derive
/// candidates, kill them. Refuses without `--yes` with an `unsafe_blocked`
/// error.
pub async fn prune(
    backend: &impl BackendGateway,
    workspaces_root: &Path,
    older_than: Option<Duration>,
    yes: bool,
    now: u64,
) -> Result<PruneOutcome, CliError> {
    if !yes {
        return Err(CliError::unsafe_blocked("session prune requires --yes to act destructively"));
    }

    let rows = amux_engine::query_session_rows(backend).await.map_err(|e| from_engine_error(e, "list_failed"))?;
    let valid: HashSet<String> = list_workspace_ids(workspaces_root).map_err(|e| from_engine_error(e, "list_failed"))?;
    let min_age = older_than.map(|d| d.as_secs()).unwrap_or(0);

    prune_rows(backend, &rows, &valid, min_age, now).await.map_err(|e| match &e {
        amux_engine::EngineError::PartialPruneFailure { failed_sessions, .. } => {
            let details = serde_json::json!({ "failed_sessions": failed_sessions });
            from_engine_error(e, "prune_partial_failed").with_details(details)
        }
        _ => from_engine_error(e, "list_failed"),
    })
}

pub fn print_rows(rows: &[SessionRow], colorize: bool) {
    if rows.is_empty() {
        println!("No sessions");
        return;
    }
    let now = crate::time::now_unix_u64();
    println!("{:<32} {:<12} {:<10} {:<6} {}", "NAME", "WORKSPACE", "TYPE", "AGE", "ATTACHED");
    for row in rows {
        let c = classify(row, now);
        let attached = if row.attached { render::green("yes", colorize) } else { "no".to_string() };
        println!(
            "{:<32} {:<12} {:<10} {:<6} {}",
            row.name,
            c.workspace_id,
            c.session_type.as_str(),
            format_age(c.age_seconds),
            attached
        );
    }
}

pub fn print_prune_outcome(outcome: &PruneOutcome, colorize: bool) {
    if outcome.killed.is_empty() {
        println!("No sessions pruned");
    }
    for candidate in &outcome.killed {
        println!("{} {} ({})", render::green("pruned", colorize), candidate.session_name, candidate.reason.as_str());
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
