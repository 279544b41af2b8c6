// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prune Engine driver (C3): runs [`amux_core::prune::candidates_for_prune`]
//! against a live registry snapshot, then drives `kill_session` over the
//! results, collecting partial failures.

use std::collections::HashSet;

use amux_adapters::{BackendGateway, CallOptions};
use amux_core::prune::{candidates_for_prune, PruneCandidate};
use amux_core::SessionRow;
use serde::Serialize;

use crate::error::EngineError;

#[derive(Debug, Clone, Serialize)]
pub struct PruneOutcome {
    pub killed: Vec<PruneCandidate>,
    pub failed: Vec<(PruneCandidate, String)>,
}

/// Runs the kill loop over `candidates`, continuing even when individual
/// kills fail, and surfaces a partial-failure error when any did.
pub async fn run_prune(
    backend: &impl BackendGateway,
    candidates: Vec<PruneCandidate>,
) -> Result<PruneOutcome, EngineError> {
    let mut killed = Vec::new();
    let mut failed = Vec::new();

    for candidate in candidates {
        match backend
            .kill_session(&candidate.session_name, CallOptions::default())
            .await
        {
            Ok(()) => killed.push(candidate),
            Err(e) => failed.push((candidate, e.to_string())),
        }
    }

    if !failed.is_empty() {
        return Err(EngineError::PartialPruneFailure {
            failed_count: failed.len(),
            total_count: killed.len() + failed.len(),
            failed_sessions: failed.iter().map(|(c, _)| c.session_name.clone()).collect(),
        });
    }

    Ok(PruneOutcome { killed, failed })
}

/// Convenience wrapper: derives candidates from `rows` then prunes them.
pub async fn prune_rows(
    backend: &impl BackendGateway,
    rows: &[SessionRow],
    valid_workspaces: &HashSet<String>,
    min_age: u64,
    now: u64,
) -> Result<PruneOutcome, EngineError> {
    let candidates = candidates_for_prune(rows, valid_workspaces, min_age, now);
    run_prune(backend, candidates).await
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
