// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prune Engine decision table, pure.

use std::collections::HashSet;

use serde::Serialize;

use crate::session::{classify, is_amux_owned, SessionRow, SessionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PruneReason {
    OrphanedWorkspace,
    DetachedTerminal,
}

impl PruneReason {
    pub fn as_str(self) -> &'static str {
        match self {
            PruneReason::OrphanedWorkspace => "orphaned_workspace",
            PruneReason::DetachedTerminal => "detached_terminal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PruneCandidate {
    pub session_name: String,
    pub workspace_id: String,
    pub reason: PruneReason,
    pub age_seconds: u64,
}

/// Derives prune candidates from the decision table below.
///
/// `valid_workspaces` is the set V of currently-valid workspace ids.
/// `min_age` of 0 disables the age filter; rows with unknown creation
/// (`created_at == 0`) never satisfy a positive `min_age`.
pub fn candidates_for_prune(
    rows: &[SessionRow],
    valid_workspaces: &HashSet<String>,
    min_age: u64,
    now: u64,
) -> Vec<PruneCandidate> {
    rows.iter()
        .filter(|row| is_amux_owned(row))
        .filter_map(|row| {
            if min_age > 0 && (row.created_at == 0 || classify(row, now).age_seconds < min_age) {
                return None;
            }
            let c = classify(row, now);
            if row.attached {
                return None;
            }
            let ws_known_and_valid = !c.workspace_id.is_empty() && valid_workspaces.contains(&c.workspace_id);
            let ws_unknown = c.workspace_id.is_empty();
            let ws_orphaned = !c.workspace_id.is_empty() && !valid_workspaces.contains(&c.workspace_id);

            let reason = if ws_orphaned {
                PruneReason::OrphanedWorkspace
            } else if (ws_known_and_valid || ws_unknown)
                && matches!(c.session_type, SessionType::TermTab | SessionType::Terminal)
            {
                PruneReason::DetachedTerminal
            } else {
                return None;
            };

            Some(PruneCandidate {
                session_name: row.name.clone(),
                workspace_id: c.workspace_id,
                reason,
                age_seconds: c.age_seconds,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "prune_tests.rs"]
mod tests;
