// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session rows and the pure classification helpers.

use std::collections::HashMap;

use serde::Serialize;

/// A session as enumerated from the backend, after C2's tag/intrinsic join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRow {
    pub name: String,
    pub tags: HashMap<String, String>,
    pub attached: bool,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Agent,
    TermTab,
    Terminal,
    Unknown,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Agent => "agent",
            SessionType::TermTab => "term-tab",
            SessionType::Terminal => "terminal",
            SessionType::Unknown => "unknown",
        }
    }
}

/// Derived fields for a [`SessionRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClassification {
    pub workspace_id: String,
    pub session_type: SessionType,
    pub age_seconds: u64,
}

const WORKSPACE_TAG: &str = "@amux_workspace";
const TYPE_TAG: &str = "@amux_type";

/// `isAmuxOwned(R) ⇔ (R.tags["@amux_workspace"] ≠ "" ∨ R.name starts with "amux-")`.
pub fn is_amux_owned(row: &SessionRow) -> bool {
    row.tags
        .get(WORKSPACE_TAG)
        .is_some_and(|v| !v.is_empty())
        || row.name.starts_with("amux-")
}

/// Workspace id inferred from a session name when no tag is present.
///
/// For `amux-<body>`, the body up to `-term-tab-` or `-tab-` (whichever
/// appears first with a non-empty prefix); else the entire body; else empty.
pub fn infer_workspace_id(name: &str) -> String {
    let Some(body) = name.strip_prefix("amux-") else {
        return String::new();
    };
    let term_tab_idx = body.find("-term-tab-").filter(|&i| i > 0);
    let tab_idx = body.find("-tab-").filter(|&i| i > 0);
    let cut = match (term_tab_idx, tab_idx) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    match cut {
        Some(i) => body[..i].to_string(),
        None => body.to_string(),
    }
}

/// Session type inferred from a session name when no tag is present.
pub fn infer_session_type(name: &str) -> SessionType {
    if name.contains("-term-tab-") {
        SessionType::TermTab
    } else if name.contains("-tab-") {
        SessionType::Agent
    } else {
        SessionType::Unknown
    }
}

/// Classifies a row: tags first, then name-based inference.
pub fn classify(row: &SessionRow, now: u64) -> SessionClassification {
    let workspace_id = row
        .tags
        .get(WORKSPACE_TAG)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| infer_workspace_id(&row.name));

    let session_type = match row.tags.get(TYPE_TAG).map(String::as_str) {
        Some("agent") => SessionType::Agent,
        Some("term-tab") => SessionType::TermTab,
        Some("terminal") => SessionType::Terminal,
        _ => infer_session_type(&row.name),
    };

    let age_seconds = if row.created_at == 0 {
        0
    } else {
        now.saturating_sub(row.created_at)
    };

    SessionClassification {
        workspace_id,
        session_type,
        age_seconds,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
