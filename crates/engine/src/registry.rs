// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Registry (C2): builds [`SessionRow`]s from a backend.

use amux_adapters::{BackendGateway, CallOptions};
use amux_core::SessionRow;

use crate::error::EngineError;

const AMUX_TAG_KEYS: &[&str] = &["@amux_workspace", "@amux_type", "@amux_created_at"];

/// Queries the backend and joins its tags: they come back already merged
/// with `session_attached`/`session_created` in
/// [`amux_adapters::RawSession::tags`] (C1 issues the two canonical calls
/// internally); this is the pure-ish join step that turns that raw map
/// into a typed [`SessionRow`].
///
/// This function's only parameter is `impl BackendGateway`, which keeps it
/// an injection point any fake/real gateway substitutes into directly, no
/// separate trait needed.
pub async fn query_session_rows(backend: &impl BackendGateway) -> Result<Vec<SessionRow>, EngineError> {
    let raw = backend
        .sessions_with_tags(AMUX_TAG_KEYS, CallOptions::default())
        .await?;

    Ok(raw
        .into_iter()
        .map(|r| {
            let attached = r
                .tags
                .get("session_attached")
                .is_some_and(|v| v != "0");
            let created_at = r
                .tags
                .get("@amux_created_at")
                .and_then(|v| v.parse::<u64>().ok())
                .or_else(|| r.tags.get("session_created").and_then(|v| v.parse::<u64>().ok()))
                .unwrap_or(0);
            SessionRow {
                name: r.name,
                tags: r.tags,
                attached,
                created_at,
            }
        })
        .collect())
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
