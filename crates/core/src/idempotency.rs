// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency entry data model. The store itself (file I/O, locking)
//! lives in `amux-engine`; this module only carries the pure type so both
//! the engine and the CLI can share it without an I/O dependency.

use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// Default time-to-live for idempotency entries: 7 days.
pub const DEFAULT_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdempotencyEntry {
    pub command: String,
    pub key: String,
    pub exit_code: i32,
    /// The exact bytes the original invocation wrote to stdout (the full
    /// rendered envelope, trailing newline included) stored and replayed
    /// verbatim, so a replay is byte-for-byte identical to the original
    /// response rather than a re-serialization of its data.
    pub body: String,
    pub created_at: i64,
}

impl IdempotencyEntry {
    pub fn is_expired(&self, now: i64, ttl_seconds: i64) -> bool {
        now.saturating_sub(self.created_at) > ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_not_expired_within_ttl() {
        let e = IdempotencyEntry {
            command: "agent.run".to_string(),
            key: "idem-1".to_string(),
            exit_code: 0,
            body: "{\"ok\":true}\n".to_string(),
            created_at: 1000,
        };
        assert!(!e.is_expired(1000 + DEFAULT_TTL_SECONDS - 1, DEFAULT_TTL_SECONDS));
    }

    #[test]
    fn entry_expired_past_ttl() {
        let e = IdempotencyEntry {
            command: "agent.run".to_string(),
            key: "idem-1".to_string(),
            exit_code: 0,
            body: "{\"ok\":true}\n".to_string(),
            created_at: 1000,
        };
        assert!(e.is_expired(1000 + DEFAULT_TTL_SECONDS + 1, DEFAULT_TTL_SECONDS));
    }
}
