// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency Store (C4): at-most-once replay of prior JSON responses,
//! keyed by (command, key), with a 7-day TTL.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use amux_core::idempotency::{IdempotencyEntry, DEFAULT_TTL_SECONDS, SCHEMA_VERSION};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::EngineError;

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    entries: HashMap<String, IdempotencyEntry>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Owns the idempotency state file and its sibling `.lock`.
pub struct IdempotencyStore {
    path: PathBuf,
    lock_path: PathBuf,
    ttl_seconds: i64,
}

impl IdempotencyStore {
    pub fn new(path: PathBuf) -> Self {
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }

    #[cfg(test)]
    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    /// SHA-256 of `command || \0 || key`, hex-encoded.
    pub fn entry_key(command: &str, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(command.as_bytes());
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn lock_file(&self) -> Result<File, EngineError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        Ok(file)
    }

    fn load(&self) -> Result<StateFile, EngineError> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, StateFile>(reader) {
            Ok(state) if state.version == SCHEMA_VERSION => Ok(state),
            Ok(_) | Err(_) => {
                warn!(path = %self.path.display(), "corrupt or version-mismatched idempotency state, starting fresh");
                let bak = self.path.with_extension("bak");
                let _ = fs::rename(&self.path, &bak);
                Ok(StateFile::default())
            }
        }
    }

    fn save(&self, state: &StateFile) -> Result<(), EngineError> {
        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, state)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Writes or replaces the entry, pruning expired entries. `body` is the
    /// exact rendered response the caller wrote to stdout, stored verbatim
    /// so replay can reproduce it byte-for-byte.
    pub fn store(&self, command: &str, key: &str, exit_code: i32, body: &str, now: i64) -> Result<(), EngineError> {
        let lock_file = self.lock_file()?;
        lock_file.lock_exclusive()?;

        let mut state = self.load()?;
        state.entries.retain(|_, e| !e.is_expired(now, self.ttl_seconds));
        state.entries.insert(
            Self::entry_key(command, key),
            IdempotencyEntry {
                command: command.to_string(),
                key: key.to_string(),
                exit_code,
                body: body.to_string(),
                created_at: now,
            },
        );
        let result = self.save(&state);
        lock_file.unlock()?;
        result
    }

    /// Returns no hit if absent, expired, or version-mismatched; expired
    /// entries are not pruned on the read path.
    pub fn try_replay(&self, command: &str, key: &str, now: i64) -> Result<Option<IdempotencyEntry>, EngineError> {
        let lock_file = self.lock_file()?;
        lock_file.lock_shared()?;

        let state = self.load()?;
        let entry = state
            .entries
            .get(&Self::entry_key(command, key))
            .filter(|e| !e.is_expired(now, self.ttl_seconds))
            .cloned();
        lock_file.unlock()?;
        Ok(entry)
    }
}

pub fn default_idempotency_path(state_dir: &Path) -> PathBuf {
    state_dir.join("idempotency.json")
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
