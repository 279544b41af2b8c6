// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Send-Job Queue (C5): per-session FIFO of send-keys jobs, cross-process
//! locking, stale reaping, retention.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Duration;

use amux_core::job::{can_transition, compare_for_head};
use amux_core::{JobId, JobStatus, SendJob};
use fs2::FileExt;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EngineError;
use crate::poller::{Poller, Tick};

const SCHEMA_VERSION: u32 = 1;

/// Default stale cutoff: a `pending`/`running` job whose `updated_at` is
/// older than this is reaped as `failed`.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(15 * 60);
/// Default retention window for terminal jobs.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const BACKOFF_INITIAL: Duration = Duration::from_millis(20);
const BACKOFF_MAX: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    jobs: HashMap<String, SendJob>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            jobs: HashMap::new(),
        }
    }
}

/// A held per-session queue lock. Dropping it without calling
/// [`JobQueue::release_turn`] still releases the OS-level advisory lock
/// (file close does that for free), but callers should call
/// `release_turn` explicitly so the release is visible at the right point
/// in the state machine.
pub struct QueueLock {
    file: File,
    session: String,
}

pub struct JobQueue {
    state_path: PathBuf,
    lock_path: PathBuf,
    queue_lock_dir: PathBuf,
    stale_after: Duration,
    retention: Duration,
}

impl JobQueue {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            state_path: state_dir.join("jobs.json"),
            lock_path: state_dir.join("jobs.lock"),
            queue_lock_dir: state_dir.join("queue-locks"),
            stale_after: DEFAULT_STALE_AFTER,
            retention: DEFAULT_RETENTION,
        }
    }

    #[cfg(test)]
    pub fn with_stale_after(mut self, d: Duration) -> Self {
        self.stale_after = d;
        self
    }

    #[cfg(test)]
    pub fn with_retention(mut self, d: Duration) -> Self {
        self.retention = d;
        self
    }

    fn state_lock_file(&self) -> Result<File, EngineError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?)
    }

    fn queue_lock_path(&self, session: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(session.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        self.queue_lock_dir.join(format!("{}.lock", &digest[..16]))
    }

    fn load_raw(&self) -> Result<StateFile, EngineError> {
        if !self.state_path.exists() {
            return Ok(StateFile::default());
        }
        let file = File::open(&self.state_path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader::<_, StateFile>(reader) {
            Ok(state) if state.version == SCHEMA_VERSION => Ok(state),
            Ok(_) | Err(_) => {
                tracing::warn!(path = %self.state_path.display(), "corrupt or version-mismatched job state, starting fresh");
                let bak = self.state_path.with_extension("bak");
                let _ = fs::rename(&self.state_path, &bak);
                Ok(StateFile::default())
            }
        }
    }

    fn save_raw(&self, state: &StateFile) -> Result<(), EngineError> {
        let tmp_path = self.state_path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, state)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.state_path)?;
        Ok(())
    }

    /// Reaps stale `pending`/`running` jobs and loads under the
    /// state lock. Writes back only if reaping changed something.
    fn load_reconciled(&self, state_lock: &File, now: i64) -> Result<StateFile, EngineError> {
        let mut state = self.load_raw()?;
        let cutoff = now - self.stale_after.as_secs() as i64;
        let mut changed = false;
        for job in state.jobs.values_mut() {
            if !job.status.is_terminal() && job.updated_at < cutoff {
                job.set_status(
                    JobStatus::Failed,
                    Some("stale: processor may have exited".to_string()),
                    now,
                );
                changed = true;
            }
        }
        if changed {
            self.save_raw(&state)?;
        }
        let _ = state_lock;
        Ok(state)
    }

    /// Allocates a new job with a time-encoded id prefix and 6 random
    /// bytes, sequence strictly greater than any observed.
    /// Opportunistically prunes terminal jobs past the retention window.
    pub fn create(&self, session: &str, agent: Option<String>, now: i64) -> Result<SendJob, EngineError> {
        let state_lock = self.state_lock_file()?;
        state_lock.lock_exclusive()?;
        let mut state = self.load_reconciled(&state_lock, now)?;

        let retention_cutoff = now - self.retention.as_secs() as i64;
        state
            .jobs
            .retain(|_, j| !(j.status.is_terminal() && j.completed_at.map(|t| t < retention_cutoff).unwrap_or(false)));

        let max_sequence = state.jobs.values().map(|j| j.sequence).max().unwrap_or(0);
        let mut rand_bytes = [0u8; 6];
        rand::rng().fill_bytes(&mut rand_bytes);
        let id = JobId::new(format!("{now:x}-{}", hex_bytes(&rand_bytes)));

        let job = SendJob {
            id: id.clone(),
            command: "agent.send".to_string(),
            session: session.to_string(),
            agent,
            status: JobStatus::Pending,
            error: None,
            sequence: max_sequence + 1,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        state.jobs.insert(id.as_str().to_string(), job.clone());
        self.save_raw(&state)?;
        state_lock.unlock()?;
        Ok(job)
    }

    pub fn get(&self, id: &JobId, now: i64) -> Result<Option<SendJob>, EngineError> {
        let state_lock = self.state_lock_file()?;
        state_lock.lock_shared()?;
        let state = self.load_reconciled(&state_lock, now)?;
        state_lock.unlock()?;
        Ok(state.jobs.get(id.as_str()).cloned())
    }

    /// Only transitions from `pending`; returns `cancelled=false` if
    /// already running/terminal.
    pub fn cancel(&self, id: &JobId, now: i64) -> Result<(Option<SendJob>, bool), EngineError> {
        let state_lock = self.state_lock_file()?;
        state_lock.lock_exclusive()?;
        let mut state = self.load_reconciled(&state_lock, now)?;

        let Some(job) = state.jobs.get_mut(id.as_str()) else {
            state_lock.unlock()?;
            return Ok((None, false));
        };
        let was_pending = job.status == JobStatus::Pending;
        if was_pending {
            job.set_status(JobStatus::Canceled, None, now);
        }
        let job = job.clone();
        self.save_raw(&state)?;
        state_lock.unlock()?;
        Ok((Some(job), was_pending))
    }

    pub fn set_status(&self, id: &JobId, to: JobStatus, error: Option<String>, now: i64) -> Result<SendJob, EngineError> {
        let state_lock = self.state_lock_file()?;
        state_lock.lock_exclusive()?;
        let mut state = self.load_reconciled(&state_lock, now)?;

        let job = state
            .jobs
            .get_mut(id.as_str())
            .ok_or_else(|| EngineError::JobNotFound(id.as_str().to_string()))?;
        job.set_status(to, error, now);
        let job = job.clone();
        self.save_raw(&state)?;
        state_lock.unlock()?;
        Ok(job)
    }

    /// FIFO handoff: acquire the per-session queue lock, briefly take the
    /// state lock to check head-of-line, release the state lock, and
    /// either proceed or drop the queue lock and back off.
    pub async fn wait_turn(&self, session: &str, job_id: &JobId, now_fn: impl Fn() -> i64) -> Result<QueueLock, EngineError> {
        fs::create_dir_all(&self.queue_lock_dir)?;
        let timeout = Duration::from_secs(2 * self.stale_after.as_secs());
        let mut poller = Poller::with_doubling_backoff(BACKOFF_INITIAL, BACKOFF_MAX, Some(timeout));

        loop {
            let path = self.queue_lock_path(session);
            let queue_file = File::options().read(true).write(true).create(true).truncate(false).open(&path)?;
            queue_file.lock_exclusive()?;

            let now = now_fn();
            let state_lock = self.state_lock_file()?;
            state_lock.lock_exclusive()?;
            let state = self.load_reconciled(&state_lock, now)?;
            state_lock.unlock()?;

            let Some(job) = state.jobs.get(job_id.as_str()) else {
                // Job is gone (cancelled or already serviced): proceed,
                // caller will discover this via `get`.
                return Ok(QueueLock {
                    file: queue_file,
                    session: session.to_string(),
                });
            };
            if !matches!(job.status, JobStatus::Pending | JobStatus::Running) {
                return Ok(QueueLock {
                    file: queue_file,
                    session: session.to_string(),
                });
            }

            let mut session_jobs: Vec<&SendJob> = state
                .jobs
                .values()
                .filter(|j| j.session == session && matches!(j.status, JobStatus::Pending | JobStatus::Running))
                .collect();
            session_jobs.sort_by(|a, b| compare_for_head(a, b));

            let is_head = session_jobs.first().map(|h| h.id == job.id).unwrap_or(false);
            if is_head {
                return Ok(QueueLock {
                    file: queue_file,
                    session: session.to_string(),
                });
            }

            queue_file.unlock()?;
            drop(queue_file);

            match poller.tick().await {
                Tick::Ready => continue,
                Tick::Timeout => return Err(EngineError::QueueTimeout),
                Tick::Interrupted => return Err(EngineError::Cancelled),
            }
        }
    }

    pub fn release_turn(&self, lock: QueueLock) -> Result<(), EngineError> {
        tracing::trace!(session = %lock.session, "queue lock released");
        lock.file.unlock()?;
        Ok(())
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Pure helper exposed for callers that want the transition table without
/// going through [`JobQueue::set_status`] (e.g. dry-run validation).
pub fn validate_transition(from: JobStatus, to: JobStatus) -> bool {
    can_transition(from, to)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
