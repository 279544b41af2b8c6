// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Send-Job type, state machine, and FIFO comparator.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::define_id;

define_id! {
    /// Unique token identifying a [`SendJob`].
    pub struct JobId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

/// The job state transition table. `pending -> running -> completed |
/// failed`; `pending -> canceled`; `running -> failed`. Terminal states
/// never transition (including to themselves).
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Pending, Running) | (Pending, Canceled) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendJob {
    pub id: JobId,
    /// Always `agent.send`.
    pub command: String,
    pub session: String,
    pub agent: Option<String>,
    pub status: JobStatus,
    pub error: Option<String>,
    pub sequence: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub completed_at: Option<i64>,
}

impl SendJob {
    /// Applies `setStatus`, guarded by [`can_transition`]. From a terminal
    /// state this is a silent no-op: the job is returned unchanged rather
    /// than erroring.
    pub fn set_status(&mut self, to: JobStatus, error: Option<String>, now: i64) {
        if !can_transition(self.status, to) {
            return;
        }
        self.status = to;
        self.error = error;
        self.updated_at = now;
        if to.is_terminal() {
            self.completed_at = Some(now);
        }
    }
}

/// The single source of ordering truth for the FIFO queue: running ranks
/// before non-running, then lowest `created_at`, then lowest `sequence`
/// when both are positive and differ, then lexicographic `id`.
pub fn compare_for_head(a: &SendJob, b: &SendJob) -> Ordering {
    let a_running = a.status == JobStatus::Running;
    let b_running = b.status == JobStatus::Running;
    if a_running != b_running {
        return if a_running { Ordering::Less } else { Ordering::Greater };
    }
    match a.created_at.cmp(&b.created_at) {
        Ordering::Equal => {}
        other => return other,
    }
    if a.sequence > 0 && b.sequence > 0 && a.sequence != b.sequence {
        return a.sequence.cmp(&b.sequence);
    }
    a.id.as_str().cmp(b.id.as_str())
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
