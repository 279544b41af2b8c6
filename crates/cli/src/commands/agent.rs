// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `amux agent send|job wait|job cancel` — the Send-Job Queue driver
//! wired to the backend's `send_keys`.

use std::time::Duration;

use amux_adapters::BackendGateway;
use amux_core::{JobId, JobStatus, SendJob};
use amux_engine::{JobQueue, Poller, Tick};

use crate::error::{from_engine_error, CliError};

/// Creates a job, waits for FIFO turn, sends, and records the outcome.
/// This is the synchronous (non-`--async`) flow: the job is left
/// `completed`/`failed` by the time this returns.
pub async fn send(
    backend: &impl BackendGateway,
    queue: &JobQueue,
    session: &str,
    agent: Option<String>,
    text: &str,
    send_enter: bool,
    now_fn: impl Fn() -> i64 + Copy,
) -> Result<SendJob, CliError> {
    let job = queue.create(session, agent, now_fn()).map_err(|e| from_engine_error(e, "send_failed"))?;

    let lock = queue
        .wait_turn(session, &job.id, now_fn)
        .await
        .map_err(|e| from_engine_error(e, "send_failed"))?;

    let job = queue
        .set_status(&job.id, JobStatus::Running, None, now_fn())
        .map_err(|e| from_engine_error(e, "send_failed"))?;

    let result = backend.send_keys(session, text, send_enter, Default::default()).await;

    let job = match result {
        Ok(()) => queue
            .set_status(&job.id, JobStatus::Completed, None, now_fn())
            .map_err(|e| from_engine_error(e, "send_failed"))?,
        Err(e) => {
            let job = queue
                .set_status(&job.id, JobStatus::Failed, Some(e.to_string()), now_fn())
                .map_err(|e| from_engine_error(e, "send_failed"))?;
            queue.release_turn(lock).map_err(|e| from_engine_error(e, "send_failed"))?;
            return Err(CliError::send_failed(e.to_string()));
        }
    };

    queue.release_turn(lock).map_err(|e| from_engine_error(e, "send_failed"))?;
    Ok(job)
}

/// Polls `queue.get` until the job reaches a terminal status or the
/// deadline/interrupt fires.
pub async fn job_wait(queue: &JobQueue, id: &JobId, timeout: Option<Duration>, interval: Duration, now_fn: impl Fn() -> i64) -> Result<SendJob, CliError> {
    let mut poller = Poller::new(interval, timeout);

    loop {
        let job = queue.get(id, now_fn()).map_err(|e| from_engine_error(e, "not_found"))?;
        if let Some(job) = job {
            if job.status.is_terminal() {
                return Ok(job);
            }
        } else {
            return Err(CliError::not_found(format!("job not found: {}", id.as_str())));
        }

        match poller.tick().await {
            Tick::Ready => continue,
            Tick::Timeout => return Err(CliError::timeout(format!("timed out waiting for job {}", id.as_str()))),
            Tick::Interrupted => return Err(CliError::new(amux_core::ErrorKind::Internal, "interrupted", "wait interrupted")),
        }
    }
}

/// Cancels a still-`pending` job; `cancelled=false` if it already moved
/// past pending — this is not itself an error.
pub async fn job_cancel(queue: &JobQueue, id: &JobId, now_fn: impl Fn() -> i64) -> Result<(Option<SendJob>, bool), CliError> {
    let (job, cancelled) = queue.cancel(id, now_fn()).map_err(|e| from_engine_error(e, "not_found"))?;
    if job.is_none() {
        return Err(CliError::not_found(format!("job not found: {}", id.as_str())));
    }
    Ok((job, cancelled))
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
