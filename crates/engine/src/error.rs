// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the stateful engine crate, mapping into
//! `amux_core::ErrorKind` at the boundary.

use amux_core::ErrorKind;
use amux_adapters::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("queue wait timed out")]
    QueueTimeout,
    #[error("cancelled by interrupt")]
    Cancelled,
    #[error("prune failed for {failed_count} of {total_count} sessions")]
    PartialPruneFailure {
        failed_count: usize,
        total_count: usize,
        failed_sessions: Vec<String>,
    },
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not resolve state directory (no HOME)")]
    NoStateDir,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Backend(BackendError::Timeout) => ErrorKind::Timeout,
            EngineError::Backend(BackendError::Dependency(_)) => ErrorKind::Dependency,
            EngineError::Backend(BackendError::NotFound(_)) => ErrorKind::NotFound,
            EngineError::Backend(BackendError::CommandFailed(_)) => ErrorKind::BackendCall,
            EngineError::JobNotFound(_) => ErrorKind::NotFound,
            EngineError::QueueTimeout => ErrorKind::Timeout,
            EngineError::Cancelled => ErrorKind::Internal,
            EngineError::PartialPruneFailure { .. } => ErrorKind::PartialFailure,
            EngineError::Io(_) | EngineError::Json(_) | EngineError::NoStateDir => ErrorKind::Internal,
        }
    }
}
