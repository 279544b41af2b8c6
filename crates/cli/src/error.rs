// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-level error type: carries both the coarse [`ErrorKind`] the
//! exit-code table keys off and the specific envelope `code` string,
//! since those two are deliberately not the same vocabulary (codes are
//! per-operation, kinds are per-exit-code-class).

use amux_core::{ErrorKind, ErrorBody};
use amux_engine::EngineError;
use serde_json::Value;

use crate::globals::UsageError;

#[derive(Debug)]
pub struct CliError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl CliError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches structured detail to the error envelope (e.g. the list of
    /// sessions a partial prune failure couldn't kill).
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn usage_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, "usage_error", message)
    }

    pub fn unknown_command(path: &str) -> Self {
        Self::new(ErrorKind::Usage, "unknown_command", format!("unknown command: {path}"))
    }

    pub fn init_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, "init_failed", message)
    }

    pub fn list_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendCall, "list_failed", message)
    }

    pub fn session_lookup_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "session_lookup_failed", message)
    }

    pub fn session_create_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendCall, "session_create_failed", message)
    }

    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendCall, "send_failed", message)
    }

    pub fn capture_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BackendCall, "capture_failed", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, "not_found", message)
    }

    pub fn prune_partial_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PartialFailure, "prune_partial_failed", message)
    }

    pub fn dependency_missing(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dependency, "dependency_missing", message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, "timeout", message)
    }

    pub fn unsafe_blocked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsafeBlocked, "unsafe_blocked", message)
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.to_string(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code().as_i32()
    }
}

impl From<UsageError> for CliError {
    fn from(e: UsageError) -> Self {
        CliError::usage_error(e.to_string())
    }
}

/// Maps an [`EngineError`] into the command-appropriate envelope code;
/// the coarse [`ErrorKind`] comes from the engine, the specific `code`
/// string is chosen by the caller's operation context.
pub fn from_engine_error(e: EngineError, code: &'static str) -> CliError {
    CliError::new(e.kind(), code, e.to_string())
}
