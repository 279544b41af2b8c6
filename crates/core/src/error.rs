// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy. This is a taxonomy of *kinds*, not a single
//! error type: adapters/engine/cli each define their own `thiserror` enums
//! and map into an [`ErrorKind`] at their boundary so the envelope and the
//! exit-code table have one place to look.

use std::fmt;

/// Coarse classification used to pick an error `code` string for the
/// response envelope and an [`ExitCode`] for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad flags or missing values.
    Usage,
    /// Workspace/session/job missing.
    NotFound,
    /// Backend unavailable (binary not resolvable).
    Dependency,
    /// Non-zero/failed backend call.
    BackendCall,
    /// Local deadline exceeded.
    Timeout,
    /// Some items succeeded, some failed (e.g. prune).
    PartialFailure,
    /// Unexpected invariant violation.
    Internal,
    /// Refused to act destructively without confirmation.
    UnsafeBlocked,
}

impl ErrorKind {
    /// The exit code this kind maps to.
    pub fn exit_code(self) -> ExitCode {
        match self {
            ErrorKind::Usage => ExitCode::Usage,
            ErrorKind::NotFound => ExitCode::NotFound,
            ErrorKind::Dependency => ExitCode::DependencyMissing,
            ErrorKind::UnsafeBlocked => ExitCode::UnsafeBlocked,
            ErrorKind::BackendCall
            | ErrorKind::Timeout
            | ErrorKind::PartialFailure
            | ErrorKind::Internal => ExitCode::Internal,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Usage => "usage",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Dependency => "dependency",
            ErrorKind::BackendCall => "backend_call",
            ErrorKind::Timeout => "timeout",
            ErrorKind::PartialFailure => "partial_failure",
            ErrorKind::Internal => "internal",
            ErrorKind::UnsafeBlocked => "unsafe_blocked",
        };
        f.write_str(s)
    }
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    Usage = 2,
    NotFound = 3,
    DependencyMissing = 4,
    UnsafeBlocked = 5,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
