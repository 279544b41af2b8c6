// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Backend Gateway trait and its implementations.

pub mod tmux;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A session as returned by [`BackendGateway::sessions_with_tags`], before
/// the Session Registry (C2, in `amux-engine`) joins it against intrinsic
/// attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSession {
    pub name: String,
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureResult {
    pub content: String,
    pub ok: bool,
}

/// Per-call options bag: every operation accepts a bounded timeout,
/// inherited from a process-wide override unless set explicitly.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions {
    pub timeout: Option<Duration>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: TIMEOUT_OVERRIDE.with(|c| c.get()),
        }
    }
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

thread_local! {
    static TIMEOUT_OVERRIDE: std::cell::Cell<Option<Duration>> = const { std::cell::Cell::new(None) };
}

/// Installs the process-wide timeout override picked up by every
/// subsequent `CallOptions::default()` on this thread, for the lifetime of
/// the returned guard. Mirrors `amux_core::ResponseContext`'s scoped,
/// drop-clearing handle rather than a bare global.
pub fn set_timeout_override(timeout: Option<Duration>) -> TimeoutOverrideGuard {
    TIMEOUT_OVERRIDE.with(|c| c.set(timeout));
    TimeoutOverrideGuard { _private: () }
}

#[must_use = "dropping this immediately clears the timeout override"]
pub struct TimeoutOverrideGuard {
    _private: (),
}

impl Drop for TimeoutOverrideGuard {
    fn drop(&mut self) {
        TIMEOUT_OVERRIDE.with(|c| c.set(None));
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend dependency unavailable: {0}")]
    Dependency(String),
    #[error("backend call timed out")]
    Timeout,
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("backend command failed: {0}")]
    CommandFailed(String),
}

/// Typed operations over the terminal-multiplexer backend.
///
/// `Clone + Send + Sync + 'static` so a single instance can be shared
/// across worker tasks and wrapped by [`crate::TracedBackend`].
#[async_trait]
pub trait BackendGateway: Clone + Send + Sync + 'static {
    async fn ensure_available(&self, opts: CallOptions) -> Result<(), BackendError>;

    async fn sessions_with_tags(
        &self,
        tag_keys: &[&str],
        opts: CallOptions,
    ) -> Result<Vec<RawSession>, BackendError>;

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError>;

    /// Best-effort termination; non-existence is not an error.
    async fn kill_session(&self, name: &str, opts: CallOptions) -> Result<(), BackendError>;

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        send_enter: bool,
        opts: CallOptions,
    ) -> Result<(), BackendError>;

    /// Backend errors produce `ok: false` rather than propagating.
    async fn capture_pane_tail(
        &self,
        name: &str,
        lines: u32,
        opts: CallOptions,
    ) -> Result<CaptureResult, BackendError>;

    async fn new_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError>;

    /// Deterministic composition of backend-safe names: join with `-`,
    /// strip characters outside `[A-Za-z0-9_-]`.
    fn session_name(parts: &[&str]) -> String
    where
        Self: Sized,
    {
        parts
            .iter()
            .map(|p| p.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-').collect::<String>())
            .collect::<Vec<_>>()
            .join("-")
    }
}
