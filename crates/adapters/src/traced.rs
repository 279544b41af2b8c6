// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adds `tracing` spans to any [`BackendGateway`] — every backend call
//! gets a span.

use std::path::Path;

use async_trait::async_trait;
use tracing::Instrument;

use crate::backend::{BackendError, BackendGateway, CallOptions, CaptureResult, RawSession};

#[derive(Clone)]
pub struct TracedBackend<B> {
    inner: B,
}

impl<B> TracedBackend<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<B: BackendGateway> BackendGateway for TracedBackend<B> {
    async fn ensure_available(&self, opts: CallOptions) -> Result<(), BackendError> {
        async {
            let result = self.inner.ensure_available(opts).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "dependency unavailable");
            }
            result
        }
        .instrument(tracing::info_span!("backend.ensure_available"))
        .await
    }

    async fn sessions_with_tags(
        &self,
        tag_keys: &[&str],
        opts: CallOptions,
    ) -> Result<Vec<RawSession>, BackendError> {
        async {
            let start = std::time::Instant::now();
            let result = self.inner.sessions_with_tags(tag_keys, opts).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(rows) => tracing::debug!(count = rows.len(), elapsed_ms, "listed sessions"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "list failed"),
            }
            result
        }
        .instrument(tracing::info_span!("backend.sessions_with_tags"))
        .await
    }

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        let result = self.inner.set_session_tag(name, key, value, opts).await;
        if let Err(ref e) = result {
            tracing::error!(name, key, error = %e, "set_session_tag failed");
        }
        result
    }

    async fn kill_session(&self, name: &str, opts: CallOptions) -> Result<(), BackendError> {
        let result = self.inner.kill_session(name, opts).await;
        tracing::info_span!("backend.kill_session", name).in_scope(|| match &result {
            Ok(()) => tracing::info!("killed"),
            Err(e) => tracing::warn!(error = %e, "kill failed (may be expected)"),
        });
        result
    }

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        send_enter: bool,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        async {
            tracing::debug!(text_len = text.len(), send_enter, "sending keys");
            let result = self.inner.send_keys(name, text, send_enter, opts).await;
            if let Err(ref e) = result {
                tracing::error!(error = %e, "send_keys failed");
            }
            result
        }
        .instrument(tracing::info_span!("backend.send_keys", name))
        .await
    }

    async fn capture_pane_tail(
        &self,
        name: &str,
        lines: u32,
        opts: CallOptions,
    ) -> Result<CaptureResult, BackendError> {
        let result = self.inner.capture_pane_tail(name, lines, opts).await;
        tracing::trace!(name, lines, ok = result.as_ref().map(|r| r.ok).unwrap_or(false), "captured");
        result
    }

    async fn new_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        async {
            tracing::info!(command, "creating session");
            let result = self.inner.new_session(name, cwd, command, opts).await;
            match &result {
                Ok(()) => tracing::info!("session created"),
                Err(e) => tracing::error!(error = %e, "new_session failed"),
            }
            result
        }
        .instrument(tracing::info_span!("backend.new_session", name, cwd = %cwd.display()))
        .await
    }
}
