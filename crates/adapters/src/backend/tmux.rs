// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux-backed implementation of [`BackendGateway`].

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout as tokio_timeout;

use super::{BackendError, BackendGateway, CallOptions, CaptureResult, RawSession};

const DELIM: &str = "\u{1f}";

/// Shells out to the `tmux` binary via [`tokio::process::Command`].
#[derive(Clone, Default)]
pub struct TmuxGateway;

impl TmuxGateway {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str], opts: CallOptions) -> Result<std::process::Output, BackendError> {
        let fut = Command::new("tmux").args(args).output();
        let result = match opts.timeout {
            Some(d) => tokio_timeout(d, fut)
                .await
                .map_err(|_| BackendError::Timeout)?,
            None => fut.await,
        };
        result.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::Dependency(e.to_string())
            } else {
                BackendError::CommandFailed(e.to_string())
            }
        })
    }
}

#[async_trait]
impl BackendGateway for TmuxGateway {
    async fn ensure_available(&self, opts: CallOptions) -> Result<(), BackendError> {
        self.run(&["-V"], opts).await?;
        Ok(())
    }

    async fn sessions_with_tags(
        &self,
        tag_keys: &[&str],
        opts: CallOptions,
    ) -> Result<Vec<RawSession>, BackendError> {
        let mut fields = vec!["session_name".to_string(), "session_attached".to_string(), "session_created".to_string()];
        fields.extend(tag_keys.iter().map(|k| (*k).to_string()));

        let format = fields
            .iter()
            .map(|f| {
                if let Some(tag) = f.strip_prefix('@') {
                    format!("#{{@{tag}}}")
                } else {
                    format!("#{{{f}}}")
                }
            })
            .collect::<Vec<_>>()
            .join(DELIM);

        let output = self.run(&["list-sessions", "-F", &format], opts).await;
        let output = match output {
            Ok(o) => o,
            // No server running means no sessions, not a failure.
            Err(BackendError::CommandFailed(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        if !output.status.success() {
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut rows = Vec::new();
        for line in stdout.lines() {
            let parts: Vec<&str> = line.split(DELIM).collect();
            if parts.len() != fields.len() {
                continue;
            }
            let name = parts[0].to_string();
            let mut tags = HashMap::new();
            tags.insert("session_attached".to_string(), parts[1].to_string());
            tags.insert("session_created".to_string(), parts[2].to_string());
            for (key, value) in tag_keys.iter().zip(parts[3..].iter()) {
                tags.insert((*key).to_string(), (*value).to_string());
            }
            rows.push(RawSession { name, tags });
        }
        Ok(rows)
    }

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        let output = self
            .run(&["set-option", "-t", name, key, value], opts)
            .await?;
        if !output.status.success() {
            return Err(BackendError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn kill_session(&self, name: &str, opts: CallOptions) -> Result<(), BackendError> {
        let _ = self.run(&["kill-session", "-t", name], opts).await;
        Ok(())
    }

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        send_enter: bool,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        let output = self
            .run(&["send-keys", "-t", name, "-l", "--", text], opts)
            .await?;
        if !output.status.success() {
            return Err(BackendError::NotFound(name.to_string()));
        }
        if send_enter {
            let output = self.run(&["send-keys", "-t", name, "Enter"], opts).await?;
            if !output.status.success() {
                return Err(BackendError::NotFound(name.to_string()));
            }
        }
        Ok(())
    }

    async fn capture_pane_tail(
        &self,
        name: &str,
        lines: u32,
        opts: CallOptions,
    ) -> Result<CaptureResult, BackendError> {
        let start = format!("-{lines}");
        let result = self
            .run(&["capture-pane", "-t", name, "-p", "-S", &start], opts)
            .await;
        match result {
            Ok(output) if output.status.success() => Ok(CaptureResult {
                content: String::from_utf8_lossy(&output.stdout).to_string(),
                ok: true,
            }),
            _ => Ok(CaptureResult {
                content: String::new(),
                ok: false,
            }),
        }
    }

    async fn new_session(
        &self,
        name: &str,
        cwd: &Path,
        command: &str,
        opts: CallOptions,
    ) -> Result<(), BackendError> {
        let cwd_str = cwd.to_string_lossy();
        let output = self
            .run(
                &["new-session", "-d", "-s", name, "-c", &cwd_str, command],
                opts,
            )
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::CommandFailed(stderr.to_string()));
        }
        Ok(())
    }
}

/// Default per-call timeout when no process-wide override is active.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
