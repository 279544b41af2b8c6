// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`BackendGateway`] double for engine/CLI unit tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BackendError, BackendGateway, CallOptions, CaptureResult, RawSession};

#[derive(Debug, Clone)]
pub enum BackendCall {
    EnsureAvailable,
    SessionsWithTags { tag_keys: Vec<String> },
    SetSessionTag { name: String, key: String, value: String },
    KillSession { name: String },
    SendKeys { name: String, text: String, send_enter: bool },
    CapturePaneTail { name: String, lines: u32 },
    NewSession { name: String, cwd: PathBuf, command: String },
}

#[derive(Debug, Clone, Default)]
pub struct FakeSession {
    pub tags: HashMap<String, String>,
    pub attached: bool,
    pub created_at: u64,
    pub alive: bool,
    pub captured: Vec<String>,
    pub capture_ok: bool,
}

struct FakeState {
    sessions: HashMap<String, FakeSession>,
    calls: Vec<BackendCall>,
    available: bool,
}

/// Fake backend gateway. Grounded on `FakeSessionAdapter`: records every
/// call and lets tests script session state without a real `tmux`.
#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                sessions: HashMap::new(),
                calls: Vec::new(),
                available: true,
            })),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().calls.clone()
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    pub fn insert_session(&self, name: &str, session: FakeSession) {
        self.inner.lock().sessions.insert(name.to_string(), session);
    }

    pub fn get_session(&self, name: &str) -> Option<FakeSession> {
        self.inner.lock().sessions.get(name).cloned()
    }

    pub fn set_captured(&self, name: &str, lines: Vec<String>, ok: bool) {
        if let Some(s) = self.inner.lock().sessions.get_mut(name) {
            s.captured = lines;
            s.capture_ok = ok;
        }
    }
}

#[async_trait]
impl BackendGateway for FakeBackend {
    async fn ensure_available(&self, _opts: CallOptions) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::EnsureAvailable);
        if inner.available {
            Ok(())
        } else {
            Err(BackendError::Dependency("fake backend unavailable".to_string()))
        }
    }

    async fn sessions_with_tags(
        &self,
        tag_keys: &[&str],
        _opts: CallOptions,
    ) -> Result<Vec<RawSession>, BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::SessionsWithTags {
            tag_keys: tag_keys.iter().map(|s| s.to_string()).collect(),
        });
        Ok(inner
            .sessions
            .iter()
            .filter(|(_, s)| s.alive)
            .map(|(name, s)| {
                let mut tags = s.tags.clone();
                tags.insert("session_attached".to_string(), if s.attached { "1".to_string() } else { "0".to_string() });
                tags.insert("session_created".to_string(), s.created_at.to_string());
                RawSession {
                    name: name.clone(),
                    tags,
                }
            })
            .collect())
    }

    async fn set_session_tag(
        &self,
        name: &str,
        key: &str,
        value: &str,
        _opts: CallOptions,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::SetSessionTag {
            name: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
        match inner.sessions.get_mut(name) {
            Some(s) => {
                s.tags.insert(key.to_string(), value.to_string());
                Ok(())
            }
            None => Err(BackendError::NotFound(name.to_string())),
        }
    }

    async fn kill_session(&self, name: &str, _opts: CallOptions) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::KillSession { name: name.to_string() });
        if let Some(s) = inner.sessions.get_mut(name) {
            s.alive = false;
        }
        Ok(())
    }

    async fn send_keys(
        &self,
        name: &str,
        text: &str,
        send_enter: bool,
        _opts: CallOptions,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::SendKeys {
            name: name.to_string(),
            text: text.to_string(),
            send_enter,
        });
        if !inner.sessions.contains_key(name) {
            return Err(BackendError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn capture_pane_tail(
        &self,
        name: &str,
        lines: u32,
        _opts: CallOptions,
    ) -> Result<CaptureResult, BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::CapturePaneTail {
            name: name.to_string(),
            lines,
        });
        match inner.sessions.get(name) {
            Some(s) => {
                let start = s.captured.len().saturating_sub(lines as usize);
                Ok(CaptureResult {
                    content: s.captured[start..].join("\n"),
                    ok: s.capture_ok,
                })
            }
            None => Ok(CaptureResult {
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
        _opts: CallOptions,
    ) -> Result<(), BackendError> {
        let mut inner = self.inner.lock();
        inner.calls.push(BackendCall::NewSession {
            name: name.to_string(),
            cwd: cwd.to_path_buf(),
            command: command.to_string(),
        });
        inner.sessions.insert(
            name.to_string(),
            FakeSession {
                alive: true,
                capture_ok: true,
                ..Default::default()
            },
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
