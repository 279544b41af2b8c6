// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-adapters: the Backend Gateway (C1) — a narrow, testable surface
//! over the terminal-multiplexer backend.

pub mod backend;
mod traced;

pub use backend::{set_timeout_override, BackendError, BackendGateway, CallOptions, CaptureResult, RawSession, TimeoutOverrideGuard};
pub use backend::tmux::TmuxGateway;
pub use traced::TracedBackend;

#[cfg(any(test, feature = "test-support"))]
pub use backend::fake::{BackendCall, FakeBackend, FakeSession};
