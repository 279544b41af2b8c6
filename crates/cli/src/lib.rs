// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-cli: the `amux` binary's library half — global-flag extraction,
//! command dispatch, and human/JSON rendering, kept separate from
//! `main.rs` so command handlers are unit-testable against a
//! [`amux_adapters::FakeBackend`] without a process boundary.

pub mod commands;
pub mod error;
pub mod globals;
pub mod render;
pub mod router;
pub mod time;

pub use error::CliError;
pub use globals::{extract_globals, GlobalFlags, UsageError};
pub use router::dispatch;
