// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! amux-engine: the stateful driver layer. Wires `amux-core`'s pure
//! domain types to `amux-adapters`' `BackendGateway` and owns the
//! on-disk state files (idempotency store, send-job queue).

pub mod env;
pub mod error;
pub mod idempotency;
pub mod poller;
pub mod prune;
pub mod queue;
pub mod registry;
pub mod watcher;
pub mod workspaces;

pub use env::{state_dir, terminal_shell};
pub use error::EngineError;
pub use idempotency::{default_idempotency_path, IdempotencyStore};
pub use poller::{Poller, Tick};
pub use prune::{prune_rows, run_prune, PruneOutcome};
pub use queue::{validate_transition, JobQueue, QueueLock, DEFAULT_RETENTION, DEFAULT_STALE_AFTER};
pub use registry::query_session_rows;
pub use watcher::{DoneReason, PaneEvent, PaneWatcher, WatchConfig};
pub use workspaces::list_workspace_ids;
