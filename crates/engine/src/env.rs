// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.
//! Grounded on the teacher's `daemon::env` module.

use std::path::PathBuf;

use crate::error::EngineError;

/// Resolve the state directory: `AMUX_STATE_DIR` > `XDG_STATE_HOME/amux` >
/// `$HOME/.local/state/amux`. `HOME` is what determines the config
/// directory root used by the idempotency store and job queue.
pub fn state_dir() -> Result<PathBuf, EngineError> {
    if let Ok(dir) = std::env::var("AMUX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("amux"));
    }
    let home = std::env::var("HOME").map_err(|_| EngineError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/amux"))
}

/// The shell used for new terminal sessions: `SHELL` when set and
/// non-empty, else `sh`.
pub fn terminal_shell() -> String {
    std::env::var("SHELL").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "sh".to_string())
}
