// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock access, centralized so command handlers never call
//! `SystemTime::now()` directly (keeps the call sites greppable and the
//! unit conversions in one place).

use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

pub fn now_unix_u64() -> u64 {
    now_unix().max(0) as u64
}
