// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human/JSON output rendering. Color policy follows `NO_COLOR=1`
//! (disables), `COLOR=1` (forces), else a TTY check, with the CLI's own
//! `--no-color` global flag taking priority over all of it.

use std::io::IsTerminal;

use amux_core::{Envelope, ResponseContext};
use serde::Serialize;

use crate::error::CliError;

const RESET: &str = "\x1b[0m";

pub fn should_colorize(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

pub fn green(text: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[32m{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn yellow(text: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[33m{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn red(text: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[31m{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Prints a success envelope in JSON mode, or `render_human(data)` in human
/// mode; returns the process exit code (always 0 for `ok`). `captured`, if
/// given, receives the exact bytes written to stdout in JSON mode — the
/// idempotency store replays these verbatim rather than re-deriving them.
pub fn emit_ok<T: Serialize>(json: bool, quiet: bool, data: T, ctx: &ResponseContext, render_human: impl FnOnce(&T), captured: &mut Option<String>) -> i32 {
    if json {
        let envelope = Envelope::ok(data, ctx);
        let line = envelope.to_json_line();
        *captured = Some(line.clone());
        print!("{line}");
    } else if !quiet {
        render_human(&data);
    }
    0
}

/// Prints an error envelope in JSON mode, or `Error: <message>` to stderr
/// in human mode; returns the error's mapped exit code. See [`emit_ok`]
/// for `captured`.
pub fn emit_err(json: bool, err: &CliError, ctx: &ResponseContext, captured: &mut Option<String>) -> i32 {
    if json {
        let envelope: Envelope<()> = Envelope::err(err.to_error_body(), ctx);
        let line = envelope.to_json_line();
        *captured = Some(line.clone());
        print!("{line}");
    } else {
        eprintln!("Error: {}", err.message);
    }
    err.exit_code()
}
