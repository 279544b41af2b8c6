// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global-Flag Extractor (C8): a pure, hand-rolled scan over argv.
//! Deliberately not built on a general-purpose flag-parsing crate — the
//! command surface is small and fixed, and the "remainder-consuming local
//! flag" concept needs control clap-style parsers don't expose directly.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    #[error("missing value for --{flag}")]
    MissingValue { flag: String },
    #[error("--{flag} value must not be empty")]
    EmptyValue { flag: String },
    #[error("invalid duration for --{flag}: {value}")]
    InvalidDuration { flag: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFlags {
    pub json: bool,
    pub no_color: bool,
    pub quiet: bool,
    pub cwd: Option<String>,
    pub timeout: Option<Duration>,
    pub request_id: Option<String>,
}

/// Names the local value-taking flags for one command path, and which one
/// (if any) consumes the rest of argv verbatim once seen.
pub struct LocalFlagSpec {
    pub value_flags: &'static [&'static str],
    pub remainder_consumer: Option<&'static str>,
}

/// Data-driven command-path -> local-flag-shape table: adding a command
/// means adding a row here, not branching in the scanner.
pub static LOCAL_FLAG_TABLE: &[(&[&str], LocalFlagSpec)] = &[
    (
        &["session", "list"],
        LocalFlagSpec {
            value_flags: &[],
            remainder_consumer: None,
        },
    ),
    (
        &["session", "prune"],
        LocalFlagSpec {
            value_flags: &["--older-than", "--idempotency-key"],
            remainder_consumer: None,
        },
    ),
    (
        &["agent", "send"],
        LocalFlagSpec {
            value_flags: &["--session", "--agent", "--text", "--enter", "--idempotency-key"],
            remainder_consumer: None,
        },
    ),
    (
        &["agent", "job", "wait"],
        LocalFlagSpec {
            value_flags: &["--timeout", "--interval"],
            remainder_consumer: None,
        },
    ),
    (
        &["agent", "job", "cancel"],
        LocalFlagSpec {
            value_flags: &["--idempotency-key"],
            remainder_consumer: None,
        },
    ),
    (
        &["terminal", "list"],
        LocalFlagSpec {
            value_flags: &[],
            remainder_consumer: None,
        },
    ),
    (
        &["terminal", "run"],
        LocalFlagSpec {
            value_flags: &["--workspace", "--text", "--enter", "--create", "--idempotency-key"],
            remainder_consumer: Some("--text"),
        },
    ),
    (
        &["terminal", "logs"],
        LocalFlagSpec {
            value_flags: &["--workspace", "--lines", "--interval", "--idle-threshold"],
            remainder_consumer: None,
        },
    ),
];

fn flag_name(token: &str) -> &str {
    token.split('=').next().unwrap_or(token)
}

fn inline_value(token: &str) -> Option<&str> {
    token.split_once('=').map(|(_, v)| v)
}

fn parse_duration(s: &str) -> Option<Duration> {
    let split_at = s.find(|c: char| !c.is_ascii_digit())?;
    let (num, unit) = s.split_at(split_at);
    if num.is_empty() {
        return None;
    }
    let n: u64 = num.parse().ok()?;
    match unit {
        "ms" => Some(Duration::from_millis(n)),
        "s" => Some(Duration::from_secs(n)),
        "m" => Some(Duration::from_secs(n * 60)),
        "h" => Some(Duration::from_secs(n * 3600)),
        _ => None,
    }
}

fn lookup_entry(path: &[String]) -> Option<&'static LocalFlagSpec> {
    LOCAL_FLAG_TABLE.iter().find(|(key, _)| key.len() == path.len() && key.iter().zip(path.iter()).all(|(a, b)| a == b)).map(|(_, spec)| spec)
}

/// Looks up a command path's [`LocalFlagSpec`] by borrowed string slices,
/// for callers (the router) that already have the path as `&[&str]`.
pub fn local_flag_spec(path: &[&str]) -> Option<&'static LocalFlagSpec> {
    LOCAL_FLAG_TABLE.iter().find(|(key, _)| key.len() == path.len() && key.iter().zip(path.iter()).all(|(a, b)| a == b)).map(|(_, spec)| spec)
}

/// Scans `argv` (already stripped of the binary name) left to right,
/// extracting global flags and the data-driven local-flag shape, and
/// returns everything else verbatim for the command-local parser.
pub fn extract_globals(argv: &[String]) -> Result<(GlobalFlags, Vec<String>), UsageError> {
    let mut globals = GlobalFlags::default();
    let mut rest = Vec::with_capacity(argv.len());
    let mut path: Vec<String> = Vec::with_capacity(3);
    let mut i = 0;
    let mut remainder_mode = false;

    while i < argv.len() {
        let token = &argv[i];

        if remainder_mode {
            rest.push(token.clone());
            i += 1;
            continue;
        }

        if !token.starts_with('-') {
            if path.len() < 3 {
                path.push(token.clone());
            }
            rest.push(token.clone());
            i += 1;
            continue;
        }

        let name = flag_name(token);

        if let Some(spec) = lookup_entry(&path) {
            if spec.value_flags.contains(&name) {
                rest.push(token.clone());
                if spec.remainder_consumer == Some(name) {
                    remainder_mode = true;
                } else if inline_value(token).is_none() {
                    match argv.get(i + 1) {
                        Some(value) => {
                            rest.push(value.clone());
                            i += 1;
                        }
                        None => return Err(UsageError::MissingValue { flag: name.trim_start_matches('-').to_string() }),
                    }
                }
                i += 1;
                continue;
            }
        }

        match name {
            "--json" => {
                globals.json = true;
                i += 1;
            }
            "--no-color" => {
                globals.no_color = true;
                i += 1;
            }
            "--quiet" | "-q" => {
                globals.quiet = true;
                i += 1;
            }
            "--cwd" => {
                let (value, consumed) = take_value(argv, i, token, "cwd")?;
                if value.is_empty() {
                    return Err(UsageError::EmptyValue { flag: "cwd".to_string() });
                }
                globals.cwd = Some(value);
                i += consumed;
            }
            "--timeout" => {
                let (value, consumed) = take_value(argv, i, token, "timeout")?;
                let duration = parse_duration(&value).ok_or_else(|| UsageError::InvalidDuration {
                    flag: "timeout".to_string(),
                    value: value.clone(),
                })?;
                globals.timeout = Some(duration);
                i += consumed;
            }
            "--request-id" => {
                let (value, consumed) = take_value(argv, i, token, "request-id")?;
                globals.request_id = Some(value);
                i += consumed;
            }
            _ => {
                rest.push(token.clone());
                i += 1;
            }
        }
    }

    Ok((globals, rest))
}

/// Resolves a value-taking global's value, either inline (`--flag=value`)
/// or from the next token, returning how many argv slots were consumed.
fn take_value(argv: &[String], i: usize, token: &str, flag: &str) -> Result<(String, usize), UsageError> {
    if let Some(value) = inline_value(token) {
        return Ok((value.to_string(), 1));
    }
    match argv.get(i + 1) {
        Some(value) => Ok((value.clone(), 2)),
        None => Err(UsageError::MissingValue { flag: flag.to_string() }),
    }
}

#[cfg(test)]
#[path = "globals_tests.rs"]
mod tests;
