// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command Router (C9): resolves a command path out of `rest`, applies
//! `--cwd`/`--timeout`, seeds the [`ResponseContext`], checks the
//! Idempotency Store for JSON replay, dispatches, then records the result.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use amux_adapters::{set_timeout_override, BackendGateway, TmuxGateway, TracedBackend};
use amux_core::{JobId, ResponseContext};
use amux_engine::{default_idempotency_path, state_dir, terminal_shell, IdempotencyStore, JobQueue};
use tokio_util::sync::CancellationToken;

use crate::commands::{agent, session, terminal};
use crate::error::CliError;
use crate::globals::{local_flag_spec, GlobalFlags};
use crate::render;
use crate::time::{now_unix, now_unix_u64};

struct ParsedCommand {
    path: Vec<String>,
    positionals: Vec<String>,
    values: HashMap<String, String>,
    bools: HashSet<String>,
}

/// Re-derives the command path (same up-to-3-plain-word rule as
/// [`crate::globals::extract_globals`], minus global recognition since
/// globals are already stripped out of `rest`) and the command-local
/// flags/positionals in one left-to-right pass.
fn parse_rest(rest: &[String]) -> Result<ParsedCommand, CliError> {
    let mut path: Vec<String> = Vec::with_capacity(3);
    let mut positionals = Vec::new();
    let mut values = HashMap::new();
    let mut bools = HashSet::new();
    let mut i = 0;

    while i < rest.len() {
        let token = &rest[i];

        if !token.starts_with('-') {
            if path.len() < 3 {
                path.push(token.clone());
            } else {
                positionals.push(token.clone());
            }
            i += 1;
            continue;
        }

        let name = token.split('=').next().unwrap_or(token).to_string();
        let path_refs: Vec<&str> = path.iter().map(String::as_str).collect();

        if let Some(spec) = local_flag_spec(&path_refs) {
            if spec.value_flags.contains(&name.as_str()) {
                if spec.remainder_consumer == Some(name.as_str()) {
                    let mut parts = Vec::new();
                    if let Some((_, v)) = token.split_once('=') {
                        parts.push(v.to_string());
                    }
                    parts.extend(rest[i + 1..].iter().cloned());
                    values.insert(name, parts.join(" "));
                    return Ok(ParsedCommand { path, positionals, values, bools });
                } else if let Some((_, v)) = token.split_once('=') {
                    values.insert(name, v.to_string());
                    i += 1;
                } else {
                    let v = rest
                        .get(i + 1)
                        .cloned()
                        .ok_or_else(|| CliError::usage_error(format!("missing value for {name}")))?;
                    values.insert(name, v);
                    i += 2;
                }
                continue;
            }
        }

        bools.insert(name);
        i += 1;
    }

    Ok(ParsedCommand { path, positionals, values, bools })
}

fn parse_duration_flag(value: &str) -> Result<Duration, CliError> {
    let split_at = value.find(|c: char| !c.is_ascii_digit()).ok_or_else(|| CliError::usage_error(format!("invalid duration: {value}")))?;
    let (num, unit) = value.split_at(split_at);
    let n: u64 = num.parse().map_err(|_| CliError::usage_error(format!("invalid duration: {value}")))?;
    match unit {
        "ms" => Ok(Duration::from_millis(n)),
        "s" => Ok(Duration::from_secs(n)),
        "m" => Ok(Duration::from_secs(n * 60)),
        "h" => Ok(Duration::from_secs(n * 3600)),
        _ => Err(CliError::usage_error(format!("invalid duration: {value}"))),
    }
}

fn truthy(s: &str) -> bool {
    matches!(s, "true" | "1" | "yes")
}

struct Command {
    id: CommandId,
    path: &'static [&'static str],
    label: &'static str,
    mutating: bool,
}

#[derive(Clone, Copy)]
enum CommandId {
    SessionList,
    SessionPrune,
    AgentSend,
    AgentJobWait,
    AgentJobCancel,
    TerminalList,
    TerminalRun,
    TerminalLogs,
}

const COMMANDS: &[Command] = &[
    Command { id: CommandId::SessionList, path: &["session", "list"], label: "session.list", mutating: false },
    Command { id: CommandId::SessionPrune, path: &["session", "prune"], label: "session.prune", mutating: true },
    Command { id: CommandId::AgentSend, path: &["agent", "send"], label: "agent.send", mutating: true },
    Command { id: CommandId::AgentJobWait, path: &["agent", "job", "wait"], label: "agent.job.wait", mutating: false },
    Command { id: CommandId::AgentJobCancel, path: &["agent", "job", "cancel"], label: "agent.job.cancel", mutating: true },
    Command { id: CommandId::TerminalList, path: &["terminal", "list"], label: "terminal.list", mutating: false },
    Command { id: CommandId::TerminalRun, path: &["terminal", "run"], label: "terminal.run", mutating: true },
    Command { id: CommandId::TerminalLogs, path: &["terminal", "logs"], label: "terminal.logs", mutating: false },
];

fn match_command(path: &[String]) -> Option<&'static Command> {
    COMMANDS.iter().find(|c| c.path.len() == path.len() && c.path.iter().zip(path.iter()).all(|(a, b)| a == b))
}

/// Restores the process's working directory to its pre-dispatch value on
/// every exit path, including early errors, once dropped.
struct CwdGuard(Option<PathBuf>);

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Some(dir) = self.0.take() {
            let _ = std::env::set_current_dir(dir);
        }
    }
}

/// Runs the full dispatch for one invocation, returning the process exit
/// code. `rest` is the non-global tail returned by [`crate::globals::extract_globals`].
pub async fn dispatch(globals: GlobalFlags, rest: Vec<String>) -> i32 {
    let _cwd_guard = CwdGuard(match &globals.cwd {
        Some(_) => std::env::current_dir().ok(),
        None => None,
    });

    if let Some(cwd) = &globals.cwd {
        if let Err(e) = std::env::set_current_dir(cwd) {
            let ctx = ResponseContext {
                request_id: globals.request_id.clone().unwrap_or_else(new_request_id),
                command: "unknown".to_string(),
            };
            return render::emit_err(globals.json, &CliError::usage_error(format!("--cwd: {e}")), &ctx, &mut None);
        }
    }

    let _timeout_guard = set_timeout_override(globals.timeout);

    let colorize = render::should_colorize(globals.no_color);

    let parsed = match parse_rest(&rest) {
        Ok(p) => p,
        Err(e) => {
            let ctx = ResponseContext {
                request_id: globals.request_id.clone().unwrap_or_else(new_request_id),
                command: "unknown".to_string(),
            };
            return render::emit_err(globals.json, &e, &ctx, &mut None);
        }
    };

    let command = match_command(&parsed.path);

    let request_id = globals.request_id.clone().unwrap_or_else(new_request_id);
    let command_label = command.map(|c| c.label.to_string()).unwrap_or_else(|| "unknown".to_string());
    let _ctx_guard = ResponseContext::enter(request_id.clone(), command_label.clone());
    let ctx = ResponseContext {
        request_id,
        command: command_label,
    };

    let Some(command) = command else {
        return render::emit_err(globals.json, &CliError::unknown_command(&parsed.path.join(" ")), &ctx, &mut None);
    };

    let idempotency_key = parsed.values.get("--idempotency-key").cloned();

    if idempotency_key.is_some() && !globals.json {
        return render::emit_err(globals.json, &CliError::usage_error("--idempotency-key requires --json: replaying a response in human mode is not supported"), &ctx, &mut None);
    }

    let store = idempotency_store();

    if globals.json && command.mutating {
        if let (Some(key), Ok(store)) = (&idempotency_key, &store) {
            if let Ok(Some(entry)) = store.try_replay(&command.path.join("."), key, now_unix()) {
                print!("{}", entry.body);
                return entry.exit_code;
            }
        }
    }

    let mut captured_line: Option<String> = None;
    let exit_code = run_command(command.id, &globals, &parsed, colorize, &ctx, &mut captured_line).await;

    if globals.json && command.mutating {
        if let (Some(key), Ok(store)) = (&idempotency_key, &store) {
            let body = captured_line.unwrap_or_default();
            let _ = store.store(&command.path.join("."), key, exit_code, &body, now_unix());
        }
    }

    exit_code
}

fn idempotency_store() -> Result<IdempotencyStore, CliError> {
    let dir = state_dir().map_err(|e| CliError::init_failed(e.to_string()))?;
    Ok(IdempotencyStore::new(default_idempotency_path(&dir)))
}

async fn run_command(
    id: CommandId,
    globals: &GlobalFlags,
    args: &ParsedCommand,
    colorize: bool,
    ctx: &ResponseContext,
    captured: &mut Option<String>,
) -> i32 {
    let backend = TracedBackend::new(TmuxGateway::new());

    match id {
        CommandId::SessionList => match session::list(&backend, now_unix_u64()).await {
            Ok(rows) => render::emit_ok(globals.json, globals.quiet, rows, ctx, |rows| session::print_rows(rows, colorize), captured),
            Err(e) => render::emit_err(globals.json, &e, ctx, captured),
        },
        CommandId::SessionPrune => {
            let older_than = match args.values.get("--older-than").map(|v| parse_duration_flag(v)).transpose() {
                Ok(v) => v,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };
            let yes = args.bools.contains("--yes");
            let workspaces_root = match workspaces_root() {
                Ok(p) => p,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };
            match session::prune(&backend, &workspaces_root, older_than, yes, now_unix_u64()).await {
                Ok(outcome) => render::emit_ok(globals.json, globals.quiet, outcome, ctx, |o| session::print_prune_outcome(o, colorize), captured),
                Err(e) => render::emit_err(globals.json, &e, ctx, captured),
            }
        }
        CommandId::AgentSend => {
            let session_name = args.values.get("--session").cloned().unwrap_or_default();
            let agent_id = args.values.get("--agent").cloned();
            let text = args.values.get("--text").cloned().unwrap_or_default();
            let send_enter = args.values.get("--enter").map(|v| truthy(v)).unwrap_or(false);

            if session_name.is_empty() {
                return render::emit_err(globals.json, &CliError::usage_error("--session is required"), ctx, captured);
            }

            let queue = match job_queue() {
                Ok(q) => q,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };

            match agent::send(&backend, &queue, &session_name, agent_id, &text, send_enter, now_unix).await {
                Ok(job) => render::emit_ok(globals.json, globals.quiet, job, ctx, |j| println!("{} {:?}", j.id.as_str(), j.status), captured),
                Err(e) => render::emit_err(globals.json, &e, ctx, captured),
            }
        }
        CommandId::AgentJobWait => {
            let Some(id) = args.positionals.first().cloned() else {
                return render::emit_err(globals.json, &CliError::usage_error("job id is required"), ctx, captured);
            };
            let timeout = match args.values.get("--timeout").map(|v| parse_duration_flag(v)).transpose() {
                Ok(v) => v,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };
            let interval = match args.values.get("--interval").map(|v| parse_duration_flag(v)).transpose() {
                Ok(v) => v.unwrap_or(Duration::from_millis(200)),
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };

            let queue = match job_queue() {
                Ok(q) => q,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };
            let job_id = JobId::new(id);
            match agent::job_wait(&queue, &job_id, timeout, interval, now_unix).await {
                Ok(job) => render::emit_ok(globals.json, globals.quiet, job, ctx, |j| println!("{} {:?}", j.id.as_str(), j.status), captured),
                Err(e) => render::emit_err(globals.json, &e, ctx, captured),
            }
        }
        CommandId::AgentJobCancel => {
            let Some(id) = args.positionals.first().cloned() else {
                return render::emit_err(globals.json, &CliError::usage_error("job id is required"), ctx, captured);
            };
            let queue = match job_queue() {
                Ok(q) => q,
                Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
            };
            let job_id = JobId::new(id);
            match agent::job_cancel(&queue, &job_id, now_unix).await {
                Ok((_job, cancelled)) => render::emit_ok(globals.json, globals.quiet, cancelled, ctx, |c| {
                    println!("{}", if *c { "cancelled" } else { "not cancelled (already running or terminal)" });
                }, captured),
                Err(e) => render::emit_err(globals.json, &e, ctx, captured),
            }
        }
        CommandId::TerminalList => match terminal::list(&backend, now_unix_u64()).await {
            Ok(rows) => render::emit_ok(globals.json, globals.quiet, rows, ctx, |rows| session::print_rows(rows, colorize), captured),
            Err(e) => render::emit_err(globals.json, &e, ctx, captured),
        },
        CommandId::TerminalRun => {
            let workspace = args.values.get("--workspace").cloned().unwrap_or_default();
            let text = args.values.get("--text").cloned();
            let send_enter = args.values.get("--enter").map(|v| truthy(v)).unwrap_or(false);
            let create = args.values.get("--create").map(|v| truthy(v)).unwrap_or(false);

            if workspace.is_empty() {
                return render::emit_err(globals.json, &CliError::usage_error("--workspace is required"), ctx, captured);
            }

            let session_name = TmuxGateway::session_name(&["amux", &workspace, "terminal"]);
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            let shell = terminal_shell();

            match terminal::run(&backend, &session_name, &workspace, &cwd, &shell, create, text.as_deref(), send_enter).await {
                Ok(()) => {
                    let data = serde_json::json!({"session": session_name.clone()});
                    render::emit_ok(globals.json, globals.quiet, data, ctx, move |_| println!("{session_name}"), captured)
                }
                Err(e) => render::emit_err(globals.json, &e, ctx, captured),
            }
        }
        CommandId::TerminalLogs => {
            let workspace = args.values.get("--workspace").cloned().unwrap_or_default();
            if workspace.is_empty() {
                return render::emit_err(globals.json, &CliError::usage_error("--workspace is required"), ctx, captured);
            }
            let session_name = TmuxGateway::session_name(&["amux", &workspace, "terminal"]);
            let lines: u32 = args.values.get("--lines").and_then(|v| v.parse().ok()).unwrap_or(200);

            if args.bools.contains("--follow") {
                let interval = match args.values.get("--interval").map(|v| parse_duration_flag(v)).transpose() {
                    Ok(v) => v.unwrap_or(Duration::from_millis(500)),
                    Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
                };
                let idle_threshold = match args.values.get("--idle-threshold").map(|v| parse_duration_flag(v)).transpose() {
                    Ok(v) => v.unwrap_or(Duration::from_secs(5)),
                    Err(e) => return render::emit_err(globals.json, &e, ctx, captured),
                };
                let cancel = CancellationToken::new();
                let result = terminal::logs_follow(&backend, &session_name, lines, interval, idle_threshold, &cancel, |event| {
                    let line = serde_json::to_string(&event).unwrap_or_default();
                    println!("{line}");
                })
                .await;
                match result {
                    Ok(()) => 0,
                    Err(e) => render::emit_err(globals.json, &e, ctx, captured),
                }
            } else {
                match terminal::logs_once(&backend, &session_name, lines).await {
                    Ok(content) => render::emit_ok(globals.json, globals.quiet, serde_json::json!({"content": content.clone()}), ctx, move |_| println!("{content}"), captured),
                    Err(e) => render::emit_err(globals.json, &e, ctx, captured),
                }
            }
        }
    }
}

fn job_queue() -> Result<JobQueue, CliError> {
    let dir = state_dir().map_err(|e| CliError::init_failed(e.to_string()))?;
    Ok(JobQueue::new(&dir))
}

fn workspaces_root() -> Result<PathBuf, CliError> {
    let dir = state_dir().map_err(|e| CliError::init_failed(e.to_string()))?;
    Ok(dir.join("workspaces"))
}

fn new_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("req-{nanos:x}")
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
