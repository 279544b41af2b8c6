// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response Envelope. `Envelope<T>` is the one output shape every command
//! produces; [`ResponseContext`] is the scoped handle for it — never a
//! global that leaks across requests.

use std::cell::RefCell;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SCHEMA_VERSION: &str = "amux.cli.v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    pub generated_at: String,
    pub amux_version: String,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            amux_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Exactly one of `data`/`error` carries content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub meta: Meta,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Fallback minimal error envelope used when marshalling the real one
/// fails, to preserve the JSON contract.
pub const FALLBACK_ENVELOPE_JSON: &str =
    "{\"ok\":false,\"error\":{\"code\":\"internal\",\"message\":\"failed to encode response\"},\"schema_version\":\"amux.cli.v1\"}\n";

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T, ctx: &ResponseContext) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
            meta: Meta::now(),
            schema_version: SCHEMA_VERSION.to_string(),
            request_id: Some(ctx.request_id.clone()),
            command: Some(ctx.command.clone()),
        }
    }

    pub fn err(error: ErrorBody, ctx: &ResponseContext) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error),
            meta: Meta::now(),
            schema_version: SCHEMA_VERSION.to_string(),
            request_id: Some(ctx.request_id.clone()),
            command: Some(ctx.command.clone()),
        }
    }

    /// Pretty-prints with a trailing newline, falling back to
    /// [`FALLBACK_ENVELOPE_JSON`] on encoding failure.
    pub fn to_json_line(&self) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(s) => format!("{s}\n"),
            Err(_) => FALLBACK_ENVELOPE_JSON.to_string(),
        }
    }
}

/// Process-wide request context: `request_id` and `command`.
/// Carried in a `thread_local!` cell behind a scoped RAII guard rather than
/// a bare global, so it is always cleared on return — even on an early
/// error path — and never leaks across requests.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub request_id: String,
    pub command: String,
}

thread_local! {
    static CURRENT: RefCell<Option<ResponseContext>> = const { RefCell::new(None) };
}

impl ResponseContext {
    /// Installs this context for the current thread and returns a guard
    /// that clears it on drop.
    pub fn enter(request_id: String, command: String) -> ResponseContextGuard {
        CURRENT.with(|c| {
            *c.borrow_mut() = Some(ResponseContext { request_id, command });
        });
        ResponseContextGuard { _private: () }
    }

    /// Returns a clone of the currently installed context, if any.
    pub fn current() -> Option<ResponseContext> {
        CURRENT.with(|c| c.borrow().clone())
    }
}

/// Releases the thread-local [`ResponseContext`] when dropped.
#[must_use = "dropping this immediately clears the response context"]
pub struct ResponseContextGuard {
    _private: (),
}

impl Drop for ResponseContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| {
            *c.borrow_mut() = None;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn schema_version_and_generated_at_format() {
        let ctx = ResponseContext {
            request_id: "r1".to_string(),
            command: "session.list".to_string(),
        };
        let env = Envelope::ok(serde_json::json!({"sessions": []}), &ctx);
        assert_eq!(env.schema_version, "amux.cli.v1");
        assert!(chrono::DateTime::parse_from_rfc3339(&env.meta.generated_at).is_ok());
    }

    #[test]
    fn exactly_one_of_data_or_error_is_serialized() {
        let ctx = ResponseContext {
            request_id: "r1".to_string(),
            command: "session.list".to_string(),
        };
        let ok_env = Envelope::ok(serde_json::json!(1), &ctx);
        let value = serde_json::to_value(&ok_env).unwrap();
        assert!(value.get("data").is_some());
        assert!(value.get("error").is_none());

        let err_env: Envelope<Value> = Envelope::err(
            ErrorBody {
                code: "not_found".to_string(),
                message: "no such session".to_string(),
                details: None,
            },
            &ctx,
        );
        let value = serde_json::to_value(&err_env).unwrap();
        assert!(value.get("error").is_some());
        assert!(value.get("data").is_none());
    }

    #[test]
    #[serial]
    fn response_context_is_cleared_on_guard_drop() {
        assert!(ResponseContext::current().is_none());
        {
            let _guard = ResponseContext::enter("r1".to_string(), "session.list".to_string());
            assert!(ResponseContext::current().is_some());
        }
        assert!(ResponseContext::current().is_none());
    }

    #[test]
    fn to_json_line_ends_with_newline() {
        let ctx = ResponseContext {
            request_id: "r1".to_string(),
            command: "session.list".to_string(),
        };
        let env = Envelope::ok(serde_json::json!(1), &ctx);
        assert!(env.to_json_line().ends_with('\n'));
    }
}
