//! Helpers for the `call` subcommand.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use tcprpc_client::ClientConfig;
use tcprpc_common::protocol::{Params, Response};

/// Builds the params object for `method`.
///
/// Explicit `--params` JSON wins. Otherwise `add` takes `a` and `b`,
/// `reverse_string` takes `s`, and anything else gets an empty object.
pub fn build_params(
    method: &str,
    a: i64,
    b: i64,
    s: &str,
    params_json: Option<&str>,
) -> Result<Params> {
    if let Some(raw) = params_json {
        let value: Value =
            serde_json::from_str(raw).with_context(|| format!("Invalid JSON in --params: {}", raw))?;
        return match value {
            Value::Object(map) => Ok(map),
            other => Err(anyhow!("--params must be a JSON object, got {}", other)),
        };
    }

    let value = match method {
        "add" => json!({"a": a, "b": b}),
        "reverse_string" => json!({"s": s}),
        _ => json!({}),
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Params::new()),
    }
}

/// Maps `--timeout` and `--retries` onto a validated client configuration.
pub fn client_config(timeout_secs: f64, retries: u32) -> Result<ClientConfig> {
    let timeout = Duration::try_from_secs_f64(timeout_secs)
        .map_err(|_| anyhow!("Invalid --timeout {}: must be a positive number of seconds", timeout_secs))?;

    let config = ClientConfig::new().with_timeout(timeout).with_retries(retries);
    config.validate()?;
    Ok(config)
}

/// One-line summary printed to stdout.
pub fn format_outcome(response: &Response) -> String {
    if response.is_ok() {
        let result = response
            .result
            .as_ref()
            .map(Value::to_string)
            .unwrap_or_else(|| "null".to_string());
        format!("OK | request_id={} | result={}", response.request_id, result)
    } else {
        format!(
            "ERROR | request_id={} | error={}",
            response.request_id,
            response.error.as_deref().unwrap_or("unknown error")
        )
    }
}

pub fn exit_code(response: &Response) -> ExitCode {
    if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Joins host and port, bracketing bare IPv6 literals.
pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}
