//! Helpers for the `serve` subcommand.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tcprpc_common::transport::DEFAULT_MAX_FRAME_SIZE;
use tcprpc_server::ServerConfig;

use crate::call::join_host_port;

/// Maps the `serve` flags onto a validated server configuration.
pub fn server_config(
    host: &str,
    port: u16,
    delay_seconds: f64,
    drop_rate: f64,
    at_most_once: bool,
    max_frame_bytes: Option<usize>,
) -> Result<ServerConfig> {
    let delay = Duration::try_from_secs_f64(delay_seconds)
        .map_err(|_| anyhow!("Invalid --delay-seconds {}: must be zero or positive", delay_seconds))?;

    let config = ServerConfig::new()
        .with_bind_addr(join_host_port(host, port))
        .with_delay(delay)
        .with_drop_rate(drop_rate)
        .with_at_most_once(at_most_once)
        .with_max_frame_size(max_frame_bytes.unwrap_or(DEFAULT_MAX_FRAME_SIZE));
    config.validate()?;
    Ok(config)
}
