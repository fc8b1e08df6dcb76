//! # tcprpc CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! # Start a server on the default port
//! tcprpc serve
//!
//! # Start a slow, lossy server that remembers responses by request id
//! tcprpc serve --port 5000 --delay-seconds 3 --drop-rate 0.3 --at-most-once
//!
//! # Make a call (prints one summary line, exit code 0 on OK)
//! tcprpc call --host 127.0.0.1 --method add --a 2 --b 3
//! tcprpc call --host 127.0.0.1 --method reverse_string --s abc --timeout 1.5 --retries 4
//! tcprpc call --host 127.0.0.1 --method add --params '{"a": 1, "b": 2}'
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use argh::FromArgs;
use tcprpc_cli::{call, serve};
use tcprpc_client::RpcClient;
use tcprpc_server::{MethodRegistry, RpcServer};
use tracing_subscriber::EnvFilter;

#[derive(FromArgs)]
/// tcprpc - length-prefixed JSON RPC over TCP
struct Cli {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Commands {
    Serve(ServeArgs),
    Call(CallArgs),
}

#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
/// start a tcprpc server
struct ServeArgs {
    /// address to listen on
    #[argh(option, default = "\"0.0.0.0\".into()")]
    host: String,

    /// port to listen on
    #[argh(option, default = "5000")]
    port: u16,

    /// seconds to sleep before handling each uncached request
    #[argh(option, long = "delay-seconds", default = "0.0")]
    delay_seconds: f64,

    /// probability in [0, 1] of handling a request but sending no response
    #[argh(option, long = "drop-rate", default = "0.0")]
    drop_rate: f64,

    /// answer repeated request ids from a cache instead of executing again
    #[argh(switch, long = "at-most-once")]
    at_most_once: bool,

    /// largest frame payload accepted, in bytes
    #[argh(option, long = "max-frame-bytes")]
    max_frame_bytes: Option<usize>,
}

#[derive(FromArgs)]
#[argh(subcommand, name = "call")]
/// make a single RPC call
struct CallArgs {
    /// server hostname or IP address
    #[argh(option)]
    host: String,

    /// server port
    #[argh(option, default = "5000")]
    port: u16,

    /// per-attempt timeout in seconds
    #[argh(option, default = "2.0")]
    timeout: f64,

    /// how many times to retry after the first attempt fails
    #[argh(option, default = "2")]
    retries: u32,

    /// method to call (add, reverse_string, get_time, ...)
    #[argh(option)]
    method: String,

    /// first operand for add
    #[argh(option, default = "0")]
    a: i64,

    /// second operand for add
    #[argh(option, default = "0")]
    b: i64,

    /// input string for reverse_string
    #[argh(option, default = "String::new()")]
    s: String,

    /// params as a JSON object, overriding --a, --b and --s
    #[argh(option)]
    params: Option<String>,
}

fn init_tracing(command: &Commands) {
    // RUST_LOG overrides the per-command default
    match command {
        Commands::Serve(_) => {
            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
        }
        // stdout carries only the summary line
        Commands::Call(_) => {
            let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli: Cli = argh::from_env();
    init_tracing(&cli.command);

    match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Call(args) => run_call(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<ExitCode> {
    let config = serve::server_config(
        &args.host,
        args.port,
        args.delay_seconds,
        args.drop_rate,
        args.at_most_once,
        args.max_frame_bytes,
    )?;

    let server = RpcServer::bind(config, MethodRegistry::with_builtins())
        .await
        .context("Failed to start server")?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(ExitCode::SUCCESS)
}

async fn run_call(args: CallArgs) -> Result<ExitCode> {
    let params = call::build_params(&args.method, args.a, args.b, &args.s, args.params.as_deref())?;
    let config = call::client_config(args.timeout, args.retries)?;

    let client = RpcClient::new(call::join_host_port(&args.host, args.port), config)?;
    let response = client.call(args.method, params).await;

    println!("{}", call::format_outcome(&response));
    Ok(call::exit_code(&response))
}
