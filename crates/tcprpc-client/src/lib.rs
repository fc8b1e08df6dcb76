pub mod blocking;
pub mod client;
pub mod config;
pub mod retry;

pub use blocking::BlockingRpcClient;
pub use client::RpcClient;
pub use config::{ClientConfig, DEFAULT_BACKOFF, DEFAULT_RETRIES};
pub use retry::CallTracker;
