//! tcprpc Server
//!
//! This crate provides the server side of tcprpc: a registry of named
//! methods, an optional response cache keyed by request id (at-most-once
//! execution), test hooks for artificial delay and dropped responses, and the
//! per-connection loop tying them together.

pub mod cache;
pub mod config;
pub mod connection;
pub mod faults;
pub mod methods;
pub mod registry;
pub mod server;

pub use cache::ResponseCache;
pub use config::ServerConfig;
pub use connection::ConnectionContext;
pub use faults::FaultInjector;
pub use registry::{ExecutionError, Handler, MethodRegistry};
pub use server::RpcServer;
