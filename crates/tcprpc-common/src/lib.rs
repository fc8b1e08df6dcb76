//! tcprpc Common Types and Transport
//!
//! This crate provides the protocol definitions and the TCP framing shared by
//! the tcprpc server and client.
//!
//! # Overview
//!
//! - **Protocol Layer**: `Request`/`Response` types, the `RpcError` taxonomy
//! - **Transport Layer**: length-prefixed JSON frames over blocking or tokio TCP
//!
//! # Wire Protocol
//!
//! - **Transport**: TCP, one connection per logical call on the client side
//! - **Serialization**: UTF-8 JSON
//! - **Message Format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//!
//! # Example
//!
//! ```
//! use tcprpc_common::{Request, Response};
//! use serde_json::json;
//!
//! let request = Request::from_value("add", json!({"a": 2, "b": 3}));
//! let response = Response::success(request.request_id.clone(), json!(5));
//! assert_eq!(response.request_id, request.request_id);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
