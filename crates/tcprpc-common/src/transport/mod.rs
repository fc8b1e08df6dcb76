//! tcprpc Transport Layer
//!
//! This module turns protocol messages into length-prefixed frames and moves
//! them over TCP.
//!
//! # Architecture
//!
//! - **Codec**: UTF-8 JSON payloads via serde
//! - **Wire Format**: `[4-byte length prefix as u32 big-endian] + [JSON data]`
//! - **Reads**: always exact; a stream that ends partway through a frame is
//!   reported as `ConnectionClosed`
//!
//! # Components
//!
//! - **[`JsonCodec`]**: Encode/decode request and response payloads
//! - **[`TcpTransport`]**: Blocking TCP transport with per-operation timeouts
//! - **[`TcpTransportAsync`]**: Tokio TCP transport with an optional deadline
//!
//! # Frame Size Limits
//!
//! Receivers reject frames above a configurable maximum (16 MiB by default)
//! before allocating the payload buffer.

pub mod codec;
pub mod tcp;

pub use codec::{decode_length, encode_frame, JsonCodec, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
pub use tcp::{TcpTransport, TcpTransportAsync, DEFAULT_TIMEOUT};
