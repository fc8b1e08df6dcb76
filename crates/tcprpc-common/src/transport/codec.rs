use crate::protocol::{Request, Response};
use crate::protocol::error::{Result, RpcError};

/// Size of the big-endian length prefix in front of every payload.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound on an incoming payload (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// JSON codec for encoding/decoding RPC payloads
///
/// Works on the payload only; [`encode_frame`] and the transports add and strip
/// the length prefix. Decode failures are reported as
/// [`RpcError::MalformedPayload`] so callers can treat them as connection-fatal.
///
/// # Example
///
/// ```
/// use tcprpc_common::transport::JsonCodec;
/// use tcprpc_common::protocol::{Request, Response};
/// use serde_json::json;
///
/// let request = Request::from_value("add", json!({"a": 2, "b": 3}));
/// let encoded = JsonCodec::encode_request(&request).unwrap();
/// let decoded = JsonCodec::decode_request(&encoded).unwrap();
/// assert_eq!(request, decoded);
///
/// let response = Response::success(request.request_id.clone(), json!(5));
/// let encoded = JsonCodec::encode_response(&response).unwrap();
/// assert_eq!(JsonCodec::decode_response(&encoded).unwrap(), response);
/// ```
pub struct JsonCodec;

impl JsonCodec {
    /// Encode a request to UTF-8 JSON bytes
    pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(request)?)
    }

    /// Decode a request from UTF-8 JSON bytes
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the bytes are not valid UTF-8 JSON or do not
    /// have the request shape.
    pub fn decode_request(data: &[u8]) -> Result<Request> {
        serde_json::from_slice(data).map_err(|e| RpcError::MalformedPayload(e.to_string()))
    }

    /// Encode a response to UTF-8 JSON bytes
    pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(response)?)
    }

    /// Decode a response from UTF-8 JSON bytes
    ///
    /// # Errors
    ///
    /// Returns `MalformedPayload` if the bytes are not valid UTF-8 JSON or do not
    /// have the response shape.
    pub fn decode_response(data: &[u8]) -> Result<Response> {
        serde_json::from_slice(data).map_err(|e| RpcError::MalformedPayload(e.to_string()))
    }

    /// Encode a request as a complete frame (prefix + payload)
    pub fn request_frame(request: &Request) -> Result<Vec<u8>> {
        encode_frame(&Self::encode_request(request)?)
    }

    /// Encode a response as a complete frame (prefix + payload)
    pub fn response_frame(response: &Response) -> Result<Vec<u8>> {
        encode_frame(&Self::encode_response(response)?)
    }
}

/// Prepends the 4-byte big-endian length prefix to a payload.
///
/// Wire format: `[4-byte length as u32 big-endian] + [payload]`
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(payload.len()).map_err(|_| RpcError::FrameTooLarge {
        size: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Reads the payload length out of a prefix, rejecting lengths above `max_size`.
pub fn decode_length(prefix: [u8; LENGTH_PREFIX_SIZE], max_size: usize) -> Result<usize> {
    let len = u32::from_be_bytes(prefix) as usize;
    if len > max_size {
        return Err(RpcError::FrameTooLarge { size: len, max: max_size });
    }
    Ok(len)
}
