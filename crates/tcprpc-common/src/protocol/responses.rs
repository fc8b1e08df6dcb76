//! tcprpc Response Types
//!
//! This module defines the RPC response structure.

use serde::{Deserialize, Deserializer, Serialize};
use super::RequestId;

/// RPC method result (JSON value)
///
/// The result is returned as a JSON value and can contain any JSON-serializable data.
pub type RpcResult = serde_json::Value;

/// Outcome status carried by every response.
///
/// Serialized as the literal strings `"OK"` and `"ERROR"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// An RPC response returned from the server to the client.
///
/// # Response Flow
///
/// 1. Server receives and dispatches a `Request`
/// 2. Server creates a `Response` (OK or ERROR) echoing the request's id
/// 3. Response is serialized to JSON and sent as one frame
/// 4. Client checks the id against the request it sent
///
/// # Fields
///
/// - `request_id`: The id of the request this response answers
/// - `status`: `OK` or `ERROR`
/// - `result`: The result value (present iff `status` is `OK`)
/// - `error`: Error message (present iff `status` is `ERROR`)
///
/// An OK response whose result is JSON `null` keeps `result` as `Some(Value::Null)`;
/// only a missing field decodes to `None`.
///
/// # Example
///
/// ```
/// use tcprpc_common::protocol::responses::{Response, Status};
/// use serde_json::json;
///
/// let ok = Response::success("req-1", json!(5));
/// assert_eq!(ok.status, Status::Ok);
///
/// let err = Response::error("req-1", "Unknown method: foo");
/// assert_eq!(err.status, Status::Error);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    /// Request identifier this response corresponds to
    pub request_id: RequestId,
    /// Whether the call produced a result or an error
    pub status: Status,
    /// Result value (present on success)
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub result: Option<RpcResult>,
    /// Error message (present on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Creates a successful response.
    ///
    /// # Arguments
    ///
    /// * `request_id` - The request identifier (must match the request's id)
    /// * `result` - The result value (any JSON-serializable data)
    pub fn success(request_id: impl Into<RequestId>, result: RpcResult) -> Self {
        Response {
            request_id: request_id.into(),
            status: Status::Ok,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    ///
    /// # Arguments
    ///
    /// * `request_id` - The request identifier (must match the request's id)
    /// * `error` - The error message (describing what went wrong)
    pub fn error(request_id: impl Into<RequestId>, error: impl Into<String>) -> Self {
        Response {
            request_id: request_id.into(),
            status: Status::Error,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<RpcResult>, D::Error>
where
    D: Deserializer<'de>,
{
    RpcResult::deserialize(deserializer).map(Some)
}
