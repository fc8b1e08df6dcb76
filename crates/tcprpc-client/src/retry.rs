//! Attempt bookkeeping shared by the async and blocking clients.
//!
//! A logical call keeps one request id across all of its attempts. Each
//! failed attempt leaves a one-line note; when the attempts run out the last
//! note becomes part of a synthesized `ERROR` response.

use tcprpc_common::protocol::error::{Result, RpcError};
use tcprpc_common::protocol::{RequestId, Response};

#[derive(Debug, Clone)]
pub struct CallTracker {
    request_id: RequestId,
    max_attempts: u32,
    attempts: u32,
    last_error: Option<String>,
}

impl CallTracker {
    pub fn new(request_id: impl Into<RequestId>, max_attempts: u32) -> Self {
        Self {
            request_id: request_id.into(),
            max_attempts: max_attempts.max(1),
            attempts: 0,
            last_error: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts the next attempt and returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Accepts `response` only if it answers this call.
    pub fn correlate(&self, response: Response) -> Result<Response> {
        if response.request_id != self.request_id {
            return Err(RpcError::CorrelationMismatch {
                expected: self.request_id.clone(),
                actual: response.request_id,
            });
        }
        Ok(response)
    }

    /// Records why the current attempt failed and returns the note.
    pub fn record_failure(&mut self, err: &RpcError) -> &str {
        let attempt = format!("attempt {}/{}", self.attempts, self.max_attempts);
        let note = match err {
            RpcError::Timeout(_) => format!("TIMEOUT ({}): {}", attempt, err),
            e if e.is_connection_fault() => format!("CONNECTION ERROR ({}): {}", attempt, err),
            _ => format!("CLIENT ERROR ({}): {}: {}", attempt, err.kind(), err),
        };
        self.last_error.insert(note).as_str()
    }

    /// Whether another attempt is allowed after the current one.
    pub fn should_retry(&self) -> bool {
        self.attempts < self.max_attempts
    }

    /// Builds the outcome of a call whose attempts all failed.
    pub fn exhausted(self) -> Response {
        let last = self.last_error.unwrap_or_else(|| "none".to_string());
        Response::error(
            self.request_id,
            format!("RPC failed after {} attempts. Last error: {}", self.attempts, last),
        )
    }
}
