//! Response cache keyed by request id.
//!
//! When enabled, a repeated request id is answered with the response produced
//! the first time, without dispatching again. Entries are never evicted, so
//! memory grows with the number of distinct ids seen over the process lifetime.

use std::collections::HashMap;

use parking_lot::Mutex;
use tcprpc_common::protocol::{RequestId, Response};

/// Shared request id → response map behind a single lock.
#[derive(Debug)]
pub struct ResponseCache {
    enabled: bool,
    entries: Mutex<HashMap<RequestId, Response>>,
}

impl ResponseCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache that never stores anything (at-least-once delivery).
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the stored response for `request_id`. Always `None` when disabled.
    pub fn get(&self, request_id: &str) -> Option<Response> {
        if !self.enabled {
            return None;
        }
        self.entries.lock().get(request_id).cloned()
    }

    /// Stores `response` for `request_id`. A no-op when disabled.
    ///
    /// The first stored response for an id wins; later puts for the same id
    /// (from a duplicate that raced the original dispatch) are ignored.
    pub fn put(&self, request_id: impl Into<RequestId>, response: Response) {
        if !self.enabled {
            return;
        }
        self.entries.lock().entry(request_id.into()).or_insert(response);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
