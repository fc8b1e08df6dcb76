//! Method registry.
//!
//! Maps method names to handlers. Each handler is registered with the
//! parameter type it expects; the registry coerces the request's params
//! mapping into that type before calling it, so malformed parameters fail the
//! same way for every method.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tcprpc_common::protocol::{Params, Request, Response};

/// A handler failure, reported to the caller as `Execution error: <kind>: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ExecutionError {
    pub kind: String,
    pub message: String,
}

impl ExecutionError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Params could not be coerced into the handler's parameter type.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new("InvalidParams", message)
    }
}

/// Type-erased handler stored in the registry.
pub type Handler = Arc<dyn Fn(&Params) -> Result<Value, ExecutionError> + Send + Sync>;

/// Name → handler table.
///
/// Built once at startup and shared read-only by every connection.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use tcprpc_server::{ExecutionError, MethodRegistry};
///
/// #[derive(Deserialize)]
/// struct Square {
///     n: i64,
/// }
///
/// let mut registry = MethodRegistry::new();
/// registry.register("square", |p: Square| Ok::<_, ExecutionError>(p.n * p.n));
/// assert!(registry.lookup("square").is_some());
/// ```
#[derive(Default, Clone)]
pub struct MethodRegistry {
    methods: HashMap<String, Handler>,
}

impl MethodRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the builtin methods (`add`, `reverse_string`, `get_time`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::methods::register_builtins(&mut registry);
        registry
    }

    /// Registers `handler` under `name`, replacing any earlier handler with that name.
    ///
    /// `P` declares the parameter shape. A params mapping that does not
    /// deserialize into `P` becomes an `InvalidParams` execution error without
    /// the handler being called.
    pub fn register<P, R, F>(&mut self, name: impl Into<String>, handler: F)
    where
        P: DeserializeOwned,
        R: Serialize,
        F: Fn(P) -> Result<R, ExecutionError> + Send + Sync + 'static,
    {
        let erased: Handler = Arc::new(move |params: &Params| {
            let typed: P = serde_json::from_value(Value::Object(params.clone()))
                .map_err(|e| ExecutionError::invalid_params(e.to_string()))?;
            let output = handler(typed)?;
            serde_json::to_value(output)
                .map_err(|e| ExecutionError::new("SerializationError", e.to_string()))
        });
        self.methods.insert(name.into(), erased);
    }

    /// Looks up the handler registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Handler> {
        self.methods.get(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Dispatches a request and builds its response.
    ///
    /// Never fails: an unknown method, a handler error and a handler panic all
    /// become `ERROR` responses carrying the request's id.
    pub fn dispatch(&self, request: &Request) -> Response {
        let Some(handler) = self.lookup(&request.method) else {
            tracing::warn!(
                request_id = %request.request_id,
                method = %request.method,
                "Unknown method"
            );
            return Response::error(
                request.request_id.clone(),
                format!("Unknown method: {}", request.method),
            );
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| handler(&request.params)))
            .unwrap_or_else(|payload| Err(ExecutionError::new("Panic", panic_message(payload.as_ref()))));

        match outcome {
            Ok(result) => Response::success(request.request_id.clone(), result),
            Err(e) => {
                tracing::warn!(
                    request_id = %request.request_id,
                    method = %request.method,
                    kind = %e.kind,
                    "Execution error: {}",
                    e.message
                );
                Response::error(request.request_id.clone(), format!("Execution error: {}", e))
            }
        }
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.names())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
