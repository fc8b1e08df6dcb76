use serde::{Deserialize, Deserializer, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

pub type RequestId = String;
pub type MethodName = String;
pub type Params = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub request_id: RequestId,
    pub method: MethodName,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub params: Params,
    /// Seconds since the Unix epoch at creation. Advisory only.
    #[serde(default)]
    pub timestamp: u64,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Request {
            request_id: generate_request_id(),
            method: method.into(),
            params,
            timestamp: unix_timestamp(),
        }
    }

    /// Builds a request from a JSON value, treating anything but an object as empty params.
    pub fn from_value(method: impl Into<String>, params: serde_json::Value) -> Self {
        let params = match params {
            serde_json::Value::Object(map) => map,
            _ => Params::new(),
        };
        Self::new(method, params)
    }

    pub fn with_request_id(mut self, request_id: impl Into<RequestId>) -> Self {
        self.request_id = request_id.into();
        self
    }
}

pub fn generate_request_id() -> RequestId {
    Uuid::new_v4().to_string()
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Params, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Params>::deserialize(deserializer)?.unwrap_or_default())
}
