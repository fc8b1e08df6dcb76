//! Builtin methods served by a default server.
//!
//! Pure functions; each declares its parameter shape as a `Deserialize` struct.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::registry::{ExecutionError, MethodRegistry};

#[derive(Debug, Deserialize)]
pub struct AddParams {
    #[serde(deserialize_with = "integer_like")]
    pub a: i64,
    #[serde(deserialize_with = "integer_like")]
    pub b: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntegerLike {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Accepts `2`, `2.0` and `"2"`; rejects fractions and non-numeric text.
fn integer_like<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match IntegerLike::deserialize(deserializer)? {
        IntegerLike::Int(n) => Ok(n),
        IntegerLike::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f as i64)
        }
        IntegerLike::Float(f) => Err(D::Error::custom(format!("{} is not an integer", f))),
        IntegerLike::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("{:?} is not an integer", text))),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseStringParams {
    #[serde(default)]
    pub s: String,
}

/// Parameter shape for methods that take nothing. Extra keys are ignored.
#[derive(Debug, Deserialize)]
pub struct NoParams {}

pub fn add(params: AddParams) -> Result<i64, ExecutionError> {
    params.a.checked_add(params.b).ok_or_else(|| {
        ExecutionError::new(
            "Overflow",
            format!("{} + {} does not fit in a 64-bit integer", params.a, params.b),
        )
    })
}

/// Reverses by Unicode scalar value.
pub fn reverse_string(params: ReverseStringParams) -> Result<String, ExecutionError> {
    Ok(params.s.chars().rev().collect())
}

/// Current UTC time as an RFC 3339 timestamp.
pub fn get_time(_: NoParams) -> Result<String, ExecutionError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| ExecutionError::new("FormatError", e.to_string()))
}

pub fn register_builtins(registry: &mut MethodRegistry) {
    registry.register("add", add);
    registry.register("reverse_string", reverse_string);
    registry.register("get_time", get_time);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tcprpc_common::protocol::{Request, Status};

    fn call(method: &str, params: serde_json::Value) -> tcprpc_common::protocol::Response {
        MethodRegistry::with_builtins().dispatch(&Request::from_value(method, params))
    }

    #[test]
    fn test_add() {
        let resp = call("add", json!({"a": 2, "b": 3}));
        assert_eq!(resp.status, Status::Ok);
        assert_eq!(resp.result, Some(json!(5)));
    }

    #[test]
    fn test_add_negative() {
        assert_eq!(call("add", json!({"a": -7, "b": 3})).result, Some(json!(-4)));
    }

    #[test]
    fn test_add_missing_param() {
        let resp = call("add", json!({"a": 2}));
        assert_eq!(resp.status, Status::Error);
        let error = resp.error.unwrap();
        assert!(error.starts_with("Execution error: InvalidParams:"), "{}", error);
        assert!(error.contains("`b`"), "{}", error);
    }

    #[test]
    fn test_add_overflow() {
        let resp = call("add", json!({"a": i64::MAX, "b": 1}));
        assert!(resp.error.unwrap().starts_with("Execution error: Overflow:"));
    }

    #[test]
    fn test_add_accepts_whole_floats_and_numeric_strings() {
        assert_eq!(call("add", json!({"a": 2.0, "b": 3})).result, Some(json!(5)));
        assert_eq!(call("add", json!({"a": "2", "b": " -3 "})).result, Some(json!(-1)));
    }

    #[test]
    fn test_add_rejects_fractions_and_text() {
        for params in [json!({"a": 2.5, "b": 3}), json!({"a": "two", "b": 3}), json!({"a": true, "b": 3})] {
            let resp = call("add", params);
            assert_eq!(resp.status, Status::Error);
            assert!(resp.error.unwrap().starts_with("Execution error: InvalidParams:"));
        }
    }

    #[test]
    fn test_reverse_string() {
        assert_eq!(call("reverse_string", json!({"s": "abc"})).result, Some(json!("cba")));
    }

    #[test]
    fn test_reverse_string_unicode_and_default() {
        assert_eq!(call("reverse_string", json!({"s": "añb"})).result, Some(json!("bña")));
        assert_eq!(call("reverse_string", json!({})).result, Some(json!("")));
    }

    #[test]
    fn test_get_time_is_rfc3339() {
        let resp = call("get_time", json!({}));
        assert_eq!(resp.status, Status::Ok);
        let text = resp.result.unwrap();
        let text = text.as_str().unwrap();
        assert!(OffsetDateTime::parse(text, &Rfc3339).is_ok(), "{}", text);
    }

    #[test]
    fn test_get_time_ignores_extra_params() {
        assert_eq!(call("get_time", json!({"unused": 1})).status, Status::Ok);
    }
}
