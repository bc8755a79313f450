//! Response envelope normalization.
//!
//! The server wraps payloads as `{ "code": <int>, "message": <string>,
//! "data": <T> }`. This is the only place that knows the wire shape; any
//! future envelope change belongs here.

use serde_json::{Map, Value};

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub data: Option<Value>,
}

impl Envelope {
    /// Absent code counts as success
    pub fn is_success(&self, success_code: i64) -> bool {
        self.code.map_or(true, |code| code == success_code)
    }

    /// Non-empty message, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

/// Decode raw response bytes into an envelope.
///
/// Empty bodies, JSON `null`, non-objects and objects carrying none of the
/// envelope fields are all malformed.
pub fn normalize(body: &[u8]) -> Result<Envelope, PipelineError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(PipelineError::malformed("response body is empty"));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PipelineError::malformed(format!("response body is not valid JSON: {}", e)))?;

    match value {
        Value::Null => Err(PipelineError::malformed("response body is empty")),
        Value::Object(map) => from_object(map),
        other => Err(PipelineError::malformed(format!(
            "expected an envelope object, got {}",
            json_type(&other)
        ))),
    }
}

fn from_object(mut map: Map<String, Value>) -> Result<Envelope, PipelineError> {
    if !["code", "message", "data"].iter().any(|k| map.contains_key(*k)) {
        return Err(PipelineError::malformed("response does not match the envelope contract"));
    }

    let code = match map.remove("code") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(
            n.as_i64()
                .ok_or_else(|| PipelineError::malformed(format!("envelope code {} is not an integer", n)))?,
        ),
        Some(other) => {
            return Err(PipelineError::malformed(format!(
                "envelope code must be an integer, got {}",
                json_type(&other)
            )))
        }
    };

    let message = match map.remove("message") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            return Err(PipelineError::malformed(format!(
                "envelope message must be a string, got {}",
                json_type(&other)
            )))
        }
    };

    let data = match map.remove("data") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    };

    Ok(Envelope { code, message, data })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn canonical_envelope_is_split_into_fields() {
        let envelope = normalize(&bytes(json!({
            "code": 0,
            "message": "ok",
            "data": {"id": 7}
        })))
        .unwrap();

        assert_eq!(envelope.code, Some(0));
        assert_eq!(envelope.message(), Some("ok"));
        assert_eq!(envelope.data, Some(json!({"id": 7})));
        assert!(envelope.is_success(0));
        assert!(!envelope.is_success(200));
    }

    #[test]
    fn absent_code_is_success() {
        let envelope = normalize(&bytes(json!({"message": "Class added successfully", "data": []}))).unwrap();
        assert_eq!(envelope.code, None);
        assert!(envelope.is_success(0));
    }

    #[test]
    fn empty_and_null_bodies_are_malformed() {
        let bodies: [&[u8]; 3] = [b"", b"   ", b"null"];
        for body in bodies {
            assert_eq!(
                normalize(body),
                Err(PipelineError::malformed("response body is empty"))
            );
        }
    }

    #[test]
    fn non_envelope_shapes_are_rejected() {
        assert!(matches!(normalize(b"[1,2]"), Err(PipelineError::MalformedResponse(_))));
        assert!(matches!(normalize(b"{\"user\":{}}"), Err(PipelineError::MalformedResponse(_))));
        assert!(matches!(normalize(b"<html>"), Err(PipelineError::MalformedResponse(_))));
        assert!(matches!(
            normalize(&bytes(json!({"code": "0", "data": 1}))),
            Err(PipelineError::MalformedResponse(_))
        ));
    }

    #[test]
    fn empty_message_counts_as_absent() {
        let envelope = normalize(&bytes(json!({"code": 1, "message": ""}))).unwrap();
        assert_eq!(envelope.message(), None);
        assert_eq!(envelope.data, None);
    }
}
