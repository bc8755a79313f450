//! Classification of transport-level failures (network errors and non-2xx).

use reqwest::StatusCode;
use serde_json::Value;

/// What is known about a call that did not produce a 2xx response
#[derive(Debug, Clone)]
pub struct TransportFailure {
    pub status: Option<StatusCode>,
    pub body: Option<Value>,
    pub description: String,
}

impl TransportFailure {
    /// Non-2xx response; the body is kept only when it is JSON
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        Self {
            status: Some(status),
            body: serde_json::from_slice(body).ok(),
            description: format!("Request failed with status code {}", status.as_u16()),
        }
    }

    /// The request never produced a response
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let description = if error.is_timeout() {
            "Request timed out".to_string()
        } else if error.is_connect() {
            format!("Network error: {}", error)
        } else {
            error.to_string()
        };

        Self {
            status: error.status(),
            body: None,
            description,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(StatusCode::UNAUTHORIZED)
    }

    /// First non-empty of: body `error`, body `message`, transport
    /// description, `fallback`. Exactly one source is used.
    pub fn message(&self, fallback: &str) -> String {
        let from_body = |field: &str| {
            self.body
                .as_ref()
                .and_then(|b| b.get(field))
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        };

        from_body("error")
            .or_else(|| from_body("message"))
            .or_else(|| Some(self.description.as_str()).filter(|s| !s.trim().is_empty()))
            .unwrap_or(fallback)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure(body: Option<Value>, description: &str) -> TransportFailure {
        TransportFailure {
            status: Some(StatusCode::BAD_REQUEST),
            body,
            description: description.to_string(),
        }
    }

    #[test]
    fn error_field_wins_over_message() {
        let f = failure(Some(json!({"error": "Invalid class ID", "message": "ignored"})), "desc");
        assert_eq!(f.message("Request failed"), "Invalid class ID");
    }

    #[test]
    fn message_field_used_when_error_absent_or_blank() {
        let f = failure(Some(json!({"error": "  ", "message": "Class not found"})), "desc");
        assert_eq!(f.message("Request failed"), "Class not found");
    }

    #[test]
    fn description_then_fallback() {
        assert_eq!(failure(Some(json!({"code": 500})), "boom").message("Request failed"), "boom");
        assert_eq!(failure(None, "").message("Request failed"), "Request failed");
    }

    #[test]
    fn non_string_fields_are_skipped() {
        let f = failure(Some(json!({"error": {"detail": 1}, "message": 42})), "desc");
        assert_eq!(f.message("Request failed"), "desc");
    }

    #[test]
    fn status_failure_keeps_json_body_only() {
        let json_body = TransportFailure::from_status(StatusCode::NOT_FOUND, br#"{"error":"gone"}"#);
        assert_eq!(json_body.body, Some(json!({"error": "gone"})));
        assert_eq!(json_body.description, "Request failed with status code 404");

        let html = TransportFailure::from_status(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert!(html.body.is_none());
        assert!(!html.is_unauthorized());
        assert!(TransportFailure::from_status(StatusCode::UNAUTHORIZED, b"").is_unauthorized());
    }
}
