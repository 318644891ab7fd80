//! Uniform tool response envelope.
//!
//! A successful call serializes as the tool's own payload object. A failed call
//! serializes as `{"error": {"type": ..., "message": ..., "details": ...}}`.
//! Both CLI and MCP emit this shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Error body carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error kind tag (`ValidationError`, `SessionNotFound`, model class name, ...).
    #[serde(rename = "type")]
    pub error_type: String,

    /// Human-readable description.
    pub message: String,

    /// Extra context for debugging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Response returned by every tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Present only when the call failed; other fields are then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,

    /// The tool payload, flattened into the top-level object.
    #[serde(flatten)]
    pub result: Map<String, Value>,
}

impl ToolResponse {
    /// Create a successful response from a serializable payload.
    ///
    /// Absent optional fields are dropped by the payload's own serde attributes.
    /// Non-object payloads are wrapped under `"result"`.
    pub fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => Self {
                error: None,
                result: map,
            },
            Ok(other) => {
                let mut map = Map::new();
                map.insert("result".to_string(), other);
                Self {
                    error: None,
                    result: map,
                }
            }
            Err(e) => Self::from_error(&ToolError::from(e)),
        }
    }

    /// Create an error response with an explicit kind tag.
    pub fn error(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: Some(ErrorBody {
                error_type: error_type.into(),
                message: message.into(),
                details: None,
            }),
            result: Map::new(),
        }
    }

    /// Create an error response from a [`ToolError`].
    pub fn from_error(err: &ToolError) -> Self {
        let mut response = Self::error(err.type_name(), err.message.clone());
        if let Some(details) = &err.details {
            response = response.with_details(details.clone());
        }
        response
    }

    /// Add error details to the response. No effect on successful responses.
    pub fn with_details(mut self, details: Value) -> Self {
        if let Some(body) = self.error.as_mut() {
            body.details = Some(details);
        }
        self
    }

    /// Look up a payload field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.result.get(key)
    }

    /// Convert the response to a JSON Value.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Error kind tag, if this is an error response.
    pub fn error_type(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.error_type.as_str())
    }

    /// Error message, if this is an error response.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

impl From<ToolError> for ToolResponse {
    fn from(err: ToolError) -> Self {
        Self::from_error(&err)
    }
}

impl<T: Serialize> From<Result<T, ToolError>> for ToolResponse {
    fn from(result: Result<T, ToolError>) -> Self {
        match result {
            Ok(value) => Self::ok(&value),
            Err(err) => Self::from_error(&err),
        }
    }
}

/// Extract and deserialize a tool input from a JSON Value.
///
/// Deserialization failures become `ValidationError` responses so handlers can
/// return early:
/// ```ignore
/// let parsed: SetInputsInput = match extract_input(input) {
///     Ok(v) => v,
///     Err(e) => return e,
/// };
/// ```
pub fn extract_input<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ToolResponse> {
    serde_json::from_value(value).map_err(|e| {
        ToolResponse::from_error(&ToolError::validation(format!("Invalid input: {}", e)))
    })
}

/// Metadata that can be attached to tool invocations under `_meta`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolMeta {
    /// Reason for the tool invocation (for logging/debugging).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Unique request ID for tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Tags for categorization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;

    #[test]
    fn test_ok_response_is_flat() {
        let response = ToolResponse::ok(&serde_json::json!({"value": 42}));
        assert!(response.is_ok());
        let json = response.to_json();
        assert_eq!(json["value"], 42);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = ToolError::session_not_found("abc").with_details(serde_json::json!("gone"));
        let json = ToolResponse::from_error(&err).to_json();
        assert_eq!(json["error"]["type"], "SessionNotFound");
        assert_eq!(json["error"]["message"], "Session 'abc' not found");
        assert_eq!(json["error"]["details"], "gone");
        assert_eq!(json.as_object().map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_details_omitted_when_absent() {
        let json = ToolResponse::error("ValidationError", "bad").to_json();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_from_result() {
        let ok: Result<_, ToolError> = Ok(serde_json::json!({"success": true}));
        assert_eq!(ToolResponse::from(ok).get("success"), Some(&Value::Bool(true)));

        let err: Result<Value, ToolError> = Err(ToolError::new(ErrorKind::UnknownTool, "nope"));
        assert_eq!(ToolResponse::from(err).error_type(), Some("UnknownTool"));
    }

    #[test]
    fn test_extract_input_reports_validation_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Input {
            session_id: String,
        }

        let err = extract_input::<Input>(serde_json::json!({})).unwrap_err();
        assert_eq!(err.error_type(), Some("ValidationError"));
        assert!(err.error_message().unwrap().contains("session_id"));
    }

    #[test]
    fn test_round_trip_keeps_error_out_of_payload() {
        let text = r#"{"error":{"type":"LookupError","message":"Unknown output: Fn"}}"#;
        let parsed: ToolResponse = serde_json::from_str(text).unwrap();
        assert_eq!(parsed.error_type(), Some("LookupError"));
        assert!(parsed.result.is_empty());
    }
}
