//! Canonical response envelope and the parser that normalizes arbitrary backend
//! bodies into it. Backends are inconsistent: some omit `success`, some return the
//! payload at the top level, some send no body at all. [`ApiResponse::from_body`]
//! absorbs those differences once; [`ApiResponse::decode`] then turns an envelope
//! into an explicit `Result` so callers never guess what "success" means.

use super::ApiError;
use chrono::{SecondsFormat, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

/// Current time as an RFC 3339 / ISO-8601 UTC timestamp.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

impl ApiResponse<Value> {
    /// Parses a raw body read from the wire. An empty body is treated as `{}`;
    /// anything else must be JSON whatever the declared content type says.
    ///
    /// # Errors
    /// Returns `ApiError::Parse` naming the declared content type if the body is not JSON.
    pub fn from_body(body: &str, content_type: &str) -> Result<Self, ApiError> {
        if body.trim().is_empty() {
            return Ok(Self::from_value(Value::Object(Map::new())));
        }

        serde_json::from_str::<Value>(body)
            .map(Self::from_value)
            .map_err(|err| {
                ApiError::Parse(format!(
                    "expected a JSON body but could not parse it (content-type: {content_type}): {err}"
                ))
            })
    }

    /// Normalizes a parsed JSON value into the envelope.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let success = map.get("success").and_then(Value::as_bool).unwrap_or(true);
                let error = string_field(&map, "error");
                let message = string_field(&map, "message");
                let timestamp = string_field(&map, "timestamp").unwrap_or_else(now_timestamp);
                let data = if map.contains_key("data") {
                    map.get("data").filter(|value| !value.is_null()).cloned()
                } else {
                    Some(Value::Object(map))
                };

                Self {
                    success,
                    data,
                    error,
                    message,
                    timestamp,
                }
            }
            other => Self {
                success: true,
                data: Some(other),
                error: None,
                message: None,
                timestamp: now_timestamp(),
            },
        }
    }

    /// The first non-empty of `error` and `message`.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        [self.error.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }

    /// Converts the envelope into the caller's type.
    ///
    /// # Errors
    /// Returns `ApiError::Rejected` when the backend reported `success: false`,
    /// and `ApiError::Parse` when there is no data or it does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error_message()
                    .unwrap_or("request was not successful")
                    .to_string(),
            ));
        }

        let data = self
            .data
            .ok_or_else(|| ApiError::Parse("response envelope carried no data".to_string()))?;

        serde_json::from_value(data)
            .map_err(|err| ApiError::Parse(format!("failed to decode response data: {err}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn empty_body_becomes_successful_empty_object() {
        let envelope = ApiResponse::from_body("", "application/json").unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!({})));
        assert!(DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
    }

    #[test]
    fn json_is_parsed_without_content_type() {
        let envelope = ApiResponse::from_body(r#"{"data": {"id": "u1"}}"#, "text/plain").unwrap();
        assert_eq!(envelope.data, Some(json!({"id": "u1"})));
    }

    #[test]
    fn non_json_names_declared_content_type() {
        let err = ApiResponse::from_body("<html>oops</html>", "text/html").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
        assert!(err.to_string().contains("text/html"));
    }

    #[test]
    fn object_without_data_key_becomes_its_own_data() {
        let envelope = ApiResponse::from_value(json!({"id": "u1", "timestamp": "2024-01-01T00:00:00Z"}));
        assert!(envelope.success);
        assert_eq!(
            envelope.data,
            Some(json!({"id": "u1", "timestamp": "2024-01-01T00:00:00Z"}))
        );
        assert_eq!(envelope.timestamp, "2024-01-01T00:00:00Z");
    }

    #[test]
    fn explicit_fields_are_kept() {
        let envelope = ApiResponse::from_value(json!({
            "success": false,
            "data": null,
            "error": "denied",
            "message": "no access",
        }));
        assert!(!envelope.success);
        assert_eq!(envelope.data, None);
        assert_eq!(envelope.error.as_deref(), Some("denied"));
        assert_eq!(envelope.error_message(), Some("denied"));
    }

    #[test]
    fn non_objects_are_wrapped_as_data() {
        let envelope = ApiResponse::from_value(json!([1, 2, 3]));
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(json!([1, 2, 3])));

        let envelope = ApiResponse::from_body("\"pong\"", "application/json").unwrap();
        assert_eq!(envelope.data, Some(json!("pong")));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Company {
        id: String,
    }

    #[test]
    fn decode_distinguishes_rejection_from_missing_data() {
        let ok = ApiResponse::from_value(json!({"success": true, "data": {"id": "c1"}}));
        assert_eq!(
            ok.decode::<Company>().unwrap(),
            Company {
                id: "c1".to_string()
            }
        );

        let rejected = ApiResponse::from_value(json!({"success": false, "message": "quota"}));
        assert_eq!(
            rejected.decode::<Company>().unwrap_err(),
            ApiError::Rejected("quota".to_string())
        );

        let empty = ApiResponse::from_value(json!({"success": true, "data": null}));
        assert!(matches!(empty.decode::<Company>(), Err(ApiError::Parse(_))));
    }
}
