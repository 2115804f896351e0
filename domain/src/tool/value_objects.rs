//! Tool response envelope
//!
//! Every tool call produces a [`ToolResponse`]: a `status` plus free-form
//! fields flattened beside it, i.e. `{"status": "error", "message": "..."}`.
//! Tools never raise past their boundary; failure is always a response.

use crate::core::error::ErrorInfo;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub status: ToolStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ToolResponse {
    pub fn success() -> Self {
        Self {
            status: ToolStatus::Success,
            fields: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::String(message.into()));
        Self {
            status: ToolStatus::Error,
            fields,
        }
    }

    /// Error for an action outside the tool's closed set
    pub fn unknown_action(action: &str, valid_actions: &[&str]) -> Self {
        Self::error(format!("Unknown action: {}", action)).with(
            "valid_actions",
            Value::Array(
                valid_actions
                    .iter()
                    .map(|a| Value::String(a.to_string()))
                    .collect(),
            ),
        )
    }

    pub fn missing_param(action: &str, param: &str) -> Self {
        Self::error(format!("Missing required parameter '{}' for {}", param, action))
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn message(&self) -> Option<&str> {
        self.get("message").and_then(Value::as_str)
    }

    /// Fields as a JSON object, without `status`
    pub fn into_payload(self) -> Value {
        Value::Object(self.fields)
    }

    /// `TOOL_ERROR` describing this response (meaningful for error responses).
    pub fn to_error_info(&self, tool: &str) -> ErrorInfo {
        let message = self.message().unwrap_or("tool call failed");
        ErrorInfo::tool_error(format!("{}: {}", tool, message))
            .with_details(Value::Object(self.fields.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_fields_flatten_beside_status() {
        let resp = ToolResponse::success().with("tables", json!(["users"]));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, json!({"status": "success", "tables": ["users"]}));

        let back: ToolResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_unknown_action_lists_valid_actions() {
        let resp =
            ToolResponse::unknown_action("drop_everything", &["list_tables", "execute_query"]);
        assert!(!resp.is_success());
        assert_eq!(resp.get("valid_actions"), Some(&json!(["list_tables", "execute_query"])));
        assert_eq!(resp.message(), Some("Unknown action: drop_everything"));
    }

    #[test]
    fn test_to_error_info() {
        let info = ToolResponse::error("no such table: ghosts").to_error_info("database");
        assert_eq!(info.code, ErrorKind::ToolError);
        assert_eq!(info.message, "database: no such table: ghosts");
        assert!(info.details.is_some());
    }
}
