//! Domain error types and the user-visible error taxonomy.
//!
//! [`ErrorKind`] is the stable set of codes every error result carries.
//! [`ErrorInfo`] is the serializable envelope (code + message) that travels
//! inside [`AgentResult`](crate::agent::value_objects::AgentResult) and
//! [`OrchestrationResult`](crate::orchestration::value_objects::OrchestrationResult).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Stable error codes exposed to callers.
///
/// | Code | Raised when |
/// |------|-------------|
/// | `INVALID_INPUT` | Empty or malformed query, detected before any model/tool call |
/// | `AGENT_UNAVAILABLE` | A required specialist agent is missing from the registry |
/// | `AGENT_ERROR` | A specialist agent failed internally (wrapped) |
/// | `TOOL_ERROR` | A tool returned `status: "error"`; only ever seen as a cause |
/// | `INVALID_MODE` | Unknown processing mode name |
/// | `TIMEOUT` | The orchestration deadline elapsed |
/// | `PARSE_ERROR` | LLM output was not valid structured output and no fallback applied |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    AgentUnavailable,
    AgentError,
    ToolError,
    InvalidMode,
    Timeout,
    ParseError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::AgentUnavailable => "AGENT_UNAVAILABLE",
            ErrorKind::AgentError => "AGENT_ERROR",
            ErrorKind::ToolError => "TOOL_ERROR",
            ErrorKind::InvalidMode => "INVALID_MODE",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ParseError => "PARSE_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error envelope carried by failed agent and orchestration results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable code from the taxonomy
    pub code: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Structured details (e.g. the failing tool's response)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// Underlying error, e.g. a `TOOL_ERROR` inside an `AGENT_ERROR`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            cause: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn agent_unavailable(agent_id: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::AgentUnavailable,
            format!("Agent not registered: {}", agent_id.as_ref()),
        )
    }

    pub fn agent_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AgentError, message)
    }

    pub fn tool_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ToolError, message)
    }

    pub fn invalid_mode(mode: impl AsRef<str>) -> Self {
        Self::new(
            ErrorKind::InvalidMode,
            format!("Invalid processing mode: {}", mode.as_ref()),
        )
    }

    pub fn timeout(after_ms: u128) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Orchestration deadline exceeded after {}ms", after_ms),
        )
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_cause(mut self, cause: ErrorInfo) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The innermost cause, or `self` when there is none.
    pub fn root_cause(&self) -> &ErrorInfo {
        let mut current = self;
        while let Some(cause) = current.cause.as_deref() {
            current = cause;
        }
        current
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by {})", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorInfo {}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid processing mode: {0}")]
    InvalidMode(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid route chain: {0}")]
    InvalidRoute(String),
}

impl From<&DomainError> for ErrorInfo {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::InvalidMode(mode) => ErrorInfo::invalid_mode(mode),
            DomainError::InvalidQuery(msg) => ErrorInfo::invalid_input(msg.clone()),
            DomainError::InvalidRoute(msg) => ErrorInfo::invalid_input(msg.clone()),
        }
    }
}
