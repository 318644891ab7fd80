//! Error taxonomy shared by every tool.
//!
//! | Kind | Tag | Raised when |
//! |------|-----|-------------|
//! | `Validation` | `ValidationError` | missing or malformed request fields |
//! | `SessionNotFound` | `SessionNotFound` | unknown or closed `session_id` |
//! | `SessionLimit` | `SessionLimitExceeded` | the store is at capacity |
//! | `Model` | model class name | a model handle call failed |
//! | `UnknownTool` | `UnknownTool` | dispatch given an unregistered name |
//! | `Internal` | `InternalError` | anything else (serialization, I/O) |

use serde_json::Value;

use crate::model::ModelError;

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Validation,
    SessionNotFound,
    SessionLimit,
    /// Carries the model's own class-name tag.
    Model(&'static str),
    UnknownTool,
    Internal,
}

impl ErrorKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::SessionNotFound => "SessionNotFound",
            ErrorKind::SessionLimit => "SessionLimitExceeded",
            ErrorKind::Model(tag) => tag,
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::Internal => "InternalError",
        }
    }
}

/// A tool-level failure, rendered into the `{error: {type, message, details}}` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Option<Value>,
}

impl ToolError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn session_not_found(session_id: &str) -> Self {
        Self::new(
            ErrorKind::SessionNotFound,
            format!("Session '{}' not found", session_id),
        )
    }

    pub fn unknown_tool(name: &str) -> Self {
        Self::new(ErrorKind::UnknownTool, format!("Unknown tool: {}", name))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.tag()
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.tag(), self.message)
    }
}

impl std::error::Error for ToolError {}

impl From<ModelError> for ToolError {
    fn from(err: ModelError) -> Self {
        ToolError::new(ErrorKind::Model(err.type_name()), err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

/// Reject empty session identifiers before touching the store.
pub fn require_session_id(session_id: &str) -> Result<(), ToolError> {
    if session_id.trim().is_empty() {
        return Err(ToolError::validation("session_id is required"));
    }
    Ok(())
}
