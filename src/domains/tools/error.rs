//! Tool-specific error types.

use std::time::Duration;

use thiserror::Error;

use super::validator::ValidationError;
use crate::core::protocol::ErrorCode;

/// Errors that can occur during tool registration and invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// A tool with the same name is already registered.
    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    /// The registry has been sealed; no further tools may be added.
    #[error("Registration closed: cannot register '{0}' after the server has started")]
    RegistrationClosed(String),

    /// The tool definition itself is inconsistent.
    #[error("Invalid definition for tool '{tool}': {reason}")]
    InvalidDefinition {
        /// Name of the offending tool.
        tool: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The supplied arguments do not satisfy the tool's parameter schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] ValidationError),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool did not finish within the configured timeout.
    #[error("Tool execution timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid definition" error.
    pub fn invalid_definition(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// The wire error code reported to callers for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::ToolNotFound,
            Self::InvalidArguments(_) => ErrorCode::InvalidArguments,
            Self::Timeout(_) => ErrorCode::ToolTimeout,
            Self::ExecutionFailed(_) => ErrorCode::ToolExecutionError,
            Self::DuplicateTool(_)
            | Self::RegistrationClosed(_)
            | Self::InvalidDefinition { .. } => ErrorCode::InternalError,
        }
    }

    /// Structured detail attached to the error response, if any.
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::InvalidArguments(detail) => serde_json::to_value(detail).ok(),
            Self::Timeout(limit) => Some(serde_json::json!({
                "timeout_ms": u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
            })),
            _ => None,
        }
    }

    /// The message reported to callers.
    ///
    /// Execution failures carry the handler's own message verbatim.
    pub fn client_message(&self) -> String {
        match self {
            Self::ExecutionFailed(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
