//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type that can represent errors from
//! all domains and external dependencies.

use thiserror::Error;

use super::session::SessionError;
use super::transport::TransportError;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error from connection/session handling.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Error from a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::ToolError;

    fn register_twice() -> Result<()> {
        Err(ToolError::DuplicateTool("echo".into()))?
    }

    #[test]
    fn test_tool_error_converts() {
        let err = register_twice().unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::DuplicateTool(_))));
        assert_eq!(err.to_string(), "Tool error: Tool already registered: echo");
    }
}
