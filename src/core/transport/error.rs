//! Transport error types.

use thiserror::Error;

use crate::core::session::SessionError;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors that can occur in transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to bind to address.
    #[error("Failed to bind to {address}: {source}")]
    BindError {
        /// The address that could not be bound.
        address: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The session layer rejected a connection operation.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO error during transport.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP-specific error.
    #[error("HTTP error: {0}")]
    HttpError(String),
}

impl TransportError {
    /// Create a bind error.
    pub fn bind(address: impl Into<String>, source: std::io::Error) -> Self {
        Self::BindError {
            address: address.into(),
            source,
        }
    }

    /// Create an HTTP error.
    pub fn http(msg: impl Into<String>) -> Self {
        Self::HttpError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::ConnectionId;

    #[test]
    fn test_session_error_converts() {
        let id = ConnectionId::new();
        let err: TransportError = SessionError::UnknownConnection(id).into();
        assert!(matches!(err, TransportError::Session(_)));
        assert_eq!(err.to_string(), format!("Session error: Unknown connection: {id}"));
    }
}
