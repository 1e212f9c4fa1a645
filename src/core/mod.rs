//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server:
//! wire protocol types, error handling, configuration, connection management,
//! the server itself and the transport layer.

pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::{McpServer, McpServerBuilder};
pub use session::{ConnectionId, ConnectionState, SessionError, SessionManager};
pub use transport::{TransportConfig, TransportService};
