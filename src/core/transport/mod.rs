//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **HTTP/SSE**: event stream for responses, POST endpoint for requests - feature: `http`
//! - **STDIO**: newline-delimited JSON on stdin/stdout - feature: `stdio`
//! - **TCP**: newline-delimited JSON over raw TCP sockets - feature: `tcp`
//!
//! Each transport owns the byte-level I/O and connection lifecycle. It
//! registers connections with the server's session manager, hands every
//! inbound message to [`McpServer::submit`](crate::core::McpServer::submit)
//! and writes whatever the connection's outbound queue yields.

mod config;
mod error;
#[cfg(any(feature = "stdio", feature = "tcp"))]
mod lines;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

// Re-export configs for convenience
#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
