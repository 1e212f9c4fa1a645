//! Echo MCP Server Library
//!
//! A small Model Context Protocol (MCP) server that exposes named tools over
//! JSON-RPC 2.0. Clients call tools concurrently; arguments are validated
//! against each tool's declared parameters and every call runs under a
//! timeout.
//!
//! # Architecture
//!
//! - **core**: wire protocol, connection sessions, the server and its transports
//!   (HTTP/SSE, stdio, TCP), configuration and error handling
//! - **domains**
//!   - **tools**: tool registry, argument validation, dispatch and the
//!     builtin text tools
//!
//! # Example
//!
//! ```rust,no_run
//! use echo_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::builder(config.clone())
//!         .with_builtin_tools()?
//!         .build();
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, McpServerBuilder, Result};
