//! STDIO transport implementation.
//!
//! One connection over stdin/stdout, one JSON message per line. Logs go to
//! stderr so stdout carries protocol traffic only.

use tracing::info;

use super::TransportResult;
use super::lines::{OnEof, serve_lines};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    ///
    /// Closing stdin ends the session after every request already read has
    /// been answered.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        serve_lines(server, tokio::io::stdin(), tokio::io::stdout(), OnEof::Drain).await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
