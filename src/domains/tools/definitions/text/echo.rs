//! Echo tool definition.
//!
//! Returns the supplied message unchanged.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domains::tools::{Arguments, HandlerResult, ParamType, Tool, ToolError};

/// Echo tool - returns the message it was given.
pub struct EchoTool;

impl EchoTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "echo";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Echo back the provided message";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub fn execute(args: &Arguments) -> HandlerResult {
        let message = args.get_str("message")?;
        debug!("Echoing {} bytes", message.len());
        Ok(Value::from(message))
    }

    /// Build the registrable tool.
    pub fn to_tool() -> Result<Tool, ToolError> {
        Tool::builder(Self::NAME)
            .description(Self::DESCRIPTION)
            .param("message", ParamType::String)
            .returns(ParamType::String)
            .sync_handler(Self::execute)
            .build()
    }
}
