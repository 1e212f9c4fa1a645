//! Word count tool definition.
//!
//! Counts whitespace-separated words and characters in a piece of text.

use serde::Serialize;
use tracing::instrument;

use crate::domains::tools::{Arguments, HandlerResult, ParamType, Tool, ToolError};

// ============================================================================
// Output Structure
// ============================================================================

/// Result of counting a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordCount {
    /// Number of whitespace-separated words.
    pub word_count: usize,
    /// Number of characters, spaces included.
    pub character_count: usize,
    /// Number of characters once ASCII spaces are removed.
    pub character_count_no_spaces: usize,
}

impl WordCount {
    /// Count `text`.
    pub fn of(text: &str) -> Self {
        Self {
            word_count: text.split_whitespace().count(),
            character_count: text.chars().count(),
            // Only the plain space is excluded; tabs and newlines still count.
            character_count_no_spaces: text.chars().filter(|c| *c != ' ').count(),
        }
    }
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Word count tool.
pub struct CountWordsTool;

impl CountWordsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "count_words";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Count words in the provided text";

    /// Execute the tool logic.
    #[instrument(skip_all)]
    pub fn execute(args: &Arguments) -> HandlerResult {
        let counts = WordCount::of(args.get_str("text")?);
        serde_json::to_value(counts).map_err(|e| ToolError::execution_failed(e.to_string()))
    }

    /// Build the registrable tool.
    pub fn to_tool() -> Result<Tool, ToolError> {
        Tool::builder(Self::NAME)
            .description(Self::DESCRIPTION)
            .param("text", ParamType::String)
            .returns(ParamType::Object)
            .sync_handler(Self::execute)
            .build()
    }
}
