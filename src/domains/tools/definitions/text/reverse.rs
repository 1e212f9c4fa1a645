//! Reverse tool definition.

use serde_json::Value;

use crate::domains::tools::{Arguments, HandlerResult, ParamType, Tool, ToolError};

/// Reverse tool - reverses text character by character.
pub struct ReverseTool;

impl ReverseTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "reverse";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Reverse the provided text";

    /// Execute the tool logic.
    ///
    /// Reverses by Unicode scalar value, so multi-byte characters stay intact.
    pub fn execute(args: &Arguments) -> HandlerResult {
        let text = args.get_str("text")?;
        Ok(Value::from(text.chars().rev().collect::<String>()))
    }

    /// Build the registrable tool.
    pub fn to_tool() -> Result<Tool, ToolError> {
        Tool::builder(Self::NAME)
            .description(Self::DESCRIPTION)
            .param("text", ParamType::String)
            .returns(ParamType::String)
            .sync_handler(Self::execute)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::validate;
    use serde_json::json;

    fn run(text: &str) -> Value {
        let tool = ReverseTool::to_tool().unwrap();
        let args = validate(tool.params(), json!({ "text": text }).as_object().unwrap()).unwrap();
        ReverseTool::execute(&args).unwrap()
    }

    #[test]
    fn test_reverse_ascii() {
        assert_eq!(run("hello"), json!("olleh"));
    }

    #[test]
    fn test_reverse_multibyte() {
        assert_eq!(run("añb→"), json!("→bña"));
    }
}
