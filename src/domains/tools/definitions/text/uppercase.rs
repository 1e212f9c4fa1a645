//! Uppercase tool definition.

use serde_json::Value;

use crate::domains::tools::{Arguments, HandlerResult, ParamType, Tool, ToolError};

/// Uppercase tool - converts text to upper case.
pub struct UppercaseTool;

impl UppercaseTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "uppercase";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Convert text to uppercase";

    /// Execute the tool logic.
    pub fn execute(args: &Arguments) -> HandlerResult {
        Ok(Value::from(args.get_str("text")?.to_uppercase()))
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

    #[test]
    fn test_uppercase() {
        let tool = UppercaseTool::to_tool().unwrap();
        let args = validate(
            tool.params(),
            json!({ "text": "Hello, straße" }).as_object().unwrap(),
        )
        .unwrap();
        assert_eq!(UppercaseTool::execute(&args).unwrap(), json!("HELLO, STRASSE"));
    }
}
