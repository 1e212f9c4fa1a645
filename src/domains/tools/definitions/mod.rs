//! Tool definitions module.
//!
//! Each tool is defined in its own file and exposes `NAME`, `DESCRIPTION`,
//! an `execute()` function and a `to_tool()` constructor.
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in a subdirectory (e.g., `text/my_tool.rs`)
//! 2. Define `execute()` and `to_tool()`
//! 3. Export it from the subdirectory's `mod.rs`
//! 4. Add it to [`builtin_tools`]

pub mod text;

pub use text::{CountWordsTool, EchoTool, ReverseTool, UppercaseTool, WordCount};

use super::{Tool, ToolError, ToolRegistry};

/// Every tool shipped with the server, in listing order.
pub fn builtin_tools() -> Result<Vec<Tool>, ToolError> {
    Ok(vec![
        EchoTool::to_tool()?,
        ReverseTool::to_tool()?,
        UppercaseTool::to_tool()?,
        CountWordsTool::to_tool()?,
    ])
}

/// Register every built-in tool.
pub fn register_builtin(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    for tool in builtin_tools()? {
        registry.register(tool)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tool_names() {
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry).unwrap();
        assert_eq!(
            registry.names(),
            vec!["echo", "reverse", "uppercase", "count_words"]
        );
    }

    #[test]
    fn test_registering_twice_is_a_duplicate() {
        let mut registry = ToolRegistry::new();
        register_builtin(&mut registry).unwrap();
        let err = register_builtin(&mut registry).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateTool(ref n) if n == "echo"));
    }
}
