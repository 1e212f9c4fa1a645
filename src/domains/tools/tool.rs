//! Tool definitions as held by the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::error::ToolError;
use super::handlers::{FnHandler, HandlerResult, ToolHandler};
use super::schema::{ParamSpec, ParamType, input_schema};
use super::validator::Arguments;

/// A named, schema-typed callable exposed by the server.
///
/// Tools are immutable once built. The registry hands out `Arc<Tool>`.
pub struct Tool {
    name: String,
    description: Option<String>,
    params: Vec<ParamSpec>,
    returns: ParamType,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Start building a tool with the given name.
    pub fn builder(name: impl Into<String>) -> ToolBuilder {
        ToolBuilder {
            name: name.into(),
            description: None,
            params: Vec::new(),
            returns: ParamType::String,
            handler: None,
        }
    }

    /// The unique tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Declared return type tag.
    pub fn returns(&self) -> ParamType {
        self.returns
    }

    /// The handler implementing this tool.
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }

    /// Metadata advertised through `tools/list`.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: input_schema(&self.params),
            output_schema: serde_json::json!({ "type": self.returns.as_str() }),
        }
    }

    // Checked at registration so a broken definition never reaches a caller.
    pub(super) fn check_definition(&self) -> Result<(), ToolError> {
        if self.name.trim().is_empty() {
            return Err(ToolError::invalid_definition(
                &self.name,
                "tool name must not be empty",
            ));
        }

        let mut seen = HashSet::new();
        for param in &self.params {
            if !seen.insert(param.name.as_str()) {
                return Err(ToolError::invalid_definition(
                    &self.name,
                    format!("parameter '{}' declared twice", param.name),
                ));
            }
            if let Some(default) = &param.default {
                if !param.param_type.matches(default) {
                    return Err(ToolError::invalid_definition(
                        &self.name,
                        format!(
                            "default for '{}' is not a {}",
                            param.name, param.param_type
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Tool`].
pub struct ToolBuilder {
    name: String,
    description: Option<String>,
    params: Vec<ParamSpec>,
    returns: ParamType,
    handler: Option<Arc<dyn ToolHandler>>,
}

impl ToolBuilder {
    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a required parameter.
    pub fn param(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.spec(ParamSpec::required(name, param_type))
    }

    /// Declare an optional parameter.
    pub fn optional(self, name: impl Into<String>, param_type: ParamType) -> Self {
        self.spec(ParamSpec::optional(name, param_type))
    }

    /// Declare a parameter from a full spec.
    pub fn spec(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Declare the return type tag. Defaults to `string`.
    pub fn returns(mut self, returns: ParamType) -> Self {
        self.returns = returns;
        self
    }

    /// Use an async handler.
    pub fn handler(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Use a synchronous function as the handler.
    pub fn sync_handler<F>(self, func: F) -> Self
    where
        F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.handler(FnHandler::new(func))
    }

    /// Finish the tool.
    ///
    /// Fails when no handler was supplied.
    pub fn build(self) -> Result<Tool, ToolError> {
        let handler = self
            .handler
            .ok_or_else(|| ToolError::invalid_definition(&self.name, "no handler supplied"))?;

        Ok(Tool {
            name: self.name,
            description: self.description,
            params: self.params,
            returns: self.returns,
            handler,
        })
    }
}

/// Tool metadata as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// The unique name of the tool.
    pub name: String,
    /// A human-readable description of the tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
    /// JSON Schema for the tool's result.
    pub output_schema: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn noop(_: &Arguments) -> HandlerResult {
        Ok(Value::Null)
    }

    #[test]
    fn test_build_tool() {
        let tool = Tool::builder("greet")
            .description("Say hello")
            .param("name", ParamType::String)
            .optional("excited", ParamType::Boolean)
            .returns(ParamType::String)
            .sync_handler(noop)
            .build()
            .unwrap();

        assert_eq!(tool.name(), "greet");
        assert_eq!(tool.description(), Some("Say hello"));
        assert_eq!(tool.params().len(), 2);
        assert!(tool.params()[0].required);
        assert!(!tool.params()[1].required);
        assert!(tool.check_definition().is_ok());
    }

    #[test]
    fn test_build_without_handler_fails() {
        let err = Tool::builder("broken").build().unwrap_err();
        assert!(matches!(err, ToolError::InvalidDefinition { .. }));
    }

    #[test]
    fn test_duplicate_param_rejected() {
        let tool = Tool::builder("dup")
            .param("x", ParamType::String)
            .param("x", ParamType::Number)
            .sync_handler(noop)
            .build()
            .unwrap();
        assert!(matches!(
            tool.check_definition(),
            Err(ToolError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn test_default_type_checked() {
        let tool = Tool::builder("bad_default")
            .spec(ParamSpec::optional("n", ParamType::Number).with_default(json!("one")))
            .sync_handler(noop)
            .build()
            .unwrap();
        assert!(tool.check_definition().is_err());
    }

    #[test]
    fn test_descriptor_serialization() {
        let tool = Tool::builder("echo")
            .description("Echo back")
            .param("message", ParamType::String)
            .sync_handler(noop)
            .build()
            .unwrap();

        let json = serde_json::to_value(tool.descriptor()).unwrap();
        assert_eq!(json["name"], "echo");
        assert_eq!(json["inputSchema"]["required"], json!(["message"]));
        assert_eq!(json["outputSchema"]["type"], "string");
    }
}
