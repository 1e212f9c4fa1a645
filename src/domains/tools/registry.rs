//! Tool Registry - central registration and lookup for all tools.
//!
//! The registry is populated while the server is being built. Building the
//! server seals it, after which it is shared read-only behind an `Arc` and
//! needs no locking on the request path.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ToolError;
use super::tool::{Tool, ToolDescriptor};

/// Registry of available tools.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<Tool>>,
    /// Names in registration order, for stable listings.
    order: Vec<String>,
    sealed: bool,
}

impl ToolRegistry {
    /// Create an empty, open registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails if a tool with the same name exists, if the registry is sealed,
    /// or if the tool's definition is inconsistent.
    pub fn register(&mut self, tool: Tool) -> Result<(), ToolError> {
        if self.sealed {
            return Err(ToolError::RegistrationClosed(tool.name().to_string()));
        }
        if self.tools.contains_key(tool.name()) {
            return Err(ToolError::DuplicateTool(tool.name().to_string()));
        }
        tool.check_definition()?;

        info!("Registering tool: {}", tool.name());
        let name = tool.name().to_string();
        self.order.push(name.clone());
        self.tools.insert(name, Arc::new(tool));
        Ok(())
    }

    /// Close the registry to further registration.
    pub fn seal(&mut self) {
        debug!("Sealing tool registry with {} tools", self.tools.len());
        self.sealed = true;
    }

    /// Whether the registry has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<Tool>, ToolError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// All tool names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    /// Metadata for every tool in registration order.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tool is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
