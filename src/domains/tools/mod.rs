//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients.
//!
//! ## Architecture
//!
//! - `definitions/` - Built-in tool implementations (one file per tool)
//! - `schema.rs` - Parameter type tags and JSON Schema generation
//! - `tool.rs` - The `Tool` definition and its builder
//! - `handlers.rs` - The `ToolHandler` trait and sync adapter
//! - `registry.rs` - Name to tool mapping, sealed before serving
//! - `validator.rs` - Schema-driven argument validation
//! - `dispatcher.rs` - Lookup, validation, timed invocation, response packaging
//! - `error.rs` - Tool-specific error types

pub mod definitions;
mod dispatcher;
mod error;
mod handlers;
mod registry;
mod schema;
mod tool;
mod validator;

pub use dispatcher::{CallRequest, CallResponse, Dispatcher};
pub use error::ToolError;
pub use handlers::{FnHandler, HandlerResult, ToolHandler};
pub use registry::ToolRegistry;
pub use schema::{ParamSpec, ParamType, input_schema};
pub use tool::{Tool, ToolBuilder, ToolDescriptor};
pub use validator::{Arguments, TypeMismatch, ValidationError, validate};
