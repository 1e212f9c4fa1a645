//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] routes JSON-RPC messages to their handlers. Tool calls go
//! through the [`Dispatcher`]; responses are queued on the originating
//! connection through the [`SessionManager`].
//!
//! The server is assembled with [`McpServerBuilder`]: tools are registered
//! first, then `build()` seals the registry. After that the server is a cheap
//! `Clone` handle that transports share by value.

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::protocol::{
    CallToolParams, ErrorCode, InitializeParams, InitializeResult, Notification,
    PROTOCOL_VERSION, Request, Response, ServerInfo,
};
use super::session::{ConnectionId, SessionError, SessionManager};
use crate::domains::tools::{
    CallRequest, Dispatcher, Tool, ToolDescriptor, ToolError, ToolRegistry, definitions,
};

/// Builder collecting tools before the server starts serving.
pub struct McpServerBuilder {
    config: Config,
    registry: ToolRegistry,
}

impl McpServerBuilder {
    /// Register a tool. Fails on a duplicate name.
    pub fn register(&mut self, tool: Tool) -> Result<&mut Self, ToolError> {
        self.registry.register(tool)?;
        Ok(self)
    }

    /// Register a tool, consuming and returning the builder.
    pub fn tool(mut self, tool: Tool) -> Result<Self, ToolError> {
        self.registry.register(tool)?;
        Ok(self)
    }

    /// Register the built-in text tools (echo, reverse, uppercase, count_words).
    pub fn with_builtin_tools(mut self) -> Result<Self, ToolError> {
        definitions::register_builtin(&mut self.registry)?;
        Ok(self)
    }

    /// Seal the registry and produce the server.
    pub fn build(mut self) -> McpServer {
        self.registry.seal();
        info!("Server built with {} tools", self.registry.len());

        let timeout = self.config.dispatch.call_timeout();
        let outbound_capacity = self.config.sessions.outbound_capacity;
        let registry = Arc::new(self.registry);

        McpServer {
            config: Arc::new(self.config),
            dispatcher: Arc::new(Dispatcher::new(registry, timeout)),
            sessions: Arc::new(SessionManager::with_outbound_capacity(outbound_capacity)),
        }
    }
}

/// The main MCP server handle.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool call dispatcher over the sealed registry.
    dispatcher: Arc<Dispatcher>,

    /// Open client connections.
    sessions: Arc<SessionManager>,
}

impl McpServer {
    /// Start building a server with the given configuration.
    pub fn builder(config: Config) -> McpServerBuilder {
        McpServerBuilder {
            config,
            registry: ToolRegistry::new(),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The connection manager shared with transports.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Metadata of every registered tool.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.dispatcher.registry().list()
    }

    /// Accept one raw inbound message on a connection.
    ///
    /// The message is handled on its own task; its response, if any, is
    /// queued on the same connection when it completes. Fails only if the
    /// connection cannot accept requests.
    pub async fn submit(&self, connection: ConnectionId, raw: &str) -> Result<(), SessionError> {
        let ticket = self.sessions.accept(connection).await?;

        let message: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Unparseable message on {}: {}", connection, e);
                ticket.deliver(Response::error(
                    None,
                    ErrorCode::ParseError,
                    format!("Parse error: {}", e),
                ));
                return Ok(());
            }
        };

        // Only single request objects are served; batches are rejected whole.
        if !message.is_object() {
            let reason = if message.is_array() {
                "batch requests are not supported"
            } else {
                "expected a JSON object"
            };
            warn!("Invalid request on {}: {}", connection, reason);
            ticket.deliver(Response::error(
                None,
                ErrorCode::InvalidRequest,
                format!("Invalid request: {}", reason),
            ));
            return Ok(());
        }

        // No id means a notification: handled, never answered.
        if message.get("id").is_none() {
            drop(ticket);
            self.handle_notification(message);
            return Ok(());
        }

        // Keep the id if it is usable even when the rest of the message is not.
        let id = message
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok());

        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(e) => {
                warn!("Invalid request on {}: {}", connection, e);
                ticket.deliver(Response::error(
                    id,
                    ErrorCode::InvalidRequest,
                    format!("Invalid request: {}", e),
                ));
                return Ok(());
            }
        };

        let server = self.clone();
        tokio::spawn(async move {
            let response = server.handle_request(request).await;
            ticket.deliver(response);
        });

        Ok(())
    }

    /// Route a parsed request to its handler and produce the response.
    #[instrument(skip_all, fields(id = %request.id, method = %request.method))]
    pub async fn handle_request(&self, request: Request) -> Response {
        debug!("Handling request");

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request),
            "ping" => Response::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request),
            "tools/call" => self.handle_tools_call(request).await,
            _ => {
                warn!("Unknown method: {}", request.method);
                Response::method_not_found(request.id, &request.method)
            }
        }
    }

    fn handle_notification(&self, message: Value) {
        match serde_json::from_value::<Notification>(message) {
            Ok(notification) => match notification.method.as_str() {
                "notifications/initialized" => info!("MCP client initialized"),
                "notifications/cancelled" => debug!("Client cancelled a request"),
                other => debug!("Ignoring notification: {}", other),
            },
            Err(e) => debug!("Ignoring malformed notification: {}", e),
        }
    }

    fn handle_initialize(&self, request: Request) -> Response {
        let params: InitializeParams = request
            .params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        if let Some(client) = &params.client_info {
            info!(
                "MCP client connecting: {} v{}",
                client.name,
                client.version.as_deref().unwrap_or("unknown")
            );
        }
        if let Some(version) = &params.protocol_version {
            debug!("Client protocol version: {}", version);
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({ "tools": {} }),
            server_info: ServerInfo {
                name: self.name().to_string(),
                version: self.version().to_string(),
            },
            instructions: self.config.server.instructions.clone(),
        };

        match serde_json::to_value(result) {
            Ok(value) => Response::success(request.id, value),
            Err(e) => Response::error(Some(request.id), ErrorCode::InternalError, e.to_string()),
        }
    }

    fn handle_tools_list(&self, request: Request) -> Response {
        let tools = self.list_tools();
        debug!("Listing {} tools", tools.len());
        Response::success(request.id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, request: Request) -> Response {
        let Some(params) = request.params else {
            return Response::invalid_params(request.id, "Missing params");
        };
        let params: CallToolParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Response::invalid_params(request.id, format!("Invalid params: {}", e));
            }
        };

        let call = CallRequest {
            id: request.id,
            name: params.name,
            arguments: params.arguments.unwrap_or_default(),
        };
        self.dispatcher.handle(call).await.into()
    }
}
