//! HTTP transport implementation.
//!
//! Responses flow over a Server-Sent Events stream, requests arrive as POST
//! bodies:
//!
//! 1. `GET {sse_path}` opens a connection. The first event is `endpoint`,
//!    whose data is the URL to POST messages to (it carries the session id).
//! 2. `POST {messages_path}?session_id=<id>` submits one JSON-RPC message and
//!    returns `202 Accepted` immediately.
//! 3. Each response is pushed as a `message` event on the stream.
//!
//! Dropping the stream closes the connection and abandons its pending calls.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::Stream;
use serde::Deserialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{debug, info, instrument, warn};

use super::{HttpConfig, TransportError, TransportResult};
use crate::core::session::Outbound;
use crate::core::{ConnectionId, McpServer, SessionError, SessionManager};

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
struct AppState {
    server: McpServer,
    sse_path: Arc<str>,
    messages_path: Arc<str>,
    keepalive: Duration,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: String,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.config.address();
        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (HTTP/SSE, CORS {})", addr, cors_status);
        info!("  → Stream:   GET {}", self.config.sse_path);
        info!("  → Messages: POST {}?session_id=<id>", self.config.messages_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the HTTP router for a server.
pub fn router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        server,
        sse_path: Arc::from(config.sse_path.as_str()),
        messages_path: Arc::from(config.messages_path.as_str()),
        keepalive: Duration::from_secs(config.keepalive_secs),
    };

    let mut app = Router::new()
        .route(&config.sse_path, get(handle_sse))
        .route(&config.messages_path, post(handle_message))
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new())),
        );

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Closes the connection when the SSE stream is dropped.
struct CloseOnDrop {
    sessions: Arc<SessionManager>,
    id: ConnectionId,
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let sessions = self.sessions.clone();
        let id = self.id;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { sessions.close(id).await });
            }
            Err(_) => warn!("No runtime to close connection {}", id),
        }
    }
}

struct EventFeed {
    endpoint: Option<String>,
    outbound: Outbound,
    _guard: CloseOnDrop,
}

/// Open an event stream.
#[instrument(skip_all)]
async fn handle_sse(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let sessions = state.server.sessions().clone();
    let (id, outbound) = sessions.connect().await;
    let guard = CloseOnDrop {
        sessions: sessions.clone(),
        id,
    };

    if let Err(e) = sessions.open(id).await {
        warn!("Failed to open connection {}: {}", id, e);
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    info!("Opened event stream {}", id);

    let feed = EventFeed {
        endpoint: Some(format!("{}?session_id={}", state.messages_path, id)),
        outbound,
        _guard: guard,
    };

    let stream = futures::stream::unfold(feed, |mut feed| async move {
        if let Some(endpoint) = feed.endpoint.take() {
            let event = Event::default().event("endpoint").data(endpoint);
            return Some((Ok(event), feed));
        }

        let response = feed.outbound.recv().await?;
        let event = match Event::default().event("message").json_data(&response) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to encode response: {}", e);
                Event::default().comment("encoding error")
            }
        };
        Some((Ok(event), feed))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(state.keepalive)))
}

/// Accept one JSON-RPC message for an open stream.
#[instrument(skip_all)]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(id) = ConnectionId::parse(&query.session_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session_id").into_response();
    };

    debug!("Received message for {}: {}", id, body);

    match state.server.submit(id, &body).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e @ SessionError::UnknownConnection(_)) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => (StatusCode::CONFLICT, e.to_string()).into_response(),
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP/SSE",
        "endpoints": {
            "stream": &*state.sse_path,
            "messages": &*state.messages_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.server.list_tools().iter().map(|t| t.name.clone()).collect::<Vec<_>>()
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "connections": state.server.sessions().len().await,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
