//! Tool call dispatch.
//!
//! The dispatcher resolves a tool, validates the arguments, runs the handler
//! under a timeout and packages the outcome. Every failure becomes an error
//! outcome on the response; nothing escapes as a panic or a dropped request.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::error::ToolError;
use super::registry::ToolRegistry;
use super::validator::validate;
use crate::core::protocol::{RequestId, Response};

/// A single tool invocation.
#[derive(Debug, Clone)]
pub struct CallRequest {
    /// Caller-supplied id, echoed back on the response.
    pub id: RequestId,
    /// Name of the tool to call.
    pub name: String,
    /// Raw arguments as received on the wire.
    pub arguments: Map<String, Value>,
}

/// Outcome of a tool invocation.
#[derive(Debug)]
pub struct CallResponse {
    /// Id of the request this answers.
    pub id: RequestId,
    /// Handler result or the reason there is none.
    pub outcome: Result<Value, ToolError>,
}

impl CallResponse {
    /// Whether the call succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl From<CallResponse> for Response {
    fn from(response: CallResponse) -> Self {
        match response.outcome {
            Ok(value) => Response::success(response.id, value),
            Err(err) => Response::error(Some(response.id), err.code(), err.client_message())
                .with_data(err.data()),
        }
    }
}

/// Dispatches tool calls against a sealed registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    call_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over `registry` with a per-call timeout.
    pub fn new(registry: Arc<ToolRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    /// The registry this dispatcher reads from.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The per-call timeout.
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Handle one call. The response always carries the request's id.
    #[instrument(skip_all, fields(id = %request.id, tool = %request.name))]
    pub async fn handle(&self, request: CallRequest) -> CallResponse {
        let CallRequest {
            id,
            name,
            arguments,
        } = request;

        let outcome = self.invoke(&name, &arguments).await;
        match &outcome {
            Ok(_) => debug!("Tool call succeeded"),
            Err(e) => warn!("Tool call failed: {}", e),
        }

        CallResponse { id, outcome }
    }

    async fn invoke(&self, name: &str, arguments: &Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self.registry.lookup(name)?;
        let arguments = validate(tool.params(), arguments)?;

        // Own task so a panicking handler is contained and a timed-out one can
        // be aborted.
        let handler = tool.handler();
        let mut task = tokio::spawn(async move { handler.call(arguments).await });

        match tokio::time::timeout(self.call_timeout, &mut task).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(ToolError::ExecutionFailed(msg)))) => Err(ToolError::ExecutionFailed(msg)),
            Ok(Ok(Err(other))) => Err(ToolError::execution_failed(other.to_string())),
            Ok(Err(join_error)) => Err(ToolError::execution_failed(if join_error.is_panic() {
                format!("tool '{}' panicked", name)
            } else {
                format!("tool '{}' was cancelled", name)
            })),
            Err(_) => {
                task.abort();
                Err(ToolError::Timeout(self.call_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::ErrorCode;
    use crate::domains::tools::handlers::{HandlerResult, ToolHandler};
    use crate::domains::tools::schema::ParamType;
    use crate::domains::tools::tool::Tool;
    use crate::domains::tools::validator::Arguments;
    use serde_json::json;

    struct Sleepy(Duration);

    #[async_trait::async_trait]
    impl ToolHandler for Sleepy {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            tokio::time::sleep(self.0).await;
            Ok(json!("woke"))
        }
    }

    struct Panics;

    #[async_trait::async_trait]
    impl ToolHandler for Panics {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            panic!("handler exploded");
        }
    }

    fn dispatcher(timeout: Duration) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                Tool::builder("echo")
                    .param("message", ParamType::String)
                    .sync_handler(|args: &Arguments| Ok(json!(args.get_str("message")?)))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Tool::builder("fail")
                    .sync_handler(|_: &Arguments| Err(ToolError::execution_failed("it broke")))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Tool::builder("slow")
                    .handler(Sleepy(Duration::from_secs(5)))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(Tool::builder("panics").handler(Panics).build().unwrap())
            .unwrap();
        registry.seal();
        Dispatcher::new(Arc::new(registry), timeout)
    }

    fn call(id: i64, name: &str, arguments: Value) -> CallRequest {
        CallRequest {
            id: RequestId::from(id),
            name: name.to_string(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn test_echo_success() {
        let d = dispatcher(Duration::from_secs(1));
        let response: Response = d.handle(call(1, "echo", json!({ "message": "hi" }))).await.into();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "jsonrpc": "2.0", "id": 1, "result": "hi" })
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let d = dispatcher(Duration::from_secs(1));
        let response: Response = d.handle(call(2, "ghost", json!({}))).await.into();
        assert_eq!(response.id, Some(RequestId::from(2)));
        assert_eq!(response.error_code(), Some(ErrorCode::ToolNotFound));
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_invalid_arguments_carry_detail() {
        let d = dispatcher(Duration::from_secs(1));
        let response: Response = d.handle(call(3, "echo", json!({ "message": 5 }))).await.into();
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::InvalidArguments);
        let data = error.data.unwrap();
        assert_eq!(data["missing"], json!([]));
        assert_eq!(data["type_mismatch"][0]["name"], "message");
    }

    #[tokio::test]
    async fn test_handler_failure_message_preserved() {
        let d = dispatcher(Duration::from_secs(1));
        let response: Response = d.handle(call(4, "fail", json!({}))).await.into();
        let error = response.error.unwrap();
        assert_eq!(error.code, ErrorCode::ToolExecutionError);
        assert_eq!(error.message, "it broke");
        assert_eq!(response.id, Some(RequestId::from(4)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let d = dispatcher(Duration::from_millis(50));
        let response = d.handle(call(5, "slow", json!({}))).await;
        assert!(matches!(response.outcome, Err(ToolError::Timeout(_))));

        // An unrelated call right after still succeeds.
        let next = d.handle(call(6, "echo", json!({ "message": "still here" }))).await;
        assert_eq!(next.outcome.unwrap(), json!("still here"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let d = dispatcher(Duration::from_secs(1));
        let response: Response = d.handle(call(7, "panics", json!({}))).await.into();
        assert_eq!(response.error_code(), Some(ErrorCode::ToolExecutionError));
    }

    #[tokio::test]
    async fn test_id_always_echoed() {
        let d = dispatcher(Duration::from_millis(50));
        for (i, name) in ["echo", "ghost", "fail", "slow"].into_iter().enumerate() {
            let id = RequestId::String(format!("req-{}", i));
            let response = d
                .handle(CallRequest {
                    id: id.clone(),
                    name: name.to_string(),
                    arguments: Map::new(),
                })
                .await;
            assert_eq!(response.id, id);
        }
    }
}
