//! Tool handler abstractions.
//!
//! A handler is the body of a tool. The dispatcher treats it as opaque: it
//! receives validated [`Arguments`] and returns a JSON value or an error
//! message. Handlers never see the registry.

use serde_json::Value;
use std::sync::Arc;

use super::error::ToolError;
use super::validator::Arguments;

/// Result returned by a tool handler.
pub type HandlerResult = Result<Value, ToolError>;

/// Trait for implementing tool handlers.
///
/// Implement this directly for handlers that need to await I/O. Plain
/// functions can be wrapped with [`FnHandler`].
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with validated arguments.
    async fn call(&self, arguments: Arguments) -> HandlerResult;
}

/// Adapter running a synchronous function as a tool handler.
///
/// The function runs on tokio's blocking pool, so a slow or blocking body
/// does not stall the runtime and the dispatcher's timeout still fires.
pub struct FnHandler<F> {
    func: Arc<F>,
}

impl<F> FnHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    /// Wrap `func`.
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

#[async_trait::async_trait]
impl<F> ToolHandler for FnHandler<F>
where
    F: Fn(&Arguments) -> HandlerResult + Send + Sync + 'static,
{
    async fn call(&self, arguments: Arguments) -> HandlerResult {
        let func = Arc::clone(&self.func);
        tokio::task::spawn_blocking(move || func(&arguments))
            .await
            .map_err(|e| ToolError::execution_failed(format!("handler task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Constant;

    #[async_trait::async_trait]
    impl ToolHandler for Constant {
        async fn call(&self, _arguments: Arguments) -> HandlerResult {
            Ok(json!(42))
        }
    }

    #[tokio::test]
    async fn test_async_handler() {
        let result = Constant.call(Arguments::default()).await.unwrap();
        assert_eq!(result, json!(42));
    }

    #[tokio::test]
    async fn test_fn_handler_runs_function() {
        let handler = FnHandler::new(|args: &Arguments| Ok(json!(args.len())));
        let result = handler.call(Arguments::default()).await.unwrap();
        assert_eq!(result, json!(0));
    }

    #[tokio::test]
    async fn test_fn_handler_propagates_error() {
        let handler = FnHandler::new(|_: &Arguments| Err(ToolError::execution_failed("nope")));
        let err = handler.call(Arguments::default()).await.unwrap_err();
        assert_eq!(err.client_message(), "nope");
    }
}
