//! Wire message types.
//!
//! Messages follow JSON-RPC 2.0 framing. Error codes are strings so callers
//! can match on them without a numeric table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Protocol revision reported in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version tag carried on every response.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request ID can be string or number. Echoed back verbatim.
///
/// Numbers keep their JSON representation, so ids beyond `i64` and
/// non-integer ids round-trip unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    /// A numeric ID.
    Number(Number),
    /// A string ID.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Inbound JSON-RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// The JSON-RPC version.
    #[serde(default)]
    pub jsonrpc: Option<String>,
    /// The request ID.
    pub id: RequestId,
    /// The method name.
    pub method: String,
    /// The request parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Build a request, mostly useful for tests and clients.
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// Inbound JSON-RPC notification (a message without an id).
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    /// The method name.
    pub method: String,
    /// The notification parameters.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Error codes reported in response envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No tool with the requested name is registered.
    ToolNotFound,
    /// Arguments failed schema validation.
    InvalidArguments,
    /// The handler did not finish in time.
    ToolTimeout,
    /// The handler reported a failure.
    ToolExecutionError,
    /// The message was not valid JSON.
    ParseError,
    /// The message was JSON but not a valid request.
    InvalidRequest,
    /// The method is not supported.
    MethodNotFound,
    /// The method parameters are malformed.
    InvalidParams,
    /// Something went wrong inside the server.
    InternalError,
}

/// Error object of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Outbound JSON-RPC response.
///
/// Exactly one of `result` and `error` is set. `id` is `null` only when the
/// inbound message was too broken to recover an id from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The JSON-RPC version.
    pub jsonrpc: String,
    /// The request ID.
    pub id: Option<RequestId>,
    /// The result of the request, if successful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error, if the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Creates a successful response.
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: Option<RequestId>, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Attach structured data to an error response.
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.data = data;
        }
        self
    }

    /// Method not found error.
    pub fn method_not_found(id: RequestId, method: &str) -> Self {
        Self::error(
            Some(id),
            ErrorCode::MethodNotFound,
            format!("Unknown method: {}", method),
        )
    }

    /// Invalid params error.
    pub fn invalid_params(id: RequestId, msg: impl Into<String>) -> Self {
        Self::error(Some(id), ErrorCode::InvalidParams, msg)
    }

    /// The error code, if this is an error response.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// `tools/call` request params.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    /// The name of the tool to call.
    pub name: String,
    /// The arguments for the tool call.
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}

/// Information about the MCP client, sent with `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// The name of the client.
    pub name: String,
    /// The version of the client.
    #[serde(default)]
    pub version: Option<String>,
}

/// `initialize` request params. Every field is optional on the way in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// The protocol version requested by the client.
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Information about the client.
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// `initialize` response result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// The protocol version supported by the server.
    pub protocol_version: String,
    /// The capabilities of the server.
    pub capabilities: Value,
    /// Information about the server.
    pub server_info: ServerInfo,
    /// Optional instructions for the client on how to use this server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Information about the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// The name of the server.
    pub name: String,
    /// The version of the server.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let resp = Response::success(RequestId::from(1), json!("hi"));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": 1, "result": "hi" }));
    }

    #[test]
    fn test_error_shape() {
        let resp = Response::error(
            Some(RequestId::from(2)),
            ErrorCode::ToolNotFound,
            "Tool not found: ghost",
        );
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["id"], 2);
        assert_eq!(value["error"]["code"], "TOOL_NOT_FOUND");
        assert!(value.get("result").is_none());
        assert!(value["error"].get("data").is_none());
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let resp = Response::error(None, ErrorCode::ParseError, "bad json");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"id\":null"));
    }

    #[test]
    fn test_request_id_variants() {
        let req: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":"abc","method":"ping"}"#).unwrap();
        assert_eq!(req.id, RequestId::String("abc".into()));

        let req: Request = serde_json::from_str(r#"{"id":7,"method":"ping"}"#).unwrap();
        assert_eq!(req.id, RequestId::from(7));
        assert!(req.params.is_none());
    }

    #[test]
    fn test_numeric_ids_round_trip_unchanged() {
        for raw in ["18446744073709551615", "-9223372036854775808", "1.5"] {
            let req: Request =
                serde_json::from_str(&format!(r#"{{"id":{raw},"method":"ping"}}"#)).unwrap();
            let resp = Response::success(req.id, json!({}));
            let json = serde_json::to_string(&resp).unwrap();
            assert!(json.contains(&format!("\"id\":{raw}")), "{json}");
        }
    }

    #[test]
    fn test_call_params() {
        let params: CallToolParams =
            serde_json::from_value(json!({ "name": "echo", "arguments": { "message": "hi" } }))
                .unwrap();
        assert_eq!(params.name, "echo");
        assert_eq!(params.arguments.unwrap()["message"], "hi");

        let params: CallToolParams = serde_json::from_value(json!({ "name": "echo" })).unwrap();
        assert!(params.arguments.is_none());

        let bad = serde_json::from_value::<CallToolParams>(json!({ "name": "x", "arguments": [1] }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_with_data() {
        let resp = Response::error(Some(1.into()), ErrorCode::InvalidArguments, "bad")
            .with_data(Some(json!({ "missing": ["text"] })));
        assert_eq!(resp.error.unwrap().data.unwrap()["missing"][0], "text");
    }
}
