//! JSON-RPC 2.0 envelope handling for single (non-batched) messages.

use serde::Serialize;
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn parse_error() -> Self {
        Self { code: PARSE_ERROR, message: "Parse error".to_string() }
    }

    pub fn invalid_request(detail: &str) -> Self {
        Self { code: INVALID_REQUEST, message: format!("Invalid Request: {detail}") }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self { code: METHOD_NOT_FOUND, message: format!("Method not found: {method}") }
    }

    pub fn invalid_params(detail: impl std::fmt::Display) -> Self {
        Self { code: INVALID_PARAMS, message: format!("Invalid params: {detail}") }
    }

    pub fn internal() -> Self {
        Self { code: INTERNAL_ERROR, message: "Internal server error".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request { id: Value, method: String, params: Option<Value> },
    /// No `id`: the sender expects no response.
    Notification { method: String },
    /// A response or error sent by the client; nothing to answer.
    Reply,
}

impl Incoming {
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request { method, .. } | Self::Notification { method } => Some(method.as_str()),
            Self::Reply => None,
        }
    }
}

/// Classifies one decoded message. On failure returns the id to answer with
/// (null when the message carried none) and the error.
pub fn parse_message(value: Value) -> Result<Incoming, (Value, RpcError)> {
    let Value::Object(mut obj) = value else {
        return Err((Value::Null, RpcError::invalid_request("expected a single JSON object")));
    };

    let id = obj.remove("id");
    let reply_id = id.clone().unwrap_or(Value::Null);
    if let Some(id) = &id {
        if !matches!(id, Value::String(_) | Value::Number(_) | Value::Null) {
            return Err((Value::Null, RpcError::invalid_request("id must be a string or number")));
        }
    }

    if obj.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err((reply_id, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
    }

    let method = match obj.remove("method") {
        Some(Value::String(m)) => m,
        Some(_) => return Err((reply_id, RpcError::invalid_request("method must be a string"))),
        None if is_reply(&obj) => return Ok(Incoming::Reply),
        None => return Err((reply_id, RpcError::invalid_request("missing method"))),
    };

    let params = obj.remove("params");
    if let Some(p) = &params {
        if !matches!(p, Value::Object(_) | Value::Array(_)) {
            return Err((reply_id, RpcError::invalid_params("params must be an object or array")));
        }
    }

    Ok(match id {
        Some(id) => Incoming::Request { id, method, params },
        None => Incoming::Notification { method },
    })
}

fn is_reply(obj: &Map<String, Value>) -> bool {
    obj.contains_key("result") || obj.contains_key("error")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_and_notifications_are_told_apart() {
        let req = parse_message(json!({ "jsonrpc": "2.0", "id": 7, "method": "ping" })).unwrap();
        assert_eq!(
            req,
            Incoming::Request { id: json!(7), method: "ping".to_string(), params: None }
        );

        let note =
            parse_message(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
                .unwrap();
        assert_eq!(note.method(), Some("notifications/initialized"));
        assert!(matches!(note, Incoming::Notification { .. }));
    }

    #[test]
    fn wrong_version_keeps_the_request_id() {
        let (id, err) = parse_message(json!({ "jsonrpc": "1.0", "id": "a", "method": "ping" }))
            .unwrap_err();
        assert_eq!(id, json!("a"));
        assert_eq!(err.code, INVALID_REQUEST);
    }

    #[test]
    fn batches_are_rejected() {
        let (id, err) = parse_message(json!([{ "jsonrpc": "2.0", "id": 1, "method": "ping" }]))
            .unwrap_err();
        assert_eq!(id, Value::Null);
        assert_eq!(err.code, INVALID_REQUEST);
    }

    #[test]
    fn scalar_params_are_invalid() {
        let (_, err) = parse_message(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": 3 }))
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[test]
    fn failure_omits_result() {
        let body = serde_json::to_value(RpcResponse::failure(json!(1), RpcError::internal())).unwrap();
        assert_eq!(
            body,
            json!({ "jsonrpc": "2.0", "id": 1, "error": { "code": -32603, "message": "Internal server error" } })
        );
    }
}
