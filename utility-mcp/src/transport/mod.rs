use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::{connection::ConnectionState, tools::ToolDispatcher};

pub mod jsonrpc;
pub mod mcp;

use jsonrpc::{Incoming, RpcError, RpcResponse};

#[derive(Debug, Clone)]
pub struct ServerIdentity {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl ServerIdentity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Read-only analytics over utility customers, payments and energy use"
                .to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ToolDispatcher>,
    pub connection: ConnectionState,
    pub server: Arc<ServerIdentity>,
}

impl AppState {
    pub fn new(dispatcher: ToolDispatcher, connection: ConnectionState, server: ServerIdentity) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            connection,
            server: Arc::new(server),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(mcp_endpoint))
        .route("/health", get(health))
        .with_state(state)
}

/// One JSON-RPC message per request; no session is kept between calls.
async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "malformed JSON-RPC body");
            metrics::counter!("mcp_http_requests_total", "method" => "invalid").increment(1);
            return rpc_reply(StatusCode::BAD_REQUEST, RpcResponse::failure(Value::Null, RpcError::parse_error()));
        }
    };

    let incoming = match jsonrpc::parse_message(value) {
        Ok(incoming) => incoming,
        Err((id, error)) => {
            metrics::counter!("mcp_http_requests_total", "method" => "invalid").increment(1);
            return rpc_reply(StatusCode::BAD_REQUEST, RpcResponse::failure(id, error));
        }
    };

    metrics::counter!("mcp_http_requests_total", "method" => method_label(incoming.method()))
        .increment(1);

    match incoming {
        Incoming::Request { id, method, params } => {
            let reply = match mcp::handle_request(&state, &method, params).await {
                Ok(result) => RpcResponse::success(id, result),
                Err(error) => {
                    tracing::debug!(method = %method, code = error.code, "JSON-RPC error");
                    RpcResponse::failure(id, error)
                }
            };
            rpc_reply(StatusCode::OK, reply)
        }
        Incoming::Notification { method } => {
            mcp::handle_notification(&method);
            StatusCode::ACCEPTED.into_response()
        }
        Incoming::Reply => StatusCode::ACCEPTED.into_response(),
    }
}

fn rpc_reply(status: StatusCode, reply: RpcResponse) -> Response {
    (status, Json(reply)).into_response()
}

/// Bounded label set; arbitrary client method names never become series.
fn method_label(method: Option<&str>) -> &'static str {
    match method {
        Some("initialize") => "initialize",
        Some("ping") => "ping",
        Some("tools/list") => "tools/list",
        Some("tools/call") => "tools/call",
        Some(m) if m.starts_with("notifications/") => "notification",
        Some(_) => "other",
        None => "reply",
    }
}

#[derive(Debug, Serialize)]
struct HealthReport<'a> {
    status: &'static str,
    database: &'static str,
    server: &'a str,
    version: &'a str,
}

async fn health(State(state): State<AppState>) -> Response {
    let database = if state.connection.is_connected() { "connected" } else { "disconnected" };
    Json(HealthReport {
        status: "healthy",
        database,
        server: &state.server.name,
        version: &state.server.version,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use utility_client::testing::{sample_utility, FixtureStore};
    use axum::{body::Body, http::Request};
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;
    use tower::ServiceExt;
    use utility_client::domain::UnrecognizedTypePolicy;

    fn app_with(store: FixtureStore, connection: ConnectionState) -> Router {
        let dispatcher = ToolDispatcher::new(Arc::new(store), UnrecognizedTypePolicy::Include);
        router(AppState::new(dispatcher, connection, ServerIdentity::new("test-server")))
    }

    async fn post_mcp(app: Router, body: impl Into<Body>) -> (StatusCode, Option<Value>) {
        let response = app
            .oneshot(
                Request::post("/mcp")
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { None } else { Some(serde_json::from_slice(&bytes).unwrap()) };
        (status, json)
    }

    #[tokio::test]
    async fn health_reports_database_state() {
        let connection = ConnectionState::new();
        let app = app_with(FixtureStore::default(), connection.clone());

        let response = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "disconnected");
        assert_eq!(body["server"], "test-server");

        connection.record_heartbeat("db-a:27017", true);
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn initialize_advertises_tools_capability() {
        let app = app_with(FixtureStore::default(), ConnectionState::new());
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2025-03-26", "capabilities": {}, "clientInfo": { "name": "t", "version": "0" } },
        });
        let (status, body) = post_mcp(app, request.to_string()).await;
        let body = body.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(body["result"]["capabilities"]["tools"], json!({}));
        assert_eq!(body["result"]["serverInfo"]["name"], "test-server");
    }

    #[tokio::test]
    async fn tools_list_names_every_tool() {
        let app = app_with(FixtureStore::default(), ConnectionState::new());
        let (_, body) =
            post_mcp(app, json!({ "jsonrpc": "2.0", "id": "l", "method": "tools/list" }).to_string())
                .await;
        let tools = body.unwrap()["result"]["tools"].as_array().unwrap().clone();

        assert_eq!(tools.len(), 7);
        assert_eq!(tools[0]["name"], "getCustomersCount");
        assert_eq!(tools[0]["inputSchema"]["additionalProperties"], false);
    }

    #[tokio::test]
    async fn tools_call_wraps_the_result_as_text() {
        let id = ObjectId::new();
        let app = app_with(
            FixtureStore::default().with_utility(sample_utility(id)),
            ConnectionState::new(),
        );
        let request = json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "getUtilityInfo", "arguments": { "utilityId": id.to_hex() } },
        });
        let (status, body) = post_mcp(app, request.to_string()).await;
        let body = body.unwrap();
        let result = &body["result"];

        assert_eq!(status, StatusCode::OK);
        assert!(result.get("isError").is_none());
        assert_eq!(result["content"][0]["type"], "text");
        let info: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(info["name"], "Kano Rural Power");
    }

    #[tokio::test]
    async fn tool_validation_errors_are_results_not_rpc_errors() {
        let app = app_with(FixtureStore::default(), ConnectionState::new());
        let request = json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": { "name": "getCustomersCount", "arguments": { "utilityId": "123" } },
        });
        let (status, body) = post_mcp(app, request.to_string()).await;
        let body = body.unwrap();

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("error").is_none());
        assert_eq!(body["result"]["isError"], true);
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let app = app_with(FixtureStore::default(), ConnectionState::new());

        let (status, body) = post_mcp(app.clone(), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap()["error"]["code"], -32700);

        let (_, body) =
            post_mcp(app.clone(), json!({ "jsonrpc": "2.0", "id": 5, "method": "resources/list" }).to_string())
                .await;
        assert_eq!(body.unwrap()["error"]["code"], -32601);

        let (_, body) = post_mcp(
            app,
            json!({ "jsonrpc": "2.0", "id": 6, "method": "tools/call", "params": { "arguments": {} } })
                .to_string(),
        )
        .await;
        assert_eq!(body.unwrap()["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn notifications_are_accepted_without_a_body() {
        let app = app_with(FixtureStore::default(), ConnectionState::new());
        let (status, body) = post_mcp(
            app,
            json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body.is_none());
    }
}
