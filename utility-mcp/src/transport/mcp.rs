//! Tool-protocol methods served over the JSON-RPC endpoint.

use serde::Deserialize;
use serde_json::{json, Value};

use super::{jsonrpc::RpcError, AppState};
use crate::tools::list_tools;

/// Newest first; an unknown client version is answered with the newest.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
}

fn params_as<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, RpcError> {
    serde_json::from_value(params.unwrap_or_else(|| json!({}))).map_err(RpcError::invalid_params)
}

pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .into_iter()
        .find(|v| Some(*v) == requested)
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

pub async fn handle_request(
    state: &AppState,
    method: &str,
    params: Option<Value>,
) -> Result<Value, RpcError> {
    match method {
        "initialize" => {
            let p: InitializeParams = params_as(params)?;
            Ok(json!({
                "protocolVersion": negotiate_version(p.protocol_version.as_deref()),
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": state.server.name,
                    "version": state.server.version,
                },
                "instructions": state.server.description,
            }))
        }
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": list_tools() })),
        "tools/call" => {
            let p: CallToolParams = params_as(params)?;
            let result = state.dispatcher.call(&p.name, p.arguments.as_ref()).await;
            serde_json::to_value(result).map_err(|e| {
                tracing::error!(error = %e, "failed to encode tool result");
                RpcError::internal()
            })
        }
        other => Err(RpcError::method_not_found(other)),
    }
}

pub fn handle_notification(method: &str) {
    match method {
        "notifications/initialized" => tracing::debug!("client initialized"),
        "notifications/cancelled" => tracing::debug!("client cancelled a request"),
        other => tracing::debug!(method = other, "ignoring notification"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_supported_versions_only() {
        assert_eq!(negotiate_version(Some("2024-11-05")), "2024-11-05");
        assert_eq!(negotiate_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_version(None), "2025-06-18");
    }
}
