use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::menu::{MenuError, MenuService};

/// JSON-RPC 2.0 tool-calling surface for AI assistants. One endpoint, one
/// method per menu tool; results are plain JSON values.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[allow(dead_code)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

const INVALID_PARAMS: i32 = -32602;
const METHOD_NOT_FOUND: i32 = -32601;
const SERVER_ERROR: i32 = -32000;

pub async fn rpc_handler(
    Extension(service): Extension<Arc<MenuService>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    debug!("RPC call: {}", request.method);

    let outcome = dispatch(&service, &request.method, &request.params).await;

    let response = match outcome {
        Ok(result) => RpcResponse {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id: request.id,
        },
        Err(error) => {
            warn!("RPC '{}' failed: {}", request.method, error.message);
            RpcResponse {
                jsonrpc: "2.0",
                result: None,
                error: Some(error),
                id: request.id,
            }
        }
    };
    Json(response)
}

async fn dispatch(
    service: &MenuService,
    method: &str,
    params: &Value,
) -> Result<Value, RpcError> {
    match method {
        "get_menu" => {
            let snapshot = service.fetch_menu().await.map_err(menu_err)?;
            serialize(&snapshot)
        }
        "search_menu" => {
            let query = string_param(params, "query")?;
            let items = service.search(&query).await.map_err(menu_err)?;
            let total = items.len();
            serialize(&json!({ "items": items, "total": total }))
        }
        "get_category" => {
            let category = string_param(params, "category")?;
            let items = service.by_category(&category).await.map_err(menu_err)?;
            let total = items.len();
            serialize(&json!({ "items": items, "total": total }))
        }
        "list_categories" => {
            let categories = service.categories().await.map_err(menu_err)?;
            serialize(&json!({ "categories": categories }))
        }
        "cache_status" => serialize(&service.cache_status()),
        "clear_cache" => serialize(&service.clear_cache()),
        other => Err(RpcError {
            code: METHOD_NOT_FOUND,
            message: format!("unknown method '{}'", other),
        }),
    }
}

fn string_param(params: &Value, key: &str) -> Result<String, RpcError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RpcError {
            code: INVALID_PARAMS,
            message: format!("missing or empty string param '{}'", key),
        })
}

fn serialize<T: Serialize>(value: &T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError {
        code: SERVER_ERROR,
        message: e.to_string(),
    })
}

fn menu_err(e: MenuError) -> RpcError {
    RpcError {
        code: SERVER_ERROR,
        message: e.to_string(),
    }
}
