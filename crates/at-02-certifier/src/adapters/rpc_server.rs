//! # Certification JSON-RPC Server
//!
//! `POST /` serves `node_certify`; `GET /health` reports liveness.
//!
//! | Condition | Code |
//! |-----------|------|
//! | Body is not JSON | -32700 |
//! | Not a JSON-RPC 2.0 request object | -32600 |
//! | Unknown method | -32601 |
//! | Bad params or payload refused by the policy | -32602 |

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared_types::rpc::{codes, JsonRpcResponse, JSONRPC_VERSION};
use shared_types::{CertifyRequest, CertifyResponse, HexBytes, CERTIFY_METHOD};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::CertifyError;
use crate::ports::CertifyApi;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    service: Arc<dyn CertifyApi>,
}

/// Build the signer's HTTP router.
pub fn build_router(service: Arc<dyn CertifyApi>) -> Router {
    Router::new()
        .route("/", post(handle_json_rpc))
        .route("/health", get(health_check))
        .with_state(AppState { service })
}

async fn handle_json_rpc(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let request: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(failure(Value::Null, codes::PARSE_ERROR, format!("Parse error: {}", e))),
            );
        }
    };

    (StatusCode::OK, Json(process_request(&state, &request).await))
}

fn failure(id: Value, code: i32, message: impl Into<String>) -> Value {
    let response: JsonRpcResponse<()> = JsonRpcResponse::failure(id, code, message);
    serde_json::to_value(response).unwrap_or(Value::Null)
}

async fn process_request(state: &AppState, request: &Value) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    if request.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return failure(id, codes::INVALID_REQUEST, "Invalid request: jsonrpc must be \"2.0\"");
    }
    let method = match request.get("method").and_then(Value::as_str) {
        Some(method) => method,
        None => return failure(id, codes::INVALID_REQUEST, "Invalid request: missing method"),
    };
    if method != CERTIFY_METHOD {
        return failure(id, codes::METHOD_NOT_FOUND, format!("Method not found: {}", method));
    }

    let params = request.get("params").cloned().unwrap_or(Value::Null);
    let certify_request = match parse_params(params) {
        Ok(req) => req,
        Err(message) => {
            return failure(id, codes::INVALID_PARAMS, format!("Invalid params: {}", message))
        }
    };

    let task_index = certify_request.task_index;
    match state
        .service
        .certify(task_index, &certify_request.data.0)
        .await
    {
        Ok(signed) => {
            debug!(task_index, response_len = signed.data.len(), "Certified");
            let result = CertifyResponse {
                signature: HexBytes(signed.signature.to_bytes().to_vec()),
                data: HexBytes(signed.data),
            };
            serde_json::to_value(JsonRpcResponse::success(id.clone(), result))
                .unwrap_or_else(|e| failure(id, codes::INTERNAL_ERROR, e.to_string()))
        }
        Err(err @ CertifyError::InvalidArgument(_)) => {
            warn!(task_index, error = %err, "Certification refused");
            failure(id, codes::INVALID_PARAMS, err.to_string())
        }
    }
}

/// Accepts `[{...}]` or a bare `{...}`.
fn parse_params(params: Value) -> Result<CertifyRequest, String> {
    let object = match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        object @ Value::Object(_) => object,
        _ => return Err("expected one request object".to_string()),
    };
    serde_json::from_value(object).map_err(|e| e.to_string())
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "policy": state.service.policy_kind().as_str(),
    }))
}
