//! HTTP routes for debugger clients, dashboards and agents.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use debug_bridge_core::{Ack, DebugStore, Health, LatestView, StoreError};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, SERVER_NAME, Tool, ToolServer};

/// Path of the tool protocol endpoint.
pub const MCP_PATH: &str = "/sse";

/// Response header carrying the protocol session issued on `initialize`.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// HTTP API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({"detail": self.to_string()}))).into_response()
    }
}

/// Create the HTTP router.
///
/// # Example
/// ```ignore
/// let store = Arc::new(MemoryStore::new());
/// let app = create_router(store).layer(CorsLayer::permissive());
/// ```
#[must_use]
pub fn create_router<S>(store: Arc<S>) -> Router
where
    S: DebugStore + 'static,
{
    Router::new()
        .route("/debug-data", post(submit::<S>).get(query::<S>))
        .route("/health", get(health::<S>))
        .route("/mcp-info", get(mcp_info))
        .route(MCP_PATH, post(mcp::<S>))
        .route("/sse/", post(mcp::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn submit<S: DebugStore>(
    State(store): State<Arc<S>>,
    body: Bytes,
) -> Result<Json<Ack>, ApiError> {
    // Any content type is accepted.
    let record: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Rejected debug data: {e}");
        ApiError::InvalidJson(e)
    })?;

    Ok(Json(store.submit(record).await?))
}

async fn query<S: DebugStore>(State(store): State<Arc<S>>) -> Result<Json<LatestView>, ApiError> {
    Ok(Json(store.query().await?))
}

async fn health<S: DebugStore>(State(store): State<Arc<S>>) -> Json<Health> {
    Json(store.health())
}

async fn mcp_info() -> Json<Value> {
    let tools: Vec<_> = Tool::ALL.into_iter().map(Tool::info).collect();

    Json(json!({
        "mcp_server": SERVER_NAME,
        "sse_endpoint": MCP_PATH,
        "tools": tools,
        "usage": {
            "description": "Tools are invoked with JSON-RPC 2.0 requests POSTed to the endpoint",
            "endpoint": MCP_PATH,
            "protocol": "Model Context Protocol (MCP)",
            "clients": "Any MCP client that speaks the streamable HTTP transport"
        }
    }))
}

async fn mcp<S: DebugStore>(State(store): State<Arc<S>>, body: Bytes) -> Response {
    let request = match JsonRpcRequest::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Invalid tool request: {}", e.message);
            return Json(JsonRpcResponse::failure(None, e)).into_response();
        }
    };

    let initialize = request.method == "initialize";
    let server = ToolServer::new(store);

    match server.handle(request).await {
        None => StatusCode::ACCEPTED.into_response(),
        Some(response) if initialize && response.error.is_none() => {
            let session_id = Uuid::new_v4().to_string();
            tracing::info!(%session_id, "Tool client initialized");
            ([(SESSION_HEADER, session_id)], Json(response)).into_response()
        }
        Some(response) => Json(response).into_response(),
    }
}
