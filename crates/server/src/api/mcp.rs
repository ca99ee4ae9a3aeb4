// JSON-RPC over plain HTTP. Both routes always answer 200; failures travel
// inside the envelope.

use crate::config::AppState;
use axum::{body::Bytes, extract::State, Json};
use composio_gateway_mcp::protocol::JsonRpcResponse;
use std::sync::Arc;

/// `POST /mcp`: direct request/response transport.
pub async fn rpc(State(state): State<Arc<AppState>>, body: Bytes) -> Json<JsonRpcResponse> {
    Json(state.mcp.handle_message(&body).await)
}

/// `POST /message`: requests from clients holding an open `/sse` stream.
pub async fn sse_message(State(state): State<Arc<AppState>>, body: Bytes) -> Json<JsonRpcResponse> {
    tracing::debug!(bytes = body.len(), "SSE message received");
    Json(state.mcp.handle_message(&body).await)
}
