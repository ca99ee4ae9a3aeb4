use super::{timestamp, ApiError, ApiResult};
use crate::config::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use composio_gateway_clients::ClientError;
use composio_gateway_mcp::protocol::ToolSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

pub const SERVICE_NAME: &str = "composio-agent";

/// Fields every `/invoke` payload must carry for audit.
pub const REQUIRED_INVOKE_FIELDS: [&str; 4] =
    ["agent_id", "process_id", "blueprint_id", "timestamp_last_touched"];

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
}

/// Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: timestamp(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub kill_switch: bool,
    pub api_key_configured: bool,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    tracing::info!("Status endpoint called");
    Json(StatusResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: timestamp(),
        kill_switch: state.kill_switch(),
        api_key_configured: state.tools.is_configured(),
    })
}

/// Static tool definition document. Missing or broken files degrade to an
/// empty list.
pub async fn schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let path = &state.config.gateway.schema_path;
    let empty = || serde_json::json!({ "tools": [] });

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Tool definitions file not readable");
            return Json(empty());
        }
    };

    match serde_json::from_str(&content) {
        Ok(document) => Json(document),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "Error parsing tool definitions");
            Json(empty())
        }
    }
}

/// Single provider tool, converted to the common descriptor.
pub async fn tool_schema(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ToolSchema>> {
    let tool = state.tools.fetch_tool_detail(&slug).await.map_err(|e| {
        tracing::error!(slug = %slug, error = %e, "Tool lookup failed");
        ApiError::new(StatusCode::BAD_GATEWAY, format!("Tool lookup failed for {}", slug))
            .with_details(e.to_string())
    })?;

    tool.map(|raw| Json(ToolSchema::from(&raw)))
        .ok_or_else(|| ApiError::not_found(format!("Tool not found: {}", slug)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub tool: String,
    pub data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time: f64,
}

/// Proxy a tool invocation to the Composio actions API.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InvokeRequest>,
) -> ApiResult<Response> {
    let started = Instant::now();
    tracing::info!(tool = %req.tool, "Invoke endpoint called");

    if state.kill_switch() {
        tracing::warn!(tool = %req.tool, "Invoke request blocked - kill switch is active");
        return Err(ApiError::kill_switch());
    }

    if !state.tools.is_configured() {
        tracing::error!("COMPOSIO_API_KEY not configured");
        return Err(ApiError::not_configured(
            "Service configuration error - API key not set",
        ));
    }

    if let Some(field) = REQUIRED_INVOKE_FIELDS
        .iter()
        .find(|field| !req.data.contains_key(**field))
    {
        tracing::error!(tool = %req.tool, field, "Validation failed - missing required field");
        return Err(ApiError::validation(format!("Missing required field: {}", field)));
    }

    let outcome = state
        .tools
        .execute_action(&req.tool, serde_json::Value::Object(req.data))
        .await;
    let execution_time = started.elapsed().as_secs_f64();

    let (status, response) = match outcome {
        Ok(result) => {
            tracing::info!(tool = %req.tool, execution_time, "Tool invocation successful");
            (
                StatusCode::OK,
                InvokeResponse {
                    success: true,
                    result: Some(result),
                    error: None,
                    timestamp: timestamp(),
                    execution_time,
                },
            )
        }
        Err(e) => {
            let (status, error) = match &e {
                ClientError::Api { status, body } => (
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                    format!("Composio API error: {} - {}", status, body),
                ),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Request error: {}", other),
                ),
            };
            tracing::error!(tool = %req.tool, execution_time, error = %error, "Tool invocation failed");
            (
                status,
                InvokeResponse {
                    success: false,
                    result: None,
                    error: Some(error),
                    timestamp: timestamp(),
                    execution_time,
                },
            )
        }
    };

    Ok((status, Json(response)).into_response())
}
