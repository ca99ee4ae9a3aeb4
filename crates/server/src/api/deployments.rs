use super::{timestamp, ApiError, ApiResult};
use crate::config::AppState;
use axum::{extract::State, Json};
use composio_gateway_clients::ClientError;
use composio_gateway_mcp::tools::{RenderTool, RenderToolError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListDeploymentToolsResponse {
    pub tools: Vec<DeploymentToolInfo>,
}

/// Flat `parameters` map: one entry per property, with `"required": true`
/// folded into the properties the input schema requires.
fn flat_parameters(tool: RenderTool) -> serde_json::Value {
    let schema = tool.input_schema();
    let required: Vec<&str> = schema["required"]
        .as_array()
        .map(|names| names.iter().filter_map(|n| n.as_str()).collect())
        .unwrap_or_default();

    let mut parameters = schema["properties"]
        .as_object()
        .cloned()
        .unwrap_or_default();
    for (name, property) in parameters.iter_mut() {
        if let Some(property) = property.as_object_mut() {
            if required.contains(&name.as_str()) {
                property.insert("required".to_string(), serde_json::Value::Bool(true));
            }
        }
    }

    serde_json::Value::Object(parameters)
}

pub async fn list_tools() -> Json<ListDeploymentToolsResponse> {
    Json(ListDeploymentToolsResponse {
        tools: RenderTool::ALL
            .into_iter()
            .map(|tool| DeploymentToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: flat_parameters(tool),
            })
            .collect(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentToolRequest {
    pub tool: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Run one deployment tool. Upstream failures are reported in the body with
/// `success: false`; request problems use HTTP status codes.
pub async fn invoke(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeploymentToolRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    tracing::info!(tool = %req.tool, "Deployment tool invoked");

    if state.kill_switch() {
        tracing::warn!(tool = %req.tool, "Deployment tool blocked - kill switch is active");
        return Err(ApiError::kill_switch());
    }

    let tool = RenderTool::from_name(&req.tool)
        .ok_or_else(|| ApiError::not_found(format!("Unknown tool: {}", req.tool)))?;

    match tool.invoke(state.deployments.as_ref(), req.parameters).await {
        Ok(result) => Ok(Json(serde_json::json!({
            "success": true,
            "tool": tool.name(),
            "result": result,
            "timestamp": timestamp(),
        }))),
        Err(RenderToolError::InvalidArguments { message, .. }) => Err(ApiError::validation(message)),
        Err(RenderToolError::Upstream(e)) if e.is_not_configured() => {
            tracing::error!(tool = %req.tool, error = %e, "Render client not configured");
            Err(ApiError::not_configured(e.to_string()))
        }
        Err(RenderToolError::Upstream(ClientError::Api { status, body })) => {
            tracing::error!(tool = %req.tool, status, body = %body, "Render API error");
            Ok(Json(serde_json::json!({
                "success": false,
                "error": format!("Render API error: {}", status),
                "details": body,
                "timestamp": timestamp(),
            })))
        }
        Err(e) => {
            tracing::error!(tool = %req.tool, error = %e, "Deployment tool execution failed");
            Ok(Json(serde_json::json!({
                "success": false,
                "error": e.to_string(),
                "timestamp": timestamp(),
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::test_support::{config_for, get, post_json, router, send};
    use axum::http::StatusCode;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_flat_parameters_mark_required() {
        let parameters = flat_parameters(RenderTool::UpdateEnvVar);
        assert_eq!(parameters["key"]["required"], true);
        assert_eq!(parameters["value"]["type"], "string");

        let parameters = flat_parameters(RenderTool::GetLogs);
        assert_eq!(parameters["limit"]["default"], 100);
        assert!(parameters["limit"].get("required").is_none());

        assert_eq!(flat_parameters(RenderTool::GetMetrics), serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_list_tools() {
        let (app, _) = router(config_for("http://127.0.0.1:9"));
        let (status, body) = send(&app, get("/mcp/tools")).await;

        assert_eq!(status, StatusCode::OK);
        let tools = body["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 8);
        assert_eq!(tools[0]["name"], "render_get_service_status");
        assert_eq!(tools[4]["parameters"]["clear_cache"]["default"], false);
    }

    #[tokio::test]
    async fn test_invoke_get_logs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/services/srv-test/logs"))
            .and(query_param("limit", "2"))
            .and(header("authorization", "Bearer rnd-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "logs": [
                    {"timestamp": "t1", "message": "booted", "type": "app"},
                    {"timestamp": "t2", "message": "listening", "type": "app"}
                ]
            })))
            .mount(&server)
            .await;

        let (app, _) = router(config_for(&server.uri()));
        let (status, body) = send(
            &app,
            post_json(
                "/mcp/invoke",
                serde_json::json!({"tool": "render_get_logs", "parameters": {"limit": 2}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["tool"], "render_get_logs");
        assert_eq!(body["result"]["count"], 2);
        assert_eq!(body["result"]["logs"][1]["message"], "listening");
    }

    #[tokio::test]
    async fn test_invoke_update_env_var() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/services/srv-test/env-vars/LOG_LEVEL"))
            .and(body_json(serde_json::json!({"value": "debug"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let (app, _) = router(config_for(&server.uri()));
        let (status, body) = send(
            &app,
            post_json(
                "/mcp/invoke",
                serde_json::json!({
                    "tool": "render_update_env_var",
                    "parameters": {"key": "LOG_LEVEL", "value": "debug"}
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["updated"], true);
    }

    #[tokio::test]
    async fn test_invoke_update_env_var_requires_value() {
        let server = MockServer::start().await;
        let (app, _) = router(config_for(&server.uri()));

        let (status, body) = send(
            &app,
            post_json(
                "/mcp/invoke",
                serde_json::json!({"tool": "render_update_env_var", "parameters": {"key": "LOG_LEVEL"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "key and value required");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool_is_404() {
        let (app, _) = router(config_for("http://127.0.0.1:9"));
        let (status, body) = send(
            &app,
            post_json("/mcp/invoke", serde_json::json!({"tool": "render_reboot"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unknown tool: render_reboot");
    }

    #[tokio::test]
    async fn test_invoke_kill_switch_is_503() {
        let config = config_for("http://127.0.0.1:9").with_credentials(Credentials::new(
            None,
            Some("rnd-test".to_string()),
            Some("srv-test".to_string()),
            true,
        ));
        let (app, _) = router(config);

        let (status, _) = send(
            &app,
            post_json("/mcp/invoke", serde_json::json!({"tool": "render_get_logs"})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_invoke_without_render_key_is_500() {
        let config = config_for("http://127.0.0.1:9")
            .with_credentials(Credentials::new(None, None, Some("srv-test".to_string()), false));
        let (app, _) = router(config);

        let (status, body) = send(
            &app,
            post_json("/mcp/invoke", serde_json::json!({"tool": "render_get_service_status"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "RENDER_API_KEY not configured");
    }

    #[tokio::test]
    async fn test_invoke_upstream_error_is_reported_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/services/srv-test"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let (app, _) = router(config_for(&server.uri()));
        let (status, body) = send(
            &app,
            post_json("/mcp/invoke", serde_json::json!({"tool": "render_get_service_status"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Render API error: 401");
        assert_eq!(body["details"], "unauthorized");
    }
}
