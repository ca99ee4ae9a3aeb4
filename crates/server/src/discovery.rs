// Fixed discovery documents for AI-agent connectors. The gateway has no
// authentication, and every document says so.

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use crate::config::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/.well-known/ai-plugin.json", get(plugin_manifest))
        .route(
            "/.well-known/oauth-authorization-server",
            get(oauth_authorization_server),
        )
        .route(
            "/.well-known/oauth-protected-resource",
            get(oauth_protected_resource),
        )
}

fn public_url(state: &AppState) -> &str {
    state.config.gateway.public_url.trim_end_matches('/')
}

async fn plugin_manifest(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let base = public_url(&state);
    Json(serde_json::json!({
        "schema_version": "v1",
        "name_for_human": "Composio Agent Gateway",
        "name_for_model": "composio_agent",
        "description_for_human": "Unified MCP server for Composio and Render tools.",
        "description_for_model": "Provides tool execution and deployment management through the MCP protocol. Tools include render_get_logs, render_trigger_deploy, and Composio actions.",
        "auth": { "type": "none" },
        "api": {
            "type": "openapi",
            "url": format!("{}/openapi.json", base),
        },
        "mcp": {
            "sse_url": format!("{}/sse", base),
            "message_url": format!("{}/message", base),
            "http_url": format!("{}/mcp", base),
        },
        "logo_url": format!("{}/logo.png", base),
    }))
}

async fn oauth_authorization_server(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "issuer": public_url(&state),
        "authentication_required": false,
        "grant_types_supported": [],
        "response_types_supported": [],
        "token_endpoint_auth_methods_supported": ["none"],
    }))
}

async fn oauth_protected_resource(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "resource": public_url(&state),
        "authentication_required": false,
        "authorization_servers": [],
        "bearer_methods_supported": [],
    }))
}
