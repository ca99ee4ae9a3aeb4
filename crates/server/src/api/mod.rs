use crate::config::AppState;
use crate::{discovery, sse};
use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

mod deployments;
mod handlers;
mod mcp;

/// Start the API server and run until a shutdown signal arrives.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, cancelling `shutdown` so open SSE
/// sessions end and the server can drain.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received, closing SSE sessions");
    shutdown.cancel();
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // REST routes
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/schema", get(handlers::schema))
        .route("/schema/{slug}", get(handlers::tool_schema))
        .route("/invoke", post(handlers::invoke))
        // Deployment management
        .route("/mcp/tools", get(deployments::list_tools))
        .route("/mcp/invoke", post(deployments::invoke))
        // MCP JSON-RPC transports
        .route("/mcp", post(mcp::rpc))
        .route("/message", post(mcp::sse_message))
        .route("/sse", get(sse::sse_handler))
        .merge(discovery::routes())
        // Middleware
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// UTC timestamp stamped on REST responses.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
            details: None,
            timestamp: timestamp(),
        }
    }
}

/// Error type for REST handlers: an HTTP status plus the JSON error body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(error),
        }
    }

    /// Machine-readable reason, e.g. `validation_failed`.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.body.status = Some(reason.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }

    pub fn kill_switch() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "service disabled").with_reason("kill_switch_active")
    }

    pub fn not_configured(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error).with_reason("configuration_error")
    }

    pub fn validation(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error).with_reason("validation_failed")
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        let details = err
            .chain()
            .skip(1)
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join(": ");

        tracing::error!(error = %err, "Request failed");
        let api_error = Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string());
        if details.is_empty() {
            api_error
        } else {
            api_error.with_details(details)
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config_for, get, router, send};
    use axum::http::header;
    use tower::ServiceExt;

    #[test]
    fn test_kill_switch_error_shape() {
        let error = ApiError::kill_switch();
        assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);

        let json = serde_json::to_value(&error.body).unwrap();
        assert_eq!(json["error"], "service disabled");
        assert_eq!(json["status"], "kill_switch_active");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_anyhow_error_keeps_context_chain() {
        let error: ApiError = anyhow::anyhow!("disk unreachable")
            .context("Failed to read schema")
            .into();

        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.body.error, "Failed to read schema");
        assert_eq!(error.body.details.as_deref(), Some("disk unreachable"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (app, _) = router(config_for("http://127.0.0.1:9"));
        let response = app.oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (app, _) = router(config_for("http://127.0.0.1:9"));
        let request = axum::http::Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "https://claude.ai")
            .body(axum::body::Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_health_route_is_mounted() {
        let (app, _) = router(config_for("http://127.0.0.1:9"));
        let (status, body) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
