// MCP JSON-RPC dispatcher shared by the HTTP and SSE transports

use crate::catalog::ToolCatalog;
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListPromptsResult, ListResourcesResult, ListToolsResult,
    Method, PromptsCapability, ResourcesCapability, ServerCapabilities, ServerInfo,
    ToolsCapability, MCP_PROTOCOL_VERSION,
};
use crate::tools::RenderTool;
use composio_gateway_clients::{DeploymentProvider, ToolProvider};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SERVER_NAME: &str = "Composio Agent Gateway";
pub const SERVER_VERSION: &str = "1.0.0";
pub const SERVER_INSTRUCTIONS: &str = "MCP server for Composio and Render tools. \
Use available tools to manage deployments, run Composio actions, and monitor services.";

/// Why a single method call produced no result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("{0}")]
    InvalidParams(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DispatchError> for JsonRpcError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::MethodNotFound(method) => JsonRpcError::method_not_found(&method),
            DispatchError::InvalidParams(message) => JsonRpcError::invalid_params(message),
            DispatchError::Internal(e) => JsonRpcError::internal_error(format!("{:#}", e)),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(err.into())
    }
}

/// Where a `tools/call` name is sent. The prefix check runs first, so a
/// provider tool whose name starts with `render_` can never be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolRoute {
    Deployment(RenderTool),
    UnknownDeployment,
    Provider,
}

impl ToolRoute {
    fn resolve(name: &str) -> Self {
        if !RenderTool::claims(name) {
            return Self::Provider;
        }
        match RenderTool::from_name(name) {
            Some(tool) => Self::Deployment(tool),
            None => Self::UnknownDeployment,
        }
    }
}

/// Stateless JSON-RPC handler. Each call is independent; the only state is
/// the injected upstream clients.
pub struct McpServer {
    catalog: ToolCatalog,
    tools: Arc<dyn ToolProvider>,
    deployments: Arc<dyn DeploymentProvider>,
}

impl McpServer {
    pub fn new(tools: Arc<dyn ToolProvider>, deployments: Arc<dyn DeploymentProvider>) -> Self {
        Self {
            catalog: ToolCatalog::new(tools.clone()),
            tools,
            deployments,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Handle a raw message body. Unparsable JSON is a parse error with a
    /// `null` id.
    pub async fn handle_message(&self, body: &[u8]) -> JsonRpcResponse {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(raw) => self.handle_value(raw).await,
            Err(e) => {
                warn!(error = %e, "Rejected unparsable JSON-RPC message");
                JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error(e))
            }
        }
    }

    /// Handle a decoded JSON value, validating the envelope first.
    pub async fn handle_value(&self, raw: serde_json::Value) -> JsonRpcResponse {
        let id = raw.get("id").cloned().unwrap_or(serde_json::Value::Null);

        match serde_json::from_value::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed JSON-RPC envelope");
                JsonRpcResponse::error(id, JsonRpcError::invalid_request(e))
            }
        }
    }

    /// Route one request. Every outcome, including a panic inside a handler,
    /// comes back as a response carrying the request id.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.response_id();
        let method = Method::parse(&request.method);
        let params = request.params.unwrap_or_else(|| serde_json::json!({}));

        info!(method = method.as_str(), "JSON-RPC request");

        let outcome = AssertUnwindSafe(self.dispatch(&method, params))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                Err(DispatchError::Internal(anyhow::anyhow!(message)))
            });

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                match &err {
                    DispatchError::Internal(e) => {
                        error!(method = method.as_str(), error = ?e, "JSON-RPC internal error")
                    }
                    other => warn!(method = method.as_str(), error = %other, "JSON-RPC request rejected"),
                }
                JsonRpcResponse::error(id, err.into())
            }
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, DispatchError> {
        let result = match method {
            Method::Initialize => serde_json::to_value(self.initialize(params))?,
            Method::ToolsList => serde_json::to_value(self.list_tools().await)?,
            Method::ToolsCall => {
                let params: CallToolParams = serde_json::from_value(params).map_err(|e| {
                    DispatchError::InvalidParams(format!("Invalid tools/call params: {}", e))
                })?;
                serde_json::to_value(self.call_tool(params).await)?
            }
            Method::ResourcesList => serde_json::to_value(ListResourcesResult::default())?,
            Method::PromptsList => serde_json::to_value(ListPromptsResult::default())?,
            Method::Unknown(name) => return Err(DispatchError::MethodNotFound(name.clone())),
        };
        Ok(result)
    }

    fn initialize(&self, params: serde_json::Value) -> InitializeResult {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        let client = params
            .client_info
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("unknown");
        info!(client, "MCP initialize");

        InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: true },
                resources: ResourcesCapability {
                    subscribe: false,
                    list_changed: false,
                },
                prompts: PromptsCapability { list_changed: false },
                logging: serde_json::json!({}),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
            instructions: SERVER_INSTRUCTIONS.to_string(),
        }
    }

    pub async fn list_tools(&self) -> ListToolsResult {
        ListToolsResult {
            tools: self.catalog.list_all_tools().await,
        }
    }

    /// Execute a tool. Tool-level failures are reported inside the result
    /// with `isError`, never as a JSON-RPC error.
    pub async fn call_tool(&self, params: CallToolParams) -> CallToolResult {
        let name = params.name.as_str();
        info!(tool = %name, "Tool call");

        match ToolRoute::resolve(name) {
            ToolRoute::Deployment(tool) => {
                match tool.invoke(self.deployments.as_ref(), params.arguments()).await {
                    Ok(result) => CallToolResult::text(to_text(&result)),
                    Err(e) => {
                        error!(tool = %name, error = %e, "Deployment tool failed");
                        CallToolResult::error(format!("Error executing tool: {}", e))
                    }
                }
            }
            ToolRoute::UnknownDeployment => CallToolResult::error(format!("Unknown tool: {}", name)),
            ToolRoute::Provider => {
                let result = self
                    .tools
                    .execute_tool(
                        name,
                        params.arguments(),
                        params.connected_account_id.as_deref(),
                    )
                    .await;
                match result {
                    Ok(result) => CallToolResult::text(to_text(&result)),
                    Err(e) => {
                        error!(tool = %name, error = %e, "Provider tool failed");
                        CallToolResult::error(format!("Tool execution failed for {}: {}", name, e))
                    }
                }
            }
        }
    }
}

fn to_text(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
