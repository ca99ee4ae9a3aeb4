//! Seams between the gateway and its upstream services.
//!
//! The dispatcher and the REST surface only see these traits, so tests can
//! substitute in-process doubles for the real HTTP clients.

use crate::composio::{RawTool, ToolPage};
use crate::error::ClientResult;
use crate::render::{Deployment, EnvVar, EnvVarUpdate, LogEntry, ServiceStatus};

/// Upstream that lists and executes third-party tools.
#[async_trait::async_trait]
pub trait ToolProvider: Send + Sync {
    /// Whether credentials are present at all.
    fn is_configured(&self) -> bool;

    /// Fetch one page of the tool listing. `None` requests the first page.
    async fn fetch_tool_page(&self, cursor: Option<&str>) -> ClientResult<ToolPage>;

    /// Look up a single tool. Absent when the provider does not know the slug.
    async fn fetch_tool_detail(&self, slug: &str) -> ClientResult<Option<RawTool>>;

    /// Execute a tool and return the provider's raw result payload.
    async fn execute_tool(
        &self,
        slug: &str,
        input: serde_json::Value,
        connected_account_id: Option<&str>,
    ) -> ClientResult<serde_json::Value>;

    /// Execute a named action through the provider's legacy actions API.
    async fn execute_action(
        &self,
        action: &str,
        data: serde_json::Value,
    ) -> ClientResult<serde_json::Value>;
}

/// Upstream that hosts the deployed service.
#[async_trait::async_trait]
pub trait DeploymentProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn get_service(&self) -> ClientResult<ServiceStatus>;

    async fn get_latest_deploy(&self) -> ClientResult<Option<Deployment>>;

    async fn list_deploys(&self, limit: u32) -> ClientResult<Vec<Deployment>>;

    async fn trigger_deploy(&self, clear_cache: bool) -> ClientResult<Deployment>;

    async fn get_logs(&self, limit: u32) -> ClientResult<Vec<LogEntry>>;

    async fn get_env_vars(&self) -> ClientResult<Vec<EnvVar>>;

    async fn update_env_var(&self, key: &str, value: &str) -> ClientResult<EnvVarUpdate>;

    /// Raw metrics document; plans without metrics yield an explanatory message.
    async fn get_metrics(&self) -> ClientResult<serde_json::Value>;
}
