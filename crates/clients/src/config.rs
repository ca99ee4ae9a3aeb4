//! Configuration types for the upstream clients.

use std::time::Duration;
use url::Url;

pub const DEFAULT_COMPOSIO_BASE_URL: &str = "https://backend.composio.dev/api/v3";
pub const DEFAULT_COMPOSIO_ACTIONS_URL: &str = "https://api.composio.dev/api/v1";
pub const DEFAULT_RENDER_BASE_URL: &str = "https://api.render.com/v1";

/// Configuration for the Composio tool-provider client.
#[derive(Debug, Clone)]
pub struct ComposioConfig {
    /// API key sent as `x-api-key`. Without it every call degrades.
    pub api_key: Option<String>,
    /// Base URL of the v3 tools API.
    pub base_url: Url,
    /// Base URL of the v1 actions API used by the generic invoke proxy.
    pub actions_base_url: Url,
    /// Ceiling for listing and detail lookups.
    pub read_timeout: Duration,
    /// Ceiling for tool execution.
    pub execute_timeout: Duration,
}

impl ComposioConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            base_url: Url::parse(DEFAULT_COMPOSIO_BASE_URL).expect("valid default URL"),
            actions_base_url: Url::parse(DEFAULT_COMPOSIO_ACTIONS_URL).expect("valid default URL"),
            read_timeout: Duration::from_secs(30),
            execute_timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_actions_base_url(mut self, actions_base_url: Url) -> Self {
        self.actions_base_url = actions_base_url;
        self
    }
}

/// Configuration for the Render deployment-provider client.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Bearer token for the Render API.
    pub api_key: Option<String>,
    /// Service all operations target.
    pub service_id: Option<String>,
    pub base_url: Url,
    pub timeout: Duration,
}

impl RenderConfig {
    pub fn new(api_key: Option<String>, service_id: Option<String>) -> Self {
        Self {
            api_key,
            service_id,
            base_url: Url::parse(DEFAULT_RENDER_BASE_URL).expect("valid default URL"),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }
}
