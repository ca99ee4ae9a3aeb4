use anyhow::{Context, Result};
use composio_gateway_clients::{
    ComposioClient, ComposioConfig, DeploymentProvider, RenderClient, RenderConfig, ToolProvider,
};
use composio_gateway_mcp::McpServer;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Non-secret settings read from the TOML file. Credentials and switches
/// come from the environment and are attached afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_composio_base_url")]
    pub composio_base_url: String,

    #[serde(default = "default_composio_actions_url")]
    pub composio_actions_url: String,

    #[serde(default = "default_render_base_url")]
    pub render_base_url: String,

    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_execute_timeout_secs")]
    pub execute_timeout_secs: u64,
}

fn default_composio_base_url() -> String {
    composio_gateway_clients::config::DEFAULT_COMPOSIO_BASE_URL.to_string()
}

fn default_composio_actions_url() -> String {
    composio_gateway_clients::config::DEFAULT_COMPOSIO_ACTIONS_URL.to_string()
}

fn default_render_base_url() -> String {
    composio_gateway_clients::config::DEFAULT_RENDER_BASE_URL.to_string()
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_execute_timeout_secs() -> u64 {
    60
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            composio_base_url: default_composio_base_url(),
            composio_actions_url: default_composio_actions_url(),
            render_base_url: default_render_base_url(),
            read_timeout_secs: default_read_timeout_secs(),
            execute_timeout_secs: default_execute_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Externally reachable URL, advertised in the discovery manifest.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Static tool definition document served by `GET /schema`.
    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,

    #[serde(default = "default_sse_keep_alive_secs")]
    pub sse_keep_alive_secs: u64,
}

fn default_public_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("config/mcp_endpoints.json")
}

fn default_sse_keep_alive_secs() -> u64 {
    1
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            public_url: default_public_url(),
            schema_path: default_schema_path(),
            sse_keep_alive_secs: default_sse_keep_alive_secs(),
        }
    }
}

/// Secrets and switches taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub composio_api_key: Option<String>,
    pub render_api_key: Option<String>,
    pub render_service_id: Option<String>,
    pub kill_switch: bool,
}

impl Credentials {
    /// Empty strings count as unset.
    pub fn new(
        composio_api_key: Option<String>,
        render_api_key: Option<String>,
        render_service_id: Option<String>,
        kill_switch: bool,
    ) -> Self {
        Self {
            composio_api_key: non_empty(composio_api_key),
            render_api_key: non_empty(render_api_key),
            render_service_id: non_empty(render_service_id),
            kill_switch,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load the config file if it exists, otherwise use defaults. A file that
    /// exists but does not parse is an error.
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::info!(
                path = %config_path.display(),
                "Configuration file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read configuration file {}", config_path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file {}", config_path.display()))?;

        tracing::info!(path = %config_path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.gateway.sse_keep_alive_secs.max(1))
    }

    fn composio_config(&self) -> Result<ComposioConfig> {
        let mut config = ComposioConfig::new(self.credentials.composio_api_key.clone())
            .with_base_url(parse_url("upstream.composio_base_url", &self.upstream.composio_base_url)?)
            .with_actions_base_url(parse_url(
                "upstream.composio_actions_url",
                &self.upstream.composio_actions_url,
            )?);
        config.read_timeout = Duration::from_secs(self.upstream.read_timeout_secs);
        config.execute_timeout = Duration::from_secs(self.upstream.execute_timeout_secs);
        Ok(config)
    }

    fn render_config(&self) -> Result<RenderConfig> {
        let mut config = RenderConfig::new(
            self.credentials.render_api_key.clone(),
            self.credentials.render_service_id.clone(),
        )
        .with_base_url(parse_url("upstream.render_base_url", &self.upstream.render_base_url)?);
        config.timeout = Duration::from_secs(self.upstream.read_timeout_secs);
        Ok(config)
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("Invalid URL in {}: {}", field, value))
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub mcp: Arc<McpServer>,
    pub tools: Arc<dyn ToolProvider>,
    pub deployments: Arc<dyn DeploymentProvider>,
    pub config: Arc<ServerConfig>,
    /// Cancelled on shutdown; every SSE session holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ServerConfig, shutdown: CancellationToken) -> Result<Self> {
        let tools: Arc<dyn ToolProvider> = Arc::new(
            ComposioClient::new(config.composio_config()?)
                .context("Failed to create Composio client")?,
        );
        let deployments: Arc<dyn DeploymentProvider> = Arc::new(
            RenderClient::new(config.render_config()?).context("Failed to create Render client")?,
        );

        if !deployments.is_configured() {
            tracing::warn!("Render credentials incomplete - deployment tools will report not configured");
        }

        Ok(Self {
            mcp: Arc::new(McpServer::new(tools.clone(), deployments.clone())),
            tools,
            deployments,
            config: Arc::new(config),
            shutdown,
        })
    }

    pub fn kill_switch(&self) -> bool {
        self.config.credentials.kill_switch
    }
}
