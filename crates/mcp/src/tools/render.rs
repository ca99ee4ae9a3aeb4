// Deployment-management tools backed by the Render API

use crate::protocol::ToolSchema;
use crate::tools::{
    empty_object_schema, json_schema_boolean, json_schema_integer, json_schema_object,
    json_schema_string, with_default,
};
use composio_gateway_clients::{ClientError, DeploymentProvider};
use serde::Deserialize;
use tracing::info;

/// Every deployment tool name starts with this prefix, and any `tools/call`
/// name carrying it is routed here, even if no tool matches.
pub const RENDER_TOOL_PREFIX: &str = "render_";

pub const DEFAULT_LOG_LIMIT: u32 = 100;
pub const DEFAULT_DEPLOY_LIMIT: u32 = 10;

/// The fixed deployment tool set, in listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTool {
    GetServiceStatus,
    GetLatestDeploy,
    GetLogs,
    ListDeploys,
    TriggerDeploy,
    GetEnvVars,
    UpdateEnvVar,
    GetMetrics,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderToolError {
    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: &'static str, message: String },

    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

// Optional fields so an explicit `null` also falls back to the default.
#[derive(Debug, Deserialize)]
struct LogsArgs {
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListDeploysArgs {
    #[serde(default)]
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TriggerDeployArgs {
    #[serde(default)]
    clear_cache: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct UpdateEnvVarArgs {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl RenderTool {
    pub const ALL: [RenderTool; 8] = [
        RenderTool::GetServiceStatus,
        RenderTool::GetLatestDeploy,
        RenderTool::GetLogs,
        RenderTool::ListDeploys,
        RenderTool::TriggerDeploy,
        RenderTool::GetEnvVars,
        RenderTool::UpdateEnvVar,
        RenderTool::GetMetrics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::GetServiceStatus => "render_get_service_status",
            Self::GetLatestDeploy => "render_get_latest_deploy",
            Self::GetLogs => "render_get_logs",
            Self::ListDeploys => "render_list_deploys",
            Self::TriggerDeploy => "render_trigger_deploy",
            Self::GetEnvVars => "render_get_env_vars",
            Self::UpdateEnvVar => "render_update_env_var",
            Self::GetMetrics => "render_get_metrics",
        }
    }

    /// Exact-name lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// Whether `name` belongs to the deployment bucket at all.
    pub fn claims(name: &str) -> bool {
        name.starts_with(RENDER_TOOL_PREFIX)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::GetServiceStatus => "Get current status of Render service including deployment state",
            Self::GetLatestDeploy => "Get information about the latest deployment",
            Self::GetLogs => "Fetch recent logs from the Render service",
            Self::ListDeploys => "List recent deployments",
            Self::TriggerDeploy => "Trigger a new deployment with optional cache clear",
            Self::GetEnvVars => "List all environment variables",
            Self::UpdateEnvVar => "Update an environment variable",
            Self::GetMetrics => "Get service metrics (CPU, memory, bandwidth)",
        }
    }

    pub fn input_schema(self) -> serde_json::Value {
        match self {
            Self::GetLogs => json_schema_object(
                serde_json::json!({
                    "limit": with_default(
                        json_schema_integer("Number of log lines to fetch"),
                        serde_json::json!(DEFAULT_LOG_LIMIT),
                    )
                }),
                vec![],
            ),
            Self::ListDeploys => json_schema_object(
                serde_json::json!({
                    "limit": with_default(
                        json_schema_integer("Number of deployments to list"),
                        serde_json::json!(DEFAULT_DEPLOY_LIMIT),
                    )
                }),
                vec![],
            ),
            Self::TriggerDeploy => json_schema_object(
                serde_json::json!({
                    "clear_cache": with_default(
                        json_schema_boolean("Whether to clear build cache"),
                        serde_json::json!(false),
                    )
                }),
                vec![],
            ),
            Self::UpdateEnvVar => json_schema_object(
                serde_json::json!({
                    "key": json_schema_string("Environment variable key"),
                    "value": json_schema_string("Environment variable value")
                }),
                vec!["key", "value"],
            ),
            Self::GetServiceStatus | Self::GetLatestDeploy | Self::GetEnvVars | Self::GetMetrics => {
                empty_object_schema()
            }
        }
    }

    pub fn schema(self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Schemas for the whole set, in listing order.
    pub fn schemas() -> Vec<ToolSchema> {
        Self::ALL.into_iter().map(Self::schema).collect()
    }

    fn parse_args<T: serde::de::DeserializeOwned>(
        self,
        arguments: serde_json::Value,
    ) -> Result<T, RenderToolError> {
        let arguments = if arguments.is_null() {
            serde_json::json!({})
        } else {
            arguments
        };
        serde_json::from_value(arguments).map_err(|e| RenderToolError::InvalidArguments {
            tool: self.name(),
            message: e.to_string(),
        })
    }

    /// Run the tool against the deployment provider, mapping arguments with
    /// their named defaults.
    pub async fn invoke(
        self,
        provider: &dyn DeploymentProvider,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, RenderToolError> {
        info!(tool = self.name(), "Invoking deployment tool");

        let result = match self {
            Self::GetServiceStatus => serde_json::to_value(provider.get_service().await?)?,
            Self::GetLatestDeploy => match provider.get_latest_deploy().await? {
                Some(deploy) => serde_json::to_value(deploy)?,
                None => serde_json::json!({ "message": "No deployments found" }),
            },
            Self::GetLogs => {
                let args: LogsArgs = self.parse_args(arguments)?;
                let logs = provider.get_logs(args.limit.unwrap_or(DEFAULT_LOG_LIMIT)).await?;
                serde_json::json!({ "count": logs.len(), "logs": logs })
            }
            Self::ListDeploys => {
                let args: ListDeploysArgs = self.parse_args(arguments)?;
                let deploys = provider
                    .list_deploys(args.limit.unwrap_or(DEFAULT_DEPLOY_LIMIT))
                    .await?;
                serde_json::json!({ "count": deploys.len(), "deploys": deploys })
            }
            Self::TriggerDeploy => {
                let args: TriggerDeployArgs = self.parse_args(arguments)?;
                let deploy = provider.trigger_deploy(args.clear_cache.unwrap_or(false)).await?;
                serde_json::json!({
                    "id": deploy.id,
                    "status": deploy.status,
                    "created_at": deploy.created_at,
                    "message": "Deployment triggered successfully"
                })
            }
            Self::GetEnvVars => {
                let variables = provider.get_env_vars().await?;
                serde_json::json!({ "count": variables.len(), "variables": variables })
            }
            Self::UpdateEnvVar => {
                let args: UpdateEnvVarArgs = self.parse_args(arguments)?;
                let (Some(key), Some(value)) = (
                    args.key.filter(|k| !k.is_empty()),
                    args.value.filter(|v| !v.is_empty()),
                ) else {
                    return Err(RenderToolError::InvalidArguments {
                        tool: self.name(),
                        message: "key and value required".to_string(),
                    });
                };
                serde_json::to_value(provider.update_env_var(&key, &value).await?)?
            }
            Self::GetMetrics => provider.get_metrics().await?,
        };

        Ok(result)
    }
}
