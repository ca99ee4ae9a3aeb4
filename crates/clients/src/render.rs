//! Render deployment API client.

use crate::config::RenderConfig;
use crate::error::{ClientError, ClientResult};
use crate::provider::DeploymentProvider;
use crate::transport::HttpTransport;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Placeholder for secret environment variable values.
pub const REDACTED: &str = "***REDACTED***";

/// Projection of the Render service object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub service_type: Option<String>,
    pub state: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub url: Option<String>,
    pub branch: Option<String>,
    pub auto_deploy: Option<String>,
}

/// Read-only view of one deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: String,
    pub status: String,
    pub created_at: String,
    pub finished_at: Option<String>,
    pub commit_id: Option<String>,
    pub commit_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Environment variable with secrets already redacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVarUpdate {
    pub key: String,
    pub updated: bool,
    pub message: String,
}

// Upstream wire shapes. Every field is optional; the projections above fix
// the defaults.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawService {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    service_type: Option<String>,
    #[serde(default)]
    suspended: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    service_details: Option<RawServiceDetails>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    auto_deploy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawServiceDetails {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeploy {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    finished_at: Option<String>,
    #[serde(default)]
    commit: Option<RawCommit>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCommit {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Deploy endpoints answer either `{"deploy": {...}}` or the bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeployEnvelope {
    Wrapped { deploy: RawDeploy },
    Bare(RawDeploy),
}

#[derive(Debug, Default, Deserialize)]
struct RawLogs {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEnvVarItem {
    #[serde(default, rename = "envVar")]
    env_var: RawEnvVar,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvVar {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    is_secret: bool,
}

impl From<RawService> for ServiceStatus {
    fn from(raw: RawService) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            service_type: raw.service_type,
            state: raw.suspended,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            url: raw.service_details.and_then(|d| d.url),
            branch: raw.branch,
            auto_deploy: raw.auto_deploy,
        }
    }
}

impl From<RawDeploy> for Deployment {
    fn from(raw: RawDeploy) -> Self {
        let (commit_id, commit_message) = match raw.commit {
            Some(commit) => (commit.id, commit.message),
            None => (None, None),
        };
        Self {
            id: raw.id.unwrap_or_default(),
            status: raw.status.unwrap_or_else(|| "unknown".to_string()),
            created_at: raw.created_at.unwrap_or_default(),
            finished_at: raw.finished_at,
            commit_id,
            commit_message,
        }
    }
}

impl From<DeployEnvelope> for Deployment {
    fn from(envelope: DeployEnvelope) -> Self {
        match envelope {
            DeployEnvelope::Wrapped { deploy } | DeployEnvelope::Bare(deploy) => deploy.into(),
        }
    }
}

impl From<RawEnvVar> for EnvVar {
    fn from(raw: RawEnvVar) -> Self {
        let value = if raw.is_secret {
            REDACTED.to_string()
        } else {
            raw.value.unwrap_or_default()
        };
        Self { key: raw.key, value }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriggerDeployRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    clear_cache: Option<&'static str>,
}

/// Client for one Render service.
#[derive(Debug, Clone)]
pub struct RenderClient {
    transport: Option<HttpTransport>,
    service_id: Option<String>,
}

impl RenderClient {
    pub fn new(config: RenderConfig) -> ClientResult<Self> {
        let transport = match config.api_key.as_deref() {
            Some(api_key) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::AUTHORIZATION,
                    header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                        .map_err(|_| ClientError::Config("Invalid Render API key format".to_string()))?,
                );
                Some(HttpTransport::new(config.base_url.clone(), headers, config.timeout)?)
            }
            None => {
                warn!("Render API key not configured");
                None
            }
        };

        Ok(Self {
            transport,
            service_id: config.service_id,
        })
    }

    /// Transport plus the service id every call is rooted at.
    fn service(&self) -> ClientResult<(&HttpTransport, &str)> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(ClientError::NotConfigured("RENDER_API_KEY not configured"))?;
        let service_id = self
            .service_id
            .as_deref()
            .ok_or(ClientError::NotConfigured("RENDER_SERVICE_ID not configured"))?;
        Ok((transport, service_id))
    }

    async fn deploys(&self, limit: u32) -> ClientResult<Vec<Deployment>> {
        let (transport, service_id) = self.service()?;
        let items: Option<Vec<DeployEnvelope>> = transport
            .get_with_query(&["services", service_id, "deploys"], &[("limit", limit)])
            .await?;
        Ok(items.unwrap_or_default().into_iter().map(Deployment::from).collect())
    }
}

#[async_trait::async_trait]
impl DeploymentProvider for RenderClient {
    fn is_configured(&self) -> bool {
        self.transport.is_some() && self.service_id.is_some()
    }

    async fn get_service(&self) -> ClientResult<ServiceStatus> {
        let (transport, service_id) = self.service()?;
        let raw: Option<RawService> = transport.get(&["services", service_id]).await?;
        Ok(raw.unwrap_or_default().into())
    }

    async fn get_latest_deploy(&self) -> ClientResult<Option<Deployment>> {
        Ok(self.deploys(1).await?.into_iter().next())
    }

    async fn list_deploys(&self, limit: u32) -> ClientResult<Vec<Deployment>> {
        self.deploys(limit).await
    }

    async fn trigger_deploy(&self, clear_cache: bool) -> ClientResult<Deployment> {
        let (transport, service_id) = self.service()?;
        let request = TriggerDeployRequest {
            clear_cache: clear_cache.then_some("clear"),
        };
        let envelope: DeployEnvelope = transport
            .post(&["services", service_id, "deploys"], &request)
            .await?;
        let deployment = Deployment::from(envelope);

        info!(deploy_id = %deployment.id, clear_cache, "Render deploy triggered");
        Ok(deployment)
    }

    async fn get_logs(&self, limit: u32) -> ClientResult<Vec<LogEntry>> {
        let (transport, service_id) = self.service()?;
        let raw: Option<RawLogs> = transport
            .get_with_query(&["services", service_id, "logs"], &[("limit", limit)])
            .await?;
        Ok(raw.unwrap_or_default().logs)
    }

    async fn get_env_vars(&self) -> ClientResult<Vec<EnvVar>> {
        let (transport, service_id) = self.service()?;
        let items: Option<Vec<RawEnvVarItem>> = transport
            .get(&["services", service_id, "env-vars"])
            .await?;
        Ok(items
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.env_var.into())
            .collect())
    }

    async fn update_env_var(&self, key: &str, value: &str) -> ClientResult<EnvVarUpdate> {
        let (transport, service_id) = self.service()?;
        let _: serde_json::Value = transport
            .patch(
                &["services", service_id, "env-vars", key],
                &serde_json::json!({ "value": value }),
            )
            .await?;

        info!(key, "Render environment variable updated");
        Ok(EnvVarUpdate {
            key: key.to_string(),
            updated: true,
            message: "Environment variable updated successfully".to_string(),
        })
    }

    async fn get_metrics(&self) -> ClientResult<serde_json::Value> {
        let (transport, service_id) = self.service()?;
        match transport.get(&["services", service_id, "metrics"]).await {
            Ok(metrics) => Ok(metrics),
            Err(ClientError::Api { status: 402, .. }) => Ok(serde_json::json!({
                "message": "Metrics require paid Render plan"
            })),
            Err(e) => Err(e),
        }
    }
}
