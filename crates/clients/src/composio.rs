//! Composio tools API client.

use crate::config::ComposioConfig;
use crate::error::{ClientError, ClientResult};
use crate::provider::ToolProvider;
use crate::transport::HttpTransport;
use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Listing page size; the provider's maximum.
pub const PAGE_SIZE: u32 = 100;

/// Tool object as the provider returns it. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTool {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub input_parameters: Option<serde_json::Value>,
}

impl RawTool {
    /// Parameter schema, preferring `parameters` over `input_parameters`.
    pub fn parameter_schema(&self) -> Option<&serde_json::Value> {
        self.parameters
            .as_ref()
            .or(self.input_parameters.as_ref())
            .filter(|schema| !schema.is_null())
    }
}

/// One page of the cursor-paginated tool listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPage {
    #[serde(default)]
    pub items: Vec<RawTool>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

impl ToolPage {
    /// Cursor for the following page; an empty token means end of data.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Serialize)]
struct ExecuteToolRequest<'a> {
    input: serde_json::Value,
    #[serde(rename = "connectedAccountId", skip_serializing_if = "Option::is_none")]
    connected_account_id: Option<&'a str>,
}

/// Client for the Composio v3 tools API and the v1 actions API.
#[derive(Debug, Clone)]
pub struct ComposioClient {
    tools: Option<HttpTransport>,
    actions: Option<HttpTransport>,
    config: ComposioConfig,
}

impl ComposioClient {
    /// Build the client. A missing API key is not an error: the client is
    /// created unconfigured and every call degrades.
    pub fn new(config: ComposioConfig) -> ClientResult<Self> {
        let (tools, actions) = match config.api_key.as_deref() {
            Some(api_key) => {
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::HeaderName::from_static("x-api-key"),
                    header::HeaderValue::from_str(api_key)
                        .map_err(|_| ClientError::Config("Invalid Composio API key format".to_string()))?,
                );
                let tools = HttpTransport::new(config.base_url.clone(), headers.clone(), config.read_timeout)?;
                let actions =
                    HttpTransport::new(config.actions_base_url.clone(), headers, config.read_timeout)?;
                (Some(tools), Some(actions))
            }
            None => {
                warn!("Composio API key not configured");
                (None, None)
            }
        };

        Ok(Self {
            tools,
            actions,
            config,
        })
    }
}

#[async_trait::async_trait]
impl ToolProvider for ComposioClient {
    fn is_configured(&self) -> bool {
        self.tools.is_some()
    }

    async fn fetch_tool_page(&self, cursor: Option<&str>) -> ClientResult<ToolPage> {
        let Some(transport) = &self.tools else {
            warn!("Cannot list Composio tools - API key not configured");
            return Ok(ToolPage::default());
        };

        let page_size = PAGE_SIZE.to_string();
        let mut query = vec![
            ("pageSize", page_size.as_str()),
            ("showAll", "true"),
            ("includeLocal", "true"),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        transport.get_with_query(&["tools"], &query).await
    }

    async fn fetch_tool_detail(&self, slug: &str) -> ClientResult<Option<RawTool>> {
        let Some(transport) = &self.tools else {
            warn!(slug, "Cannot get Composio tool - API key not configured");
            return Ok(None);
        };

        match transport.get(&["tools", slug]).await {
            Ok(tool) => Ok(Some(tool)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn execute_tool(
        &self,
        slug: &str,
        input: serde_json::Value,
        connected_account_id: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        let transport = self
            .tools
            .as_ref()
            .ok_or(ClientError::NotConfigured("Composio API key not configured"))?;

        let request = ExecuteToolRequest {
            input,
            connected_account_id,
        };
        let result = transport
            .post_with_timeout(
                &["tools", "execute", slug],
                &request,
                self.config.execute_timeout,
            )
            .await?;

        info!(tool = %slug, "Composio tool executed");
        Ok(result)
    }

    async fn execute_action(
        &self,
        action: &str,
        data: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        let transport = self
            .actions
            .as_ref()
            .ok_or(ClientError::NotConfigured("Composio API key not configured"))?;

        transport
            .post(&["actions", action, "execute"], &data)
            .await
    }
}
