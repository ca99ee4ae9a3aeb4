//! # Composio gateway clients
//!
//! Thin request/response wrappers around the upstream APIs the gateway fronts:
//! the Composio tools API and the Render deployment API. Each client owns its
//! base URL, authentication header and JSON decoding, makes exactly one
//! attempt per call, and reports failures as [`ClientError`].
//!
//! ```rust,no_run
//! use composio_gateway_clients::{ComposioClient, ComposioConfig, ToolProvider};
//!
//! # async fn example() -> composio_gateway_clients::ClientResult<()> {
//! let client = ComposioClient::new(ComposioConfig::new(Some("ck-...".to_string())))?;
//! let page = client.fetch_tool_page(None).await?;
//! println!("{} tools on the first page", page.items.len());
//! # Ok(())
//! # }
//! ```

pub mod composio;
pub mod config;
pub mod error;
pub mod provider;
pub mod render;
pub mod transport;

pub use composio::{ComposioClient, RawTool, ToolPage};
pub use config::{ComposioConfig, RenderConfig};
pub use error::{ClientError, ClientResult};
pub use provider::{DeploymentProvider, ToolProvider};
pub use render::{Deployment, EnvVar, EnvVarUpdate, LogEntry, RenderClient, ServiceStatus};
