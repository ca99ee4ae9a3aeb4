// Unified tool catalog: fixed deployment tools followed by provider tools

use crate::protocol::ToolSchema;
use crate::tools::{descriptor_from_raw, RenderTool};
use composio_gateway_clients::{RawTool, ToolProvider};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hard ceiling on listing pages per catalog build.
pub const MAX_TOOL_PAGES: usize = 20;

pub struct ToolCatalog {
    provider: Arc<dyn ToolProvider>,
}

impl ToolCatalog {
    pub fn new(provider: Arc<dyn ToolProvider>) -> Self {
        Self { provider }
    }

    /// Deployment tools in their fixed order, then every provider tool that
    /// could be fetched. Names are not de-duplicated. Never fails: a broken
    /// provider only shortens the dynamic part.
    pub async fn list_all_tools(&self) -> Vec<ToolSchema> {
        let mut tools = RenderTool::schemas();
        let fixed = tools.len();

        let fetched = self.fetch_provider_tools().await;
        tools.extend(fetched.iter().map(descriptor_from_raw));

        info!(fixed, dynamic = fetched.len(), "Tool catalog assembled");
        tools
    }

    /// Page through the provider listing until the cursor runs out, the
    /// reported total is reached, a page fails, or `MAX_TOOL_PAGES` pages
    /// have been read.
    pub async fn fetch_provider_tools(&self) -> Vec<RawTool> {
        let mut all_tools: Vec<RawTool> = Vec::new();
        let mut cursor: Option<String> = None;

        for page_num in 1..=MAX_TOOL_PAGES {
            let page = match self.provider.fetch_tool_page(cursor.as_deref()).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        page = page_num,
                        fetched = all_tools.len(),
                        error = %e,
                        "Tool listing failed, keeping tools fetched so far"
                    );
                    return all_tools;
                }
            };

            let next_cursor = page.next_cursor().map(str::to_string);
            let total_items = page.total_items;
            let page_len = page.items.len();
            all_tools.extend(page.items);

            debug!(page = page_num, page_len, total = all_tools.len(), "Fetched tool page");

            let reached_total = total_items.is_some_and(|total| all_tools.len() as u64 >= total);
            match next_cursor {
                Some(next) if !reached_total => cursor = Some(next),
                _ => return all_tools,
            }
        }

        warn!(
            pages = MAX_TOOL_PAGES,
            fetched = all_tools.len(),
            "Reached tool pagination limit"
        );
        all_tools
    }
}
