// In-process upstream doubles for dispatcher and catalog tests

use composio_gateway_clients::{
    ClientError, ClientResult, Deployment, DeploymentProvider, EnvVar, EnvVarUpdate, LogEntry,
    RawTool, ServiceStatus, ToolPage, ToolProvider,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn raw_tool(slug: &str) -> RawTool {
    RawTool {
        slug: Some(slug.to_string()),
        description: Some(format!("{} tool", slug)),
        ..Default::default()
    }
}

pub(crate) fn page(slugs: &[&str], next_cursor: Option<&str>, total: Option<u64>) -> ToolPage {
    ToolPage {
        items: slugs.iter().map(|s| raw_tool(s)).collect(),
        next_cursor: next_cursor.map(str::to_string),
        total_items: total,
    }
}

pub(crate) enum Listing {
    /// Scripted answers, one per fetch; `Err(status)` fails that fetch.
    /// Fetches past the script get an empty final page.
    Pages(Vec<Result<ToolPage, u16>>),
    /// Always hands out another cursor and never reports a total.
    Endless,
}

pub(crate) struct StubTools {
    listing: Listing,
    execute_fails: bool,
    fetch_calls: AtomicUsize,
    execute_calls: AtomicUsize,
    cursors: Mutex<Vec<Option<String>>>,
}

impl StubTools {
    pub(crate) fn new(listing: Listing) -> Self {
        Self {
            listing,
            execute_fails: false,
            fetch_calls: AtomicUsize::new(0),
            execute_calls: AtomicUsize::new(0),
            cursors: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Listing::Pages(Vec::new()))
    }

    pub(crate) fn failing_execution(mut self) -> Self {
        self.execute_fails = true;
        self
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ToolProvider for StubTools {
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_tool_page(&self, cursor: Option<&str>) -> ClientResult<ToolPage> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.cursors.lock().unwrap().push(cursor.map(str::to_string));

        match &self.listing {
            Listing::Pages(pages) => match pages.get(call) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(status)) => Err(ClientError::from_response(*status, "upstream failure")),
                None => Ok(ToolPage::default()),
            },
            Listing::Endless => Ok(page(
                &[format!("ENDLESS_{}", call).as_str()],
                Some(format!("cursor-{}", call + 1).as_str()),
                None,
            )),
        }
    }

    async fn fetch_tool_detail(&self, slug: &str) -> ClientResult<Option<RawTool>> {
        Ok(Some(raw_tool(slug)))
    }

    async fn execute_tool(
        &self,
        slug: &str,
        input: serde_json::Value,
        connected_account_id: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        if self.execute_fails {
            return Err(ClientError::from_response(404, format!("Tool {} not found", slug)));
        }
        Ok(serde_json::json!({
            "successful": true,
            "tool": slug,
            "input": input,
            "account": connected_account_id,
        }))
    }

    async fn execute_action(
        &self,
        action: &str,
        data: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        Ok(serde_json::json!({ "action": action, "data": data }))
    }
}

/// Provider whose every call panics with `message`.
pub(crate) struct PanickingTools {
    pub(crate) message: &'static str,
}

#[async_trait::async_trait]
impl ToolProvider for PanickingTools {
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_tool_page(&self, _cursor: Option<&str>) -> ClientResult<ToolPage> {
        panic!("{}", self.message)
    }

    async fn fetch_tool_detail(&self, _slug: &str) -> ClientResult<Option<RawTool>> {
        panic!("{}", self.message)
    }

    async fn execute_tool(
        &self,
        _slug: &str,
        _input: serde_json::Value,
        _connected_account_id: Option<&str>,
    ) -> ClientResult<serde_json::Value> {
        panic!("{}", self.message)
    }

    async fn execute_action(
        &self,
        _action: &str,
        _data: serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        panic!("{}", self.message)
    }
}

#[derive(Default)]
pub(crate) struct StubDeployments {
    log_lines: usize,
    failing: bool,
    calls: AtomicUsize,
    last_limit: Mutex<Option<u32>>,
    last_clear_cache: Mutex<Option<bool>>,
}

impl StubDeployments {
    pub(crate) fn with_logs(log_lines: usize) -> Self {
        Self {
            log_lines,
            ..Default::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_limit(&self) -> Option<u32> {
        *self.last_limit.lock().unwrap()
    }

    pub(crate) fn last_clear_cache(&self) -> Option<bool> {
        *self.last_clear_cache.lock().unwrap()
    }

    fn record(&self) -> ClientResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(ClientError::from_response(503, "render unavailable"));
        }
        Ok(())
    }
}

fn deployment(id: &str) -> Deployment {
    Deployment {
        id: id.to_string(),
        status: "live".to_string(),
        created_at: "2024-05-01T12:00:00Z".to_string(),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl DeploymentProvider for StubDeployments {
    fn is_configured(&self) -> bool {
        true
    }

    async fn get_service(&self) -> ClientResult<ServiceStatus> {
        self.record()?;
        Ok(ServiceStatus {
            id: Some("srv-1".to_string()),
            name: Some("gateway".to_string()),
            ..Default::default()
        })
    }

    async fn get_latest_deploy(&self) -> ClientResult<Option<Deployment>> {
        self.record()?;
        Ok(None)
    }

    async fn list_deploys(&self, limit: u32) -> ClientResult<Vec<Deployment>> {
        self.record()?;
        *self.last_limit.lock().unwrap() = Some(limit);
        Ok((0..limit.min(3)).map(|i| deployment(&format!("dep-{}", i))).collect())
    }

    async fn trigger_deploy(&self, clear_cache: bool) -> ClientResult<Deployment> {
        self.record()?;
        *self.last_clear_cache.lock().unwrap() = Some(clear_cache);
        Ok(deployment("dep-new"))
    }

    async fn get_logs(&self, limit: u32) -> ClientResult<Vec<LogEntry>> {
        self.record()?;
        *self.last_limit.lock().unwrap() = Some(limit);
        Ok((0..self.log_lines.min(limit as usize))
            .map(|i| LogEntry {
                timestamp: Some(format!("2024-05-01T12:00:0{}Z", i)),
                message: Some(format!("line {}", i)),
                kind: Some("app".to_string()),
            })
            .collect())
    }

    async fn get_env_vars(&self) -> ClientResult<Vec<EnvVar>> {
        self.record()?;
        Ok(vec![EnvVar {
            key: "LOG_LEVEL".to_string(),
            value: "info".to_string(),
        }])
    }

    async fn update_env_var(&self, key: &str, _value: &str) -> ClientResult<EnvVarUpdate> {
        self.record()?;
        Ok(EnvVarUpdate {
            key: key.to_string(),
            updated: true,
            message: "Environment variable updated successfully".to_string(),
        })
    }

    async fn get_metrics(&self) -> ClientResult<serde_json::Value> {
        self.record()?;
        Ok(serde_json::json!({ "cpu": [] }))
    }
}
