// MCP (Model Context Protocol) gateway core
// JSON-RPC dispatch and the unified tool catalog, independent of transport

pub mod catalog;
pub mod protocol;
pub mod server;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use catalog::{ToolCatalog, MAX_TOOL_PAGES};
pub use server::{DispatchError, McpServer};
