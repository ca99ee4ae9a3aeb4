// Conversion of Composio tool objects into MCP tool descriptors

use crate::protocol::ToolSchema;
use crate::tools::empty_object_schema;
use composio_gateway_clients::RawTool;

/// Name given to provider tools that carry neither a slug nor a name.
pub const UNKNOWN_TOOL_NAME: &str = "unknown";

/// Normalize a provider tool: name from slug, then name, then `"unknown"`;
/// missing description becomes empty; missing schema becomes an empty object.
pub fn descriptor_from_raw(raw: &RawTool) -> ToolSchema {
    let name = raw
        .slug
        .as_deref()
        .or(raw.name.as_deref())
        .unwrap_or(UNKNOWN_TOOL_NAME);

    ToolSchema {
        name: name.to_string(),
        description: raw.description.clone().unwrap_or_default(),
        input_schema: raw
            .parameter_schema()
            .cloned()
            .unwrap_or_else(empty_object_schema),
    }
}

impl From<&RawTool> for ToolSchema {
    fn from(raw: &RawTool) -> Self {
        descriptor_from_raw(raw)
    }
}
