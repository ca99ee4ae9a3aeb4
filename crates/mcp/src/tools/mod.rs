// Tool descriptors served over MCP and the helpers that build their schemas

pub mod composio;
pub mod render;

pub use composio::{descriptor_from_raw, UNKNOWN_TOOL_NAME};
pub use render::{RenderTool, RenderToolError, RENDER_TOOL_PREFIX};

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: Vec<&str>) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

/// Object schema accepting no parameters.
pub fn empty_object_schema() -> serde_json::Value {
    json_schema_object(serde_json::json!({}), vec![])
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "description": description
    })
}

pub fn json_schema_boolean(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}

/// Attach a `default` to a property schema.
pub fn with_default(mut schema: serde_json::Value, default: serde_json::Value) -> serde_json::Value {
    if let Some(object) = schema.as_object_mut() {
        object.insert("default".to_string(), default);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_schema() {
        assert_eq!(
            empty_object_schema(),
            serde_json::json!({"type": "object", "properties": {}, "required": []})
        );
    }

    #[test]
    fn test_with_default() {
        let schema = with_default(json_schema_integer("Number of log lines"), serde_json::json!(100));
        assert_eq!(schema["type"], "integer");
        assert_eq!(schema["default"], 100);
    }
}
