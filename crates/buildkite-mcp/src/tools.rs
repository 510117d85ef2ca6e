//! MCP tool definitions.
//!
//! [`ToolBuilder`] assembles the JSON schema and annotations for one tool.

use serde_json::{json, Map, Value};

use crate::protocol::{ToolAnnotations, ToolDefinition};

/// Upper bound advertised for server-side `perPage`.
pub const MAX_SERVER_PER_PAGE: i64 = 100;

/// Upper bound advertised for `perPage` on `get_jobs`.
pub const MAX_JOBS_PER_PAGE: i64 = 50;

/// Builder for a [`ToolDefinition`].
pub struct ToolBuilder {
    name: String,
    description: String,
    title: Option<String>,
    read_only: Option<bool>,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolBuilder {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            title: None,
            read_only: None,
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    /// Title and read-only hint.
    pub fn annotate(mut self, title: &str, read_only: bool) -> Self {
        self.title = Some(title.to_string());
        self.read_only = Some(read_only);
        self
    }

    pub fn required_string(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "string", "description": description}), true)
    }

    pub fn string(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "string", "description": description}), false)
    }

    pub fn boolean(self, name: &str, description: &str) -> Self {
        self.property(name, json!({"type": "boolean", "description": description}), false)
    }

    /// Array of `{key, value}` string pairs.
    pub fn entries(self, name: &str, description: &str) -> Self {
        self.property(
            name,
            json!({
                "type": "array",
                "description": description,
                "items": {
                    "type": "object",
                    "properties": {
                        "key": {"type": "string"},
                        "value": {"type": "string"}
                    },
                    "required": ["key", "value"]
                }
            }),
            false,
        )
    }

    /// `page` and `perPage` with `perPage` capped at `max_per_page`.
    pub fn pagination(self, max_per_page: i64) -> Self {
        self.property(
            "page",
            json!({
                "type": "number",
                "description": "Page number for pagination (min 1)",
                "minimum": 1
            }),
            false,
        )
        .property(
            "perPage",
            json!({
                "type": "number",
                "description": format!("Results per page for pagination (min 1, max {})", max_per_page),
                "minimum": 1,
                "maximum": max_per_page
            }),
            false,
        )
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> ToolDefinition {
        let mut schema = json!({
            "type": "object",
            "properties": self.properties,
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }

        let annotations = self.title.map(|title| ToolAnnotations {
            title: Some(title),
            read_only_hint: self.read_only,
        });

        ToolDefinition {
            name: self.name,
            description: self.description,
            input_schema: schema,
            annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_schema() {
        let tool = ToolBuilder::new("get_jobs", "Get jobs")
            .required_string("org", "Org slug")
            .string("job_state", "Filter")
            .boolean("include_agent", "Agent details")
            .pagination(MAX_JOBS_PER_PAGE)
            .annotate("Get Jobs", true)
            .build();

        assert_eq!(tool.name, "get_jobs");
        let schema = &tool.input_schema;
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["org"]));
        assert_eq!(schema["properties"]["include_agent"]["type"], "boolean");
        assert_eq!(schema["properties"]["perPage"]["maximum"], 50);
        assert_eq!(schema["properties"]["page"]["minimum"], 1);

        let annotations = tool.annotations.unwrap();
        assert_eq!(annotations.title.as_deref(), Some("Get Jobs"));
        assert_eq!(annotations.read_only_hint, Some(true));
    }

    #[test]
    fn test_no_required_and_no_annotations() {
        let tool = ToolBuilder::new("current_user", "Who am I").build();
        assert!(tool.input_schema.get("required").is_none());
        assert!(tool.annotations.is_none());
        assert_eq!(tool.input_schema["properties"], json!({}));
    }

    #[test]
    fn test_entries_schema() {
        let tool = ToolBuilder::new("create_build", "Create")
            .entries("environment", "Env vars")
            .build();
        let env = &tool.input_schema["properties"]["environment"];
        assert_eq!(env["type"], "array");
        assert_eq!(env["items"]["required"], json!(["key", "value"]));
    }
}
