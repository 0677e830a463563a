use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Level};

use super::error::ToolError;
use super::registry::ToolRegistry;
use super::trait_def::ToolDefinition;
use crate::workbook::Limits;

/// Looks up and runs tools. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct ToolSystem {
    registry: Arc<ToolRegistry>,
}

impl ToolSystem {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self {
            registry: Arc::new(ToolRegistry::with_limits(limits)),
        }
    }

    /// Execute a tool on the current thread and return its JSON result
    pub fn execute(&self, tool_id: &str, arguments: &Value) -> Result<Value, ToolError> {
        // Arguments carry whole files; only their names are logged.
        let params: Vec<&str> = arguments
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default();
        info!(tool = tool_id, params = ?params, "Executing tool");

        let Some(tool) = self.registry.get_tool(tool_id) else {
            warn!(tool = tool_id, "Unknown tool requested");
            return Err(ToolError::UnknownTool(tool_id.to_string()));
        };

        let started = Instant::now();
        let result = tool.execute(arguments);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => {
                info!(tool = tool_id, elapsed_ms, "Tool execution completed");
                if tracing::enabled!(Level::DEBUG) {
                    let preview = output_preview(output);
                    debug!(tool = tool_id, output_preview = %preview, "Tool output preview");
                }
            }
            Err(e) => {
                warn!(tool = tool_id, elapsed_ms, error = %e, "Tool execution failed");
            }
        }

        result
    }

    /// Execute a tool on the blocking thread pool.
    ///
    /// Decompressing and parsing a workbook is CPU-bound, so async callers
    /// must not run it on a reactor thread.
    pub async fn execute_blocking(&self, tool_id: String, arguments: Value) -> Result<Value, ToolError> {
        let system = self.clone();
        tokio::task::spawn_blocking(move || system.execute(&tool_id, &arguments))
            .await
            .map_err(|e| ToolError::Internal(format!("Tool task failed: {}", e)))?
    }

    pub fn as_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.as_tool_definitions()
    }

    pub fn tool_ids(&self) -> Vec<&str> {
        self.registry.tool_ids()
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }
}

/// First 200 characters of the serialized output.
fn output_preview(output: &Value) -> String {
    let text = serde_json::to_string(output).unwrap_or_default();
    match text.char_indices().nth(200) {
        Some((end, _)) => text[..end].to_string(),
        None => text,
    }
}

impl Default for ToolSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datauri::{self, XLSX_MIME};
    use crate::workbook::testing::xlsx;
    use serde_json::json;

    fn book() -> String {
        datauri::encode(
            XLSX_MIME,
            &xlsx(
                &[("Sheet1", r#"<row r="1"><c r="A1"><v>3</v></c><c r="B1"><v>4</v></c></row>"#)],
                &[],
            ),
        )
    }

    #[test]
    fn test_tool_system_creation() {
        let system = ToolSystem::new();

        assert_eq!(system.tool_count(), 5);
        assert_eq!(system.tool_ids()[0], "sum_range");
    }

    #[test]
    fn test_execute_sum_range() {
        let system = ToolSystem::new();

        let result = system
            .execute("sum_range", &json!({"file": book(), "range": "Sheet1!A1:B1"}))
            .unwrap();

        assert_eq!(result, json!({"value": 7}));
    }

    #[test]
    fn test_unknown_tool() {
        let system = ToolSystem::new();

        let result = system.execute("nonexistent", &json!({}));

        let err = result.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_non_object_arguments() {
        let system = ToolSystem::new();

        let err = system.execute("get_cell", &Value::Null).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter(ref p) if p == "file"));
    }

    #[tokio::test]
    async fn test_execute_blocking() {
        let system = ToolSystem::new();

        let result = system
            .execute_blocking(
                "get_cell".to_string(),
                json!({"file": book(), "cell": "Sheet1!B1"}),
            )
            .await
            .unwrap();

        assert_eq!(result, json!({"value": 4}));
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let system = ToolSystem::new();
        let clone = system.clone();

        assert!(Arc::ptr_eq(&system.registry, &clone.registry));
        let err = clone
            .execute_blocking("missing".to_string(), json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Tool with id 'missing' not found.");
    }

    #[test]
    fn test_output_preview_is_truncated() {
        let long = json!({"file": "x".repeat(500)});
        let preview = output_preview(&long);
        assert_eq!(preview.chars().count(), 200);
        assert!(preview.starts_with("{\"file\":\"xxx"));

        assert_eq!(output_preview(&json!({"value": 7})), "{\"value\":7}");
    }

    #[test]
    fn test_with_limits_bounds_every_call() {
        let system = ToolSystem::with_limits(Limits {
            max_unpacked_bytes: 64,
            ..Limits::default()
        });

        let err = system
            .execute("sum_range", &json!({"file": book(), "range": "Sheet1!A1:B1"}))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().starts_with("Workbook too large"));
    }

    #[test]
    fn test_as_tool_definitions() {
        let system = ToolSystem::new();

        let definitions = system.as_tool_definitions();
        assert_eq!(definitions.len(), 5);

        for def in definitions {
            assert!(!def.id.is_empty());
            assert!(!def.description.is_empty());
        }
    }
}
