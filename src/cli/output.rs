//! Output formatting for the `tools` and `run` commands

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::tools::ToolDefinition;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the tool catalog, as served by `/mcp/info`
    pub fn format_catalog(
        &self,
        name: &str,
        description: &str,
        tools: &[ToolDefinition],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let info = json!({
                    "name": name,
                    "description": description,
                    "tools": tools,
                });
                serde_json::to_string_pretty(&info).context("Failed to serialize tool catalog")
            }
            OutputFormat::Human => Ok(self.format_catalog_human(name, description, tools)),
        }
    }

    /// Formats a tool result. Results are JSON in both formats; the human
    /// format indents it.
    pub fn format_result(&self, result: &Value) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string(result).context("Failed to serialize tool result")
            }
            OutputFormat::Human => {
                serde_json::to_string_pretty(result).context("Failed to serialize tool result")
            }
        }
    }

    fn format_catalog_human(&self, name: &str, description: &str, tools: &[ToolDefinition]) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n", name));
        output.push_str(&"\u{2501}".repeat(42));
        output.push_str("\n\n");
        output.push_str(&format!("{}\n\n", description));

        for tool in tools {
            output.push_str(&format!("{} ({})\n", tool.id, tool.name));
            output.push_str(&format!("  {}\n", tool.description));
            for param in &tool.parameters {
                output.push_str(&format!(
                    "  - {} [{}]: {}\n",
                    param.name,
                    param.kind.as_str(),
                    param.description
                ));
            }
            output.push('\n');
        }

        output
    }
}
