//! Tool registry
//!
//! Holds the spreadsheet tools in catalog order and describes them to clients.

use std::sync::Arc;

use super::implementations::*;
use super::trait_def::{Tool, ToolDefinition};
use crate::workbook::Limits;

/// Registry of all available tools
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a registry with every spreadsheet tool, in catalog order
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    /// Every tool, each bounded by `limits`
    pub fn with_limits(limits: Limits) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(SumRangeTool::new(limits)),
            Arc::new(AvgRangeTool::new(limits)),
            Arc::new(GetCellTool::new(limits)),
            Arc::new(SetCellTool::new(limits)),
            Arc::new(ToCsvTool::new(limits)),
        ];

        Self { tools }
    }

    /// Catalog entries for `/mcp/info`
    pub fn as_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                id: tool.id().to_string(),
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters().to_vec(),
            })
            .collect()
    }

    /// Get a tool by id
    pub fn get_tool(&self, id: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.id() == id).cloned()
    }

    /// Get all registered tool ids
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
