use serde::Serialize;
use serde_json::Value;

use super::error::ToolError;

/// Kind of value a parameter expects, as advertised in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// A base64 data URL
    File,
    String,
}

impl ParameterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::File => "file",
            ParameterKind::String => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub description: &'static str,
}

impl ParameterSpec {
    pub const fn file(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParameterKind::File,
            description,
        }
    }

    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: ParameterKind::String,
            description,
        }
    }
}

/// Catalog entry for a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
}

/// A spreadsheet operation exposed through the tool catalog.
///
/// Execution is synchronous and CPU-bound; callers on an async runtime go
/// through [`ToolSystem::execute_blocking`](super::ToolSystem::execute_blocking).
pub trait Tool: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters(&self) -> &'static [ParameterSpec];
    fn execute(&self, arguments: &Value) -> Result<Value, ToolError>;
}
