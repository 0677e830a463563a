pub mod error;
pub mod implementations;
pub mod registry;
pub mod system;
pub mod trait_def;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use system::ToolSystem;
pub use trait_def::{ParameterKind, ParameterSpec, Tool, ToolDefinition};
