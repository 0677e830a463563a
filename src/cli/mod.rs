pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, RunArgs, ServeArgs, ToolsArgs};
pub use output::{OutputFormat, OutputFormatter};
