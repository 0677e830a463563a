//! sheetbox - MCP tool server for Excel workbooks
//!
//! Exposes a fixed catalog of spreadsheet tools over HTTP. Clients send an
//! `.xlsx` workbook as a base64 data URL together with a tool id, and get
//! back a JSON value or a new file.
//!
//! # Core Concepts
//!
//! - **Workbook**: an xlsx package read into memory. Cells are read from the
//!   sheet XML and edits are spliced into it, leaving every other part as is.
//! - **Tool**: one spreadsheet operation (`sum_range`, `avg_range`,
//!   `get_cell`, `set_cell`, `to_csv`) taking a JSON parameter object.
//! - **Data URL**: `data:<mime>;base64,<payload>`, the way files travel in JSON.
//!
//! # Example Usage
//!
//! ```no_run
//! use serde_json::json;
//! use sheetbox::datauri::{self, XLSX_MIME};
//! use sheetbox::ToolSystem;
//!
//! # fn example(bytes: &[u8]) -> Result<(), sheetbox::ToolError> {
//! let system = ToolSystem::new();
//! let result = system.execute(
//!     "sum_range",
//!     &json!({
//!         "file": datauri::encode(XLSX_MIME, bytes),
//!         "range": "Sheet1!A1:A10",
//!     }),
//! )?;
//! println!("Total: {}", result["value"]);
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`workbook`]: xlsx reading and in-place cell edits
//! - [`tools`]: the tool trait, registry and implementations
//! - [`server`]: actix-web routes for `/healthz`, `/mcp/info` and `/mcp/run`
//! - [`cli`]: command line interface

pub mod cli;
pub mod config;
pub mod datauri;
pub mod server;
pub mod tools;
pub mod util;
pub mod workbook;

pub use config::{ConfigError, ServerConfig};
pub use tools::{Tool, ToolError, ToolRegistry, ToolSystem};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use workbook::{Workbook, WorkbookError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
