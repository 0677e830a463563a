//! Server configuration
//!
//! Settings load from environment variables with defaults suited to running
//! inside a container. Command line flags override them afterwards.
//!
//! # Environment Variables
//!
//! - `SHEETBOX_HOST`: Interface to bind - default: "0.0.0.0"
//! - `SHEETBOX_PORT`: Port to listen on - default: "7777"
//! - `SHEETBOX_WORKERS`: HTTP worker threads - default: number of CPUs
//! - `SHEETBOX_MAX_PAYLOAD_BYTES`: Largest accepted request body - default: "33554432" (32MB)
//! - `SHEETBOX_MAX_UNPACKED_BYTES`: Total size a workbook's parts may inflate to,
//!   also the largest CSV export - default: "134217728" (128MB)
//! - `SHEETBOX_MAX_EXPORT_CELLS`: Cells a CSV export may emit - default: "4000000"
//! - `SHEETBOX_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use sheetbox::ServerConfig;
//!
//! let mut config = ServerConfig::default();
//! config.port = 8080;
//! config.validate().expect("Invalid configuration");
//! println!("{}", config.bind_address());
//! ```

use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::workbook::Limits;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 7777;
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 32 * 1024 * 1024;
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_WORKERS: usize = 1024;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Settings for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface address to bind
    pub host: String,

    pub port: u16,

    /// Number of actix worker threads
    pub workers: usize,

    /// Largest JSON body accepted by `/mcp/run`, in bytes
    pub max_payload_bytes: usize,

    /// Total bytes a workbook's parts may inflate to
    pub max_unpacked_bytes: u64,

    /// Cells a CSV export may emit
    pub max_export_cells: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for ServerConfig {
    /// Loads `SHEETBOX_*` variables, falling back to defaults for missing or
    /// unparsable values
    fn default() -> Self {
        let host = env::var("SHEETBOX_HOST")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let log_level = env::var("SHEETBOX_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let limits = Limits::default();

        Self {
            host,
            port: env_or("SHEETBOX_PORT", DEFAULT_PORT),
            workers: env_or("SHEETBOX_WORKERS", default_workers()),
            max_payload_bytes: env_or("SHEETBOX_MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES),
            max_unpacked_bytes: env_or("SHEETBOX_MAX_UNPACKED_BYTES", limits.max_unpacked_bytes),
            max_export_cells: env_or("SHEETBOX_MAX_EXPORT_CELLS", limits.max_export_cells),
            log_level,
        }
    }
}

impl ServerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an empty host, port 0, a worker count
    /// outside 1..=1024, a zero size limit or an unknown log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Host must not be empty".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::ValidationFailed(
                "Port must be between 1 and 65535".to_string(),
            ));
        }

        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::ValidationFailed(format!(
                "Workers must be between 1 and {}",
                MAX_WORKERS
            )));
        }

        if self.max_payload_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max payload size must be at least 1 byte".to_string(),
            ));
        }

        if self.max_unpacked_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max unpacked size must be at least 1 byte".to_string(),
            ));
        }

        if self.max_export_cells == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max export cells must be at least 1".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Workbook bounds applied to every tool call
    pub fn limits(&self) -> Limits {
        Limits {
            max_unpacked_bytes: self.max_unpacked_bytes,
            max_export_cells: self.max_export_cells,
        }
    }

    /// `host:port`, with IPv6 hosts in brackets
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sheetbox Configuration:")?;
        writeln!(f, "  Bind Address: {}", self.bind_address())?;
        writeln!(f, "  Workers: {}", self.workers)?;
        writeln!(f, "  Max Payload Size: {} bytes", self.max_payload_bytes)?;
        writeln!(f, "  Max Unpacked Size: {} bytes", self.max_unpacked_bytes)?;
        writeln!(f, "  Max Export Cells: {}", self.max_export_cells)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
