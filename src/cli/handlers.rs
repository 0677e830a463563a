//! Subcommand handlers. Each returns the process exit code.

use anyhow::{anyhow, Context, Result};
use serde_json::{Map, Value};
use std::fs;
use tracing::{debug, error, info, warn};

use super::commands::{RunArgs, ServeArgs, ToolsArgs};
use super::output::OutputFormatter;
use crate::config::ServerConfig;
use crate::datauri::{self, XLSX_MIME};
use crate::server::{self, handlers::SERVER_DESCRIPTION, handlers::SERVER_NAME};
use crate::tools::ToolSystem;

/// Environment configuration with the flags given on the command line
/// applied on top.
pub fn server_config(args: &ServeArgs) -> ServerConfig {
    let mut config = ServerConfig::default();

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(limit) = args.max_payload_bytes {
        config.max_payload_bytes = limit;
    }

    config
}

pub async fn handle_serve(args: &ServeArgs) -> i32 {
    let config = server_config(args);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Error: {}", e);
        return 1;
    }
    debug!("{}", config);

    match server::run(config).await {
        Ok(()) => 0,
        Err(e) => {
            error!(error = %e, "Server failed");
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_tools(args: &ToolsArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());
    let tools = ToolSystem::new().as_tool_definitions();

    match formatter.format_catalog(SERVER_NAME, SERVER_DESCRIPTION, &tools) {
        Ok(output) => {
            println!("{}", output.trim_end());
            0
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub async fn handle_run(args: &RunArgs) -> i32 {
    match run_tool(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!(tool = %args.tool_id, error = %e, "Tool run failed");
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

/// Parameter object for a local run, mirroring a `/mcp/run` request.
pub fn run_parameters(args: &RunArgs, workbook: &[u8]) -> Value {
    let mut params = Map::new();
    params.insert(
        "file".to_string(),
        Value::String(datauri::encode(XLSX_MIME, workbook)),
    );

    let optional = [("range", &args.range), ("cell", &args.cell), ("value", &args.value)];
    for (name, value) in optional {
        if let Some(value) = value {
            params.insert(name.to_string(), Value::String(value.clone()));
        }
    }

    Value::Object(params)
}

async fn run_tool(args: &RunArgs) -> Result<()> {
    let workbook = fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let params = run_parameters(args, &workbook);

    let limits = ServerConfig::default().limits();
    let result = ToolSystem::with_limits(limits)
        .execute_blocking(args.tool_id.clone(), params)
        .await?;

    let file = result.get("file").and_then(Value::as_str);
    match (&args.output, file) {
        (Some(path), Some(data_url)) => {
            let bytes = datauri::decode(data_url)
                .map_err(|e| anyhow!("Tool returned an unreadable file: {}", e))?;
            fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "Wrote tool output");
        }
        (output, _) => {
            if output.is_some() {
                warn!(tool = %args.tool_id, "Tool produced no file; printing result instead");
            }
            let formatted = OutputFormatter::new(args.format.into()).format_result(&result)?;
            println!("{}", formatted);
        }
    }

    Ok(())
}
