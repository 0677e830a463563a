//! HTTP surface
//!
//! - `GET /healthz` liveness check
//! - `GET /mcp/info` server description and tool catalog
//! - `POST /mcp/run` tool execution

pub mod error;
pub mod handlers;

use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::error::JsonPayloadError;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer, ResponseError};
use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::tools::ToolSystem;
use error::ApiError;

/// Registers the routes. Callers supply `web::Data<ToolSystem>` and a
/// [`json_config`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(handlers::healthz))
        .service(
            web::scope("/mcp")
                .route("/info", web::get().to(handlers::info))
                .route("/run", web::post().to(handlers::run_tool)),
        );
}

/// JSON extractor settings: bodies above `limit` bytes are refused with 413,
/// any other payload problem with 400, both with an `error` body.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err: JsonPayloadError, _req| {
            let status = err.status_code();
            warn!(status = status.as_u16(), error = %err, "Rejected request body");
            ApiError::new(status, err.to_string()).into()
        })
}

/// Builds a server on an already bound listener.
pub fn build_server(
    listener: TcpListener,
    config: &ServerConfig,
    system: ToolSystem,
) -> std::io::Result<Server> {
    let system = web::Data::new(system);
    let limit = config.max_payload_bytes;

    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(system.clone())
            .app_data(json_config(limit))
            .configure(configure)
    })
    .workers(config.workers)
    .listen(listener)?
    .run())
}

/// Binds `config.bind_address()` and serves until shutdown.
pub async fn run(config: ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind {}", address))?;

    let system = ToolSystem::with_limits(config.limits());
    info!(
        address = %address,
        workers = config.workers,
        max_payload_bytes = config.max_payload_bytes,
        max_unpacked_bytes = config.max_unpacked_bytes,
        max_export_cells = config.max_export_cells,
        tools = system.tool_count(),
        "Starting MCP server"
    );

    build_server(listener, &config, system)
        .context("Failed to start HTTP server")?
        .await
        .context("HTTP server terminated with an error")?;

    info!("Server stopped");
    Ok(())
}
