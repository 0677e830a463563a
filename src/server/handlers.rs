//! MCP endpoints

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::error::ApiError;
use crate::tools::{ToolDefinition, ToolSystem};

pub const SERVER_NAME: &str = "MS Excel Tools";
pub const SERVER_DESCRIPTION: &str =
    "A set of tools to perform basic read and write operations on Microsoft Excel (.xlsx) files.";

/// Body of `GET /mcp/info`
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub tools: Vec<ToolDefinition>,
}

/// Body of `POST /mcp/run`
#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub tool_id: String,
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

fn empty_parameters() -> Value {
    Value::Object(Default::default())
}

pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn info(system: web::Data<ToolSystem>) -> impl Responder {
    let info = ServerInfo {
        name: SERVER_NAME,
        description: SERVER_DESCRIPTION,
        tools: system.as_tool_definitions(),
    };
    debug!(tools = info.tools.len(), "Serving tool catalog");
    HttpResponse::Ok().json(info)
}

pub async fn run_tool(
    system: web::Data<ToolSystem>,
    request: web::Json<RunRequest>,
) -> Result<HttpResponse, ApiError> {
    let RunRequest {
        tool_id,
        parameters,
    } = request.into_inner();

    let result = system.execute_blocking(tool_id, parameters).await?;
    Ok(HttpResponse::Ok().json(json!({ "result": result })))
}
