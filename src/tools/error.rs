use thiserror::Error;

use crate::datauri::DataUriError;
use crate::workbook::WorkbookError;

/// Why a tool call failed. Messages are returned to the client as-is.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool with id '{0}' not found.")]
    UnknownTool(String),

    #[error("Missing or invalid parameter: '{0}'")]
    MissingParameter(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid base64 file format: {0}")]
    InvalidFile(#[from] DataUriError),

    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    pub fn invalid(name: &str, reason: impl Into<String>) -> Self {
        ToolError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status for this failure. Problems with the request content are
    /// client errors; only a failure to produce output is a server error.
    pub fn status_code(&self) -> u16 {
        match self {
            ToolError::UnknownTool(_) => 404,
            ToolError::MissingParameter(_)
            | ToolError::InvalidParameter { .. }
            | ToolError::InvalidFile(_) => 400,
            ToolError::Workbook(WorkbookError::Write(_)) | ToolError::Internal(_) => 500,
            ToolError::Workbook(_) => 400,
        }
    }
}
