//! Data URLs carrying files inside JSON payloads.
//!
//! Files travel as `data:<mime>;base64,<payload>`. Only the payload matters
//! when decoding; the header is accepted as-is.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use thiserror::Error;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Error)]
pub enum DataUriError {
    #[error("expected a data URL with a ',' before the payload")]
    MissingSeparator,

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

/// Decodes the base64 payload following the first `,`.
///
/// ASCII whitespace inside the payload is ignored, so wrapped base64 from
/// MIME encoders decodes as well.
pub fn decode(data_url: &str) -> Result<Vec<u8>, DataUriError> {
    let (_, payload) = data_url
        .split_once(',')
        .ok_or(DataUriError::MissingSeparator)?;

    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();

    Ok(BASE64_STANDARD.decode(compact)?)
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(bytes))
}
