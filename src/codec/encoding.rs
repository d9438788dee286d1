//! Wire encodings for batch payloads
//!
//! Two encodings are understood: newline-separated plain text and JSON
//! (`{"items": [...]}`). The encoding is chosen from a content type; anything
//! missing or unrecognised falls back to plain text.
//!
//! Plain text rules: the whole payload is trimmed, then split on `\n`. A
//! trailing `\r` is removed from each line and blank lines are dropped, so a
//! payload never yields an empty-string item.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";

/// Batch payload decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0}")]
    InvalidJson(String),
}

/// JSON request body for batch operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<String>,
}

/// Negotiated wire encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    PlainText,
    Json,
}

impl Encoding {
    /// Pick an encoding from a `Content-Type` value.
    ///
    /// Media type parameters (`; charset=...`) and case are ignored.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media_type = content_type
            .and_then(|value| value.split(';').next())
            .map(|value| value.trim().to_ascii_lowercase());

        match media_type.as_deref() {
            Some(APPLICATION_JSON) => Encoding::Json,
            _ => Encoding::PlainText,
        }
    }

    /// `Content-Type` to send with a response in this encoding
    pub fn content_type(&self) -> &'static str {
        match self {
            Encoding::PlainText => "text/plain; charset=utf-8",
            Encoding::Json => "application/json; charset=utf-8",
        }
    }

    /// Decode a batch payload into item identifiers, preserving order.
    pub fn decode_items(&self, body: &[u8]) -> Result<Vec<String>, CodecError> {
        if body.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            Encoding::Json => {
                let list: ItemList = serde_json::from_slice(body)
                    .map_err(|e| CodecError::InvalidJson(e.to_string()))?;
                Ok(list.items)
            }
            Encoding::PlainText => {
                let text = std::str::from_utf8(body).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(decode_plain_text(text))
            }
        }
    }

    /// Encode item identifiers as a batch payload.
    pub fn encode_items(&self, items: &[String]) -> String {
        match self {
            Encoding::Json => serde_json::json!({ "items": items }).to_string(),
            Encoding::PlainText => {
                let mut out = String::new();
                for item in items {
                    out.push_str(item);
                    out.push('\n');
                }
                out
            }
        }
    }
}

fn decode_plain_text(text: &str) -> Vec<String> {
    text.trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
