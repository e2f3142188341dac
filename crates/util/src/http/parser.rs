//! JSON response parsing with diagnostics suitable for logs.

use serde_json::Value;
use thiserror::Error;

use crate::redact_sensitive;

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// Empty bodies parse to `Value::Null` so that "no content" responses can be
/// told apart from malformed ones.
///
/// # Errors
/// Returns a [`JsonParseError`] carrying the HTTP status and a truncated,
/// redacted preview of the body.
pub fn parse_response_json_strict(text: &str, status: Option<u16>) -> Result<Value, JsonParseError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        JsonParseError::new(status_note, error, body_preview(text, 200))
    })
}

/// Collapses whitespace, redacts secrets and truncates an upstream body for logging.
pub fn body_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    redact_sensitive(preview.trim())
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
