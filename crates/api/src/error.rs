//! Error types for management API calls.

use infergate_util::http::JsonParseError;
use thiserror::Error;

/// Failure of a single management API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, TLS, ...).
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16, body: String },

    /// The server answered with a success status but the body was not JSON.
    #[error("{url} returned an unreadable body: {source}")]
    Decode {
        url: String,
        #[source]
        source: JsonParseError,
    },
}

impl ApiError {
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport { url: url.into(), source }
    }

    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    pub fn decode(url: impl Into<String>, source: JsonParseError) -> Self {
        Self::Decode { url: url.into(), source }
    }

    /// HTTP status of the upstream response, when one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Upstream response body, when one was received.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body.as_str()),
            Self::Decode { source, .. } => Some(source.body_preview()),
            Self::Transport { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}
