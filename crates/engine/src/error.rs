//! Resolution failures and their mapping onto the inbound HTTP surface.

use infergate_api::ApiError;
use infergate_types::RequestError;
use infergate_util::http::body_preview;
use serde_json::{Value, json};
use thiserror::Error;

/// Every way a single `/infer` request can fail.
#[derive(Debug, Error)]
pub enum InferError {
    #[error("{message}")]
    MalformedRequest { message: String },

    #[error("Missing assetId, contractId, transferProcessId or an explicit endpoint and authorization")]
    UnresolvableIdentifier,

    #[error("No contract agreement found for asset '{asset_id}'")]
    NoAgreementFound { asset_id: String },

    #[error("{operation} failed: {message}")]
    UpstreamCallFailed {
        operation: String,
        message: String,
        upstream_status: Option<u16>,
    },

    #[error("Timed out waiting for the EDR of transfer process '{transfer_process_id}' after {attempts} attempts")]
    NegotiationTimeout { transfer_process_id: String, attempts: u32 },

    #[error("Resolved endpoint is not usable: {reason}")]
    MissingEndpointCapability { reason: String },
}

impl InferError {
    /// Create a malformed request error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedRequest { message: message.into() }
    }

    /// Create a no agreement error.
    pub fn no_agreement(asset_id: impl Into<String>) -> Self {
        Self::NoAgreementFound { asset_id: asset_id.into() }
    }

    /// Create an upstream failure from a management API error.
    pub fn upstream(operation: impl Into<String>, error: &ApiError) -> Self {
        Self::UpstreamCallFailed {
            operation: operation.into(),
            message: error.to_string(),
            upstream_status: error.upstream_status(),
        }
    }

    /// Create an upstream failure that has no underlying API error.
    pub fn upstream_message(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamCallFailed {
            operation: operation.into(),
            message: message.into(),
            upstream_status: None,
        }
    }

    /// Create a negotiation timeout error.
    pub fn timeout(transfer_process_id: impl Into<String>, attempts: u32) -> Self {
        Self::NegotiationTimeout {
            transfer_process_id: transfer_process_id.into(),
            attempts,
        }
    }

    /// Create a missing endpoint error.
    pub fn missing_endpoint(reason: impl Into<String>) -> Self {
        Self::MissingEndpointCapability { reason: reason.into() }
    }

    /// HTTP status returned to the caller.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::UpstreamCallFailed { .. } => 502,
            Self::NegotiationTimeout { .. } => 504,
            Self::MalformedRequest { .. }
            | Self::UnresolvableIdentifier
            | Self::NoAgreementFound { .. }
            | Self::MissingEndpointCapability { .. } => 400,
        }
    }

    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "MALFORMED_REQUEST",
            Self::UnresolvableIdentifier => "UNRESOLVABLE_IDENTIFIER",
            Self::NoAgreementFound { .. } => "NO_AGREEMENT_FOUND",
            Self::UpstreamCallFailed { .. } => "UPSTREAM_CALL_FAILED",
            Self::NegotiationTimeout { .. } => "NEGOTIATION_TIMEOUT",
            Self::MissingEndpointCapability { .. } => "MISSING_ENDPOINT_CAPABILITY",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } | Self::UnresolvableIdentifier | Self::MissingEndpointCapability { .. } => "validation",
            Self::NoAgreementFound { .. } => "not_found",
            Self::UpstreamCallFailed { .. } => "upstream",
            Self::NegotiationTimeout { .. } => "timeout",
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(self, Self::UpstreamCallFailed { .. } | Self::NegotiationTimeout { .. })
    }

    /// Structured JSON error body sent to the caller.
    pub fn to_payload(&self) -> Value {
        json!({
            "error": self.to_string(),
            "error_code": self.error_code(),
            "category": self.category(),
            "retryable": self.retryable(),
        })
    }
}

impl From<RequestError> for InferError {
    fn from(error: RequestError) -> Self {
        Self::malformed(error.to_string())
    }
}

/// Redacted, truncated upstream body for log fields.
pub(crate) fn upstream_preview(error: &ApiError) -> String {
    error
        .upstream_body()
        .map(|body| body_preview(body, 500))
        .unwrap_or_default()
}
