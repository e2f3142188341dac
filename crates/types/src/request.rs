//! Inbound resolution request and its strategy classification.

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::credential::Credential;
use crate::fields::{extract_text, first_node, keys};

/// Method used when the caller does not name one.
pub const DEFAULT_METHOD: &str = "POST";

/// Reasons an inbound body cannot be turned into a [`ResolutionRequest`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing request body")]
    EmptyBody,

    #[error("Request body is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("Request body must be a JSON object")]
    NotAnObject,
}

/// How a request intends to obtain its credential.
///
/// Classification happens once, in [`Strategy::classify`]; the first
/// applicable variant in declaration order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    ExplicitCredential(Credential),
    KnownTransfer { transfer_process_id: String },
    KnownContract { contract_id: String },
    KnownAsset { asset_id: String },
    Unresolvable,
}

impl Strategy {
    pub fn classify(document: &Value) -> Self {
        let endpoint = extract_text(document, keys::ENDPOINT);
        let authorization = extract_text(document, keys::AUTHORIZATION);
        if let (Some(endpoint), Some(authorization)) = (endpoint, authorization) {
            let auth_header = extract_text(document, keys::AUTH_HEADER);
            return Self::ExplicitCredential(Credential::new(endpoint, authorization, auth_header));
        }
        if let Some(transfer_process_id) = extract_text(document, keys::TRANSFER_PROCESS_ID) {
            return Self::KnownTransfer { transfer_process_id };
        }
        if let Some(contract_id) = extract_text(document, keys::CONTRACT_ID) {
            return Self::KnownContract { contract_id };
        }
        if let Some(asset_id) = extract_text(document, keys::ASSET_ID) {
            return Self::KnownAsset { asset_id };
        }
        Self::Unresolvable
    }

    /// Short label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExplicitCredential(_) => "explicit_credential",
            Self::KnownTransfer { .. } => "known_transfer",
            Self::KnownContract { .. } => "known_contract",
            Self::KnownAsset { .. } => "known_asset",
            Self::Unresolvable => "unresolvable",
        }
    }
}

/// Caller-supplied overrides for transfer initiation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOverrides {
    pub connector_id: Option<String>,
    pub counter_party_address: Option<String>,
    pub protocol: Option<String>,
    pub transfer_type: Option<String>,
}

/// A parsed `/infer` request. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    method: String,
    path: String,
    payload: Option<Value>,
    headers: IndexMap<String, String>,
    strategy: Strategy,
    overrides: TransferOverrides,
}

impl ResolutionRequest {
    /// Parses a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(RequestError::EmptyBody);
        }
        let document: Value =
            serde_json::from_slice(body).map_err(|error| RequestError::InvalidJson { reason: error.to_string() })?;
        Self::from_value(&document)
    }

    /// Builds a request from an already-parsed JSON document.
    pub fn from_value(document: &Value) -> Result<Self, RequestError> {
        match document {
            Value::Null => return Err(RequestError::EmptyBody),
            Value::Object(_) => {}
            _ => return Err(RequestError::NotAnObject),
        }

        let method = extract_text(document, keys::METHOD)
            .unwrap_or_else(|| DEFAULT_METHOD.to_string())
            .to_ascii_uppercase();
        let path = extract_text(document, keys::PATH).unwrap_or_default();
        let payload = first_node(document, keys::PAYLOAD).cloned();
        let headers = first_node(document, keys::HEADERS).map(header_map).unwrap_or_default();
        let overrides = TransferOverrides {
            connector_id: extract_text(document, keys::CONNECTOR_ID),
            counter_party_address: extract_text(document, keys::COUNTER_PARTY_ADDRESS),
            protocol: extract_text(document, keys::PROTOCOL),
            transfer_type: extract_text(document, keys::TRANSFER_TYPE),
        };

        Ok(Self {
            method,
            path,
            payload,
            headers,
            strategy: Strategy::classify(document),
            overrides,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn overrides(&self) -> &TransferOverrides {
        &self.overrides
    }

    /// Case-insensitive header presence check.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.keys().any(|key| key.eq_ignore_ascii_case(name))
    }
}

fn header_map(node: &Value) -> IndexMap<String, String> {
    let Some(map) = node.as_object() else {
        return IndexMap::new();
    };
    map.iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((name.clone(), text.clone())),
            other => Some((name.clone(), other.to_string())),
        })
        .collect()
}
