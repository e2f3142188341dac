//! Alias-tolerant field lookup over JSON documents.
//!
//! Connector APIs carry the same logical field under a plain key (`assetId`),
//! a short-prefixed key (`edc:assetId`) or a fully namespaced key
//! (`https://w3id.org/edc/v0.0.1/ns/assetId`) depending on which endpoint
//! produced the document. Every lookup in this workspace goes through
//! [`extract_text`] or [`first_node`] with one of the ordered alias tables in
//! [`keys`], so callers never branch on document shape.

use serde_json::Value;

/// Vocabulary used by the management API for JSON-LD compaction.
pub const EDC_NAMESPACE: &str = "https://w3id.org/edc/v0.0.1/ns/";

/// Ordered candidate keys for each logical field.
///
/// Order matters: the first present, non-blank candidate wins.
pub mod keys {
    pub const METHOD: &[&str] = &["method"];
    pub const PATH: &[&str] = &["path"];
    pub const PAYLOAD: &[&str] = &["payload", "body", "input"];
    pub const HEADERS: &[&str] = &["headers"];

    pub const ENDPOINT: &[&str] = &["endpoint", "edrEndpoint"];
    pub const AUTHORIZATION: &[&str] = &["authorization", "edrToken", "authCode"];
    pub const AUTH_HEADER: &[&str] = &["authHeader", "authKey"];

    pub const TRANSFER_PROCESS_ID: &[&str] = &["transferProcessId", "transferId"];
    pub const CONTRACT_ID: &[&str] = &["contractId", "contractAgreementId", "agreementId"];
    pub const ASSET_ID: &[&str] = &["assetId", "id"];

    pub const CONNECTOR_ID: &[&str] = &["connectorId", "providerId"];
    pub const COUNTER_PARTY_ADDRESS: &[&str] = &["counterPartyAddress", "protocolAddress"];
    pub const PROTOCOL: &[&str] = &["protocol"];
    pub const TRANSFER_TYPE: &[&str] = &["transferType"];

    pub const EDR_ENDPOINT: &[&str] = &[
        "endpoint",
        "edc:endpoint",
        "https://w3id.org/edc/v0.0.1/ns/endpoint",
        "edc:endpointUrl",
        "endpointUrl",
    ];
    pub const EDR_AUTHORIZATION: &[&str] = &[
        "authorization",
        "edc:authorization",
        "https://w3id.org/edc/v0.0.1/ns/authorization",
        "authCode",
        "edc:authCode",
    ];
    pub const EDR_AUTH_HEADER: &[&str] = &["authHeader", "authKey", "edc:authKey"];

    pub const DATA_ADDRESS: &[&str] = &["dataAddress", "edc:dataAddress", "https://w3id.org/edc/v0.0.1/ns/dataAddress"];
    pub const DATA_ADDRESS_TYPE: &[&str] = &["type", "edc:type", "https://w3id.org/edc/v0.0.1/ns/type", "@type"];
    pub const DATA_ADDRESS_BASE_URL: &[&str] = &[
        "baseUrl",
        "edc:baseUrl",
        "https://w3id.org/edc/v0.0.1/ns/baseUrl",
        "endpoint",
        "endpointUrl",
    ];

    pub const AGREEMENT_ID: &[&str] = &["@id", "id", "agreementId", "contractAgreementId"];
    pub const AGREEMENT_ASSET_ID: &[&str] = &["assetId", "edc:assetId", "https://w3id.org/edc/v0.0.1/ns/assetId"];
    pub const AGREEMENT_ASSET: &[&str] = &["asset", "edc:asset"];
    pub const ASSET_REFERENCE_ID: &[&str] = &["@id", "id", "assetId"];
    pub const AGREEMENT_SIGNED_AT: &[&str] = &[
        "contractSigningDate",
        "createdAt",
        "timestamp",
        "edc:contractSigningDate",
        "edc:createdAt",
        "edc:timestamp",
        "https://w3id.org/edc/v0.0.1/ns/contractSigningDate",
    ];
    pub const AGREEMENT_COLLECTION: &[&str] = &["results", "items", "contractAgreements", "@graph"];

    pub const TRANSFER_RESPONSE_ID: &[&str] = &["@id", "id"];
}

/// Returns the first candidate key whose value is present and non-null.
///
/// Only the direct level of `document` is examined.
pub fn first_node<'a>(document: &'a Value, candidate_keys: &[&str]) -> Option<&'a Value> {
    let map = document.as_object()?;
    candidate_keys
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|value| !value.is_null())
}

/// Returns the first candidate whose value is present, non-null and non-blank,
/// coerced to text.
///
/// Strings are returned exactly as stored (no trimming). Numbers, booleans and
/// structured values use their canonical JSON text.
///
/// # Example
/// ```rust
/// use infergate_types::fields::{extract_text, keys};
/// use serde_json::json;
///
/// let document = json!({ "assetId": "  ", "id": "asset-7" });
/// assert_eq!(extract_text(&document, keys::ASSET_ID).as_deref(), Some("asset-7"));
/// ```
pub fn extract_text(document: &Value, candidate_keys: &[&str]) -> Option<String> {
    let map = document.as_object()?;
    candidate_keys
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(text_of)
}

/// Coerces a single JSON value to text, treating null and blank strings as absent.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Returns `value` when it is present and non-blank, otherwise `fallback`.
pub fn first_non_blank(value: Option<String>, fallback: Option<&str>) -> Option<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .or_else(|| fallback.filter(|text| !text.trim().is_empty()).map(str::to_string))
}
