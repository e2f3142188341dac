use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::fields::{extract_text, first_node, keys};

/// When an agreement was signed, as far as the document tells us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningTime {
    EpochMillis(i64),
    Unknown,
}

impl SigningTime {
    /// Parses an integer epoch or an ISO-8601 instant. Anything else is `Unknown`.
    ///
    /// Instants may omit seconds (`2024-01-01T00:00Z`).
    pub fn parse(raw: &str) -> Self {
        if let Ok(epoch) = raw.parse::<i64>() {
            return Self::EpochMillis(epoch);
        }
        parse_instant_millis(raw.trim())
            .map(Self::EpochMillis)
            .unwrap_or(Self::Unknown)
    }

    /// Ordering key; unknown sorts below every parsed value.
    pub fn rank(&self) -> i64 {
        match self {
            Self::EpochMillis(epoch) => *epoch,
            Self::Unknown => i64::MIN,
        }
    }
}

/// A contract agreement as read from the management API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agreement {
    pub id: String,
    pub asset_id: Option<String>,
    pub signed_at: SigningTime,
}

impl Agreement {
    /// Reads an agreement document. Documents without any id alias yield `None`.
    pub fn from_document(document: &Value) -> Option<Self> {
        let id = extract_text(document, keys::AGREEMENT_ID)?;
        let signed_at = extract_text(document, keys::AGREEMENT_SIGNED_AT)
            .map(|raw| SigningTime::parse(&raw))
            .unwrap_or(SigningTime::Unknown);
        Some(Self {
            id,
            asset_id: asset_id_of(document),
            signed_at,
        })
    }

    pub fn covers(&self, asset_id: &str) -> bool {
        self.asset_id.as_deref() == Some(asset_id)
    }
}

fn parse_instant_millis(raw: &str) -> Option<i64> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.timestamp_millis());
    }
    if let Some(local) = raw.strip_suffix(['Z', 'z']) {
        return NaiveDateTime::parse_from_str(local, "%Y-%m-%dT%H:%M")
            .ok()
            .map(|instant| instant.and_utc().timestamp_millis());
    }
    DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z")
        .ok()
        .map(|instant| instant.timestamp_millis())
}

/// Flat asset id first, then the nested asset reference one level down.
fn asset_id_of(document: &Value) -> Option<String> {
    if let Some(asset_id) = extract_text(document, keys::AGREEMENT_ASSET_ID) {
        return Some(asset_id);
    }
    match first_node(document, keys::AGREEMENT_ASSET)? {
        Value::String(reference) if !reference.trim().is_empty() => Some(reference.clone()),
        reference @ Value::Object(_) => extract_text(reference, keys::ASSET_REFERENCE_ID),
        _ => None,
    }
}
