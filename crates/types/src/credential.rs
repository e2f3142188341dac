use std::fmt;

use serde_json::Value;

use crate::fields::{extract_text, first_non_blank, keys};

/// Header used to carry the authorization value when none is named.
pub const DEFAULT_AUTH_HEADER: &str = "Authorization";

/// Endpoint Data Reference: where to send the proxied call and how to authorize it.
///
/// A credential is built once per resolution and dropped after the single
/// downstream call; it is never cached.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    endpoint: String,
    authorization: Option<String>,
    auth_header: String,
}

impl Credential {
    /// Builds an authorized credential. A blank `auth_header` falls back to
    /// [`DEFAULT_AUTH_HEADER`].
    pub fn new(endpoint: impl Into<String>, authorization: impl Into<String>, auth_header: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            authorization: Some(authorization.into()),
            auth_header: first_non_blank(auth_header, Some(DEFAULT_AUTH_HEADER)).unwrap_or_else(|| DEFAULT_AUTH_HEADER.to_string()),
        }
    }

    /// Builds a credential for a locally owned address that needs no authorization.
    pub fn local(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            authorization: None,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
        }
    }

    /// Reads an EDR data-address document.
    ///
    /// Returns `None` unless both the endpoint and the authorization are
    /// present, so a half-populated credential can never be produced.
    pub fn from_edr_document(document: &Value) -> Option<Self> {
        let endpoint = extract_text(document, keys::EDR_ENDPOINT)?;
        let authorization = extract_text(document, keys::EDR_AUTHORIZATION)?;
        let auth_header = extract_text(document, keys::EDR_AUTH_HEADER);
        Some(Self::new(endpoint, authorization, auth_header))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    /// True when the credential came from the local shortcut.
    pub fn is_local(&self) -> bool {
        self.authorization.is_none()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("endpoint", &self.endpoint)
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("auth_header", &self.auth_header)
            .finish()
    }
}
