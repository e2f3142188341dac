//! The single downstream call made with a resolved credential.

use std::time::Instant;

use infergate_types::{Credential, ResolutionRequest};
use infergate_util::http::join_url;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::InferError;

/// Content type reported when the downstream response names none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
const DEFAULT_ACCEPT: &str = "application/json";

/// Downstream response relayed to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Performs exactly one HTTP call against a credential's endpoint.
#[derive(Debug, Clone)]
pub struct ProxyExecutor {
    http: Client,
}

impl ProxyExecutor {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    pub async fn execute(&self, credential: &Credential, request: &ResolutionRequest) -> Result<ProxiedResponse, InferError> {
        let target = target_url(credential.endpoint(), request.path())?;
        let method = Method::from_bytes(request.method().as_bytes())
            .map_err(|_| InferError::malformed(format!("Invalid method '{}'", request.method())))?;
        let headers = build_headers(credential, request)?;

        let mut builder = self.http.request(method.clone(), target.clone()).headers(headers);
        if let Some(body) = request_body(request.payload()) {
            builder = builder.body(body);
        }

        let start = Instant::now();
        let response = builder.send().await.map_err(|error| {
            warn!(
                method = %method,
                url = %target,
                error = %error,
                timed_out = error.is_timeout(),
                duration_ms = start.elapsed().as_millis(),
                "downstream call failed"
            );
            InferError::upstream_message("downstream call", error.to_string())
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|error| InferError::upstream_message("downstream call", error.to_string()))?
            .to_vec();

        debug!(
            method = %method,
            url = %target,
            status,
            bytes = body.len(),
            local = credential.is_local(),
            duration_ms = start.elapsed().as_millis(),
            "downstream call completed"
        );
        Ok(ProxiedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Joins the credential endpoint and caller path; only absolute HTTP(S) URLs are usable.
pub fn target_url(endpoint: &str, path: &str) -> Result<Url, InferError> {
    if endpoint.trim().is_empty() {
        return Err(InferError::missing_endpoint("credential has no endpoint"));
    }
    let joined = join_url(endpoint, path);
    let url = Url::parse(&joined).map_err(|error| InferError::missing_endpoint(format!("'{joined}' is not a valid URL: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(InferError::missing_endpoint(format!(
            "'{joined}' is not an HTTP endpoint"
        )));
    }
    Ok(url)
}

/// Caller headers verbatim, then the credential header, then a default `Accept`.
///
/// Caller headers that are not valid HTTP are skipped.
fn build_headers(credential: &Credential, request: &ResolutionRequest) -> Result<HeaderMap, InferError> {
    let mut headers = HeaderMap::new();
    for (name, value) in request.headers() {
        match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header = %name, "skipping invalid caller header"),
        }
    }

    if let Some(authorization) = credential.authorization() {
        let name = HeaderName::try_from(credential.auth_header())
            .map_err(|_| InferError::malformed(format!("Invalid auth header name '{}'", credential.auth_header())))?;
        let mut value = HeaderValue::try_from(authorization)
            .map_err(|_| InferError::malformed(format!("Authorization for '{}' is not a valid header value", credential.auth_header())))?;
        value.set_sensitive(true);
        headers.insert(name, value);
    }

    if !request.has_header(ACCEPT.as_str()) {
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    }
    Ok(headers)
}

/// Absent payload sends no body; strings go raw; everything else as JSON.
fn request_body(payload: Option<&Value>) -> Option<String> {
    match payload? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
