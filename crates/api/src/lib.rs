//! Connector management API client.
//!
//! This crate provides a lightweight client for the connector's management
//! API. It focuses on:
//!
//! - Constructing the single outbound HTTP client shared by the whole process
//! - Validating the configured management URL
//! - Building requests against the versioned management root
//! - Turning responses into JSON documents or a typed [`ApiError`]
//!
//! The primary entry points are [`build_http_client`] and [`ManagementClient`];
//! the calls the resolver needs live behind the [`ManagementApi`] trait.

mod error;
mod management;

use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use infergate_util::http::{body_preview, parse_response_json_strict};
use reqwest::{Client, Method, RequestBuilder, Url, header};
use serde_json::Value;
use tracing::{debug, warn};

pub use error::ApiError;
pub use management::{AgreementQuery, ManagementApi, TransferRequest};

/// Version segment appended to the configured management URL.
pub const MANAGEMENT_API_VERSION: &str = "/v3";
/// Header carrying the optional management API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";
const USER_AGENT: &str = concat!("infergate/", env!("CARGO_PKG_VERSION"));

/// Timeouts applied to every outbound call made through the shared client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

/// Builds the process-wide outbound client.
///
/// The client carries no default headers and no per-call state, so it can be
/// cloned freely and shared between the management client and the proxy.
pub fn build_http_client(timeouts: HttpTimeouts) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeouts.request)
        .connect_timeout(timeouts.connect)
        .build()
        .context("build http client")
}

/// Thin wrapper around the shared `reqwest::Client` for management API access.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    base_url: String,
    http: Client,
    api_key: Option<String>,
}

impl ManagementClient {
    /// Creates a client rooted at `{management_url}/v3`.
    ///
    /// The URL must use `http` or `https` and include a host.
    pub fn new(management_url: &str, http: Client, api_key: Option<String>) -> Result<Self> {
        validate_base_url(management_url)?;
        let trimmed = management_url.trim_end_matches('/');
        Ok(Self {
            base_url: format!("{trimmed}{MANAGEMENT_API_VERSION}"),
            http,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for a method and API-relative path.
    ///
    /// The request asks for JSON and carries the API key when one is configured.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "building management request");

        let builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        match &self.api_key {
            Some(api_key) => builder.header(API_KEY_HEADER, api_key),
            None => builder,
        }
    }

    /// Execute a management call and parse the response document.
    ///
    /// Returns `Value::Null` for an empty success body.
    pub(crate) async fn send_json(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let start = Instant::now();
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|error| {
            let error = ApiError::transport(url.clone(), error);
            warn!(
                method = %method,
                url = %url,
                error = %error,
                timed_out = error.is_timeout(),
                duration_ms = start.elapsed().as_millis(),
                "management request failed"
            );
            error
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| ApiError::transport(url.clone(), error))?;

        if !status.is_success() {
            debug!(
                method = %method,
                url = %url,
                status = %status,
                body = %body_preview(&text, 200),
                duration_ms = start.elapsed().as_millis(),
                "management request returned non-success status"
            );
            return Err(ApiError::status(url, status.as_u16(), text));
        }

        let parsed =
            parse_response_json_strict(&text, Some(status.as_u16())).map_err(|error| ApiError::decode(url.clone(), error))?;
        debug!(
            method = %method,
            url = %url,
            status = %status,
            duration_ms = start.elapsed().as_millis(),
            "management request completed"
        );
        Ok(parsed)
    }
}

/// Validate that a management URL is acceptable for use by the client.
///
/// Rules:
/// - it must parse as an absolute URL
/// - the scheme must be `http` or `https`
/// - it must include a host
pub fn validate_base_url(base: &str) -> Result<()> {
    let parsed = Url::parse(base).map_err(|e| anyhow!("Invalid management URL '{}': {}", base, e))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "management URL must use http or https; got '{}://'",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(anyhow!("management URL must include a host"));
    }
    Ok(())
}
