//! Gateway configuration: file, then flags and environment on top.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use infergate_api::{HttpTimeouts, validate_base_url};
use infergate_engine::settings::{DEFAULT_PROTOCOL, DEFAULT_TRANSFER_TYPE};
use infergate_engine::{AgreementPaging, EngineSettings, PollPolicy, TransferDefaults};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct GatewayConfig {
    /// Listener address, for example "127.0.0.1:29191".
    pub bind_address: String,
    /// Prefix for the `/infer` route.
    pub base_path: String,
    /// Management API root; the client appends the version segment.
    pub management_url: String,
    /// Optional key sent as `X-Api-Key` to the management API.
    pub management_api_key: Option<String>,
    pub connector_id: Option<String>,
    pub counter_party_address: Option<String>,
    pub protocol: String,
    pub transfer_type: String,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub poll: PollConfig,
    pub agreements: AgreementsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:29191".to_string(),
            base_path: "/api".to_string(),
            management_url: "http://localhost:29193/management".to_string(),
            management_api_key: None,
            connector_id: None,
            counter_party_address: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
            transfer_type: DEFAULT_TRANSFER_TYPE.to_string(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            poll: PollConfig::default(),
            agreements: AgreementsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PollConfig {
    pub attempts: u32,
    pub delay_ms: u64,
    /// Cap on a single EDR lookup, whatever the request timeout is.
    pub attempt_timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            attempts: policy.attempts,
            delay_ms: policy.delay.as_millis() as u64,
            attempt_timeout_ms: policy.attempt_timeout.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct AgreementsConfig {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for AgreementsConfig {
    fn default() -> Self {
        let paging = AgreementPaging::default();
        Self {
            page_size: paging.page_size,
            max_pages: paging.max_pages,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigOverrides {
    /// Listener address
    #[arg(long = "bind", env = "INFERGATE_BIND")]
    pub bind_address: Option<String>,
    /// Prefix for the /infer route
    #[arg(long, env = "INFERGATE_BASE_PATH")]
    pub base_path: Option<String>,
    /// Management API root URL
    #[arg(long, env = "INFERGATE_MANAGEMENT_URL")]
    pub management_url: Option<String>,
    /// Management API key
    #[arg(long, env = "INFERGATE_MANAGEMENT_API_KEY", hide_env_values = true)]
    pub management_api_key: Option<String>,
    /// Default connector id for transfers
    #[arg(long, env = "INFERGATE_CONNECTOR_ID")]
    pub connector_id: Option<String>,
    /// Default counter-party protocol address for transfers
    #[arg(long = "counterparty-address", env = "INFERGATE_COUNTERPARTY_ADDRESS")]
    pub counter_party_address: Option<String>,
    /// Default transfer protocol
    #[arg(long, env = "INFERGATE_PROTOCOL")]
    pub protocol: Option<String>,
    /// Default transfer type
    #[arg(long, env = "INFERGATE_TRANSFER_TYPE")]
    pub transfer_type: Option<String>,
    /// Outbound request timeout in milliseconds
    #[arg(long, env = "INFERGATE_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid bind address '{address}': {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("invalid management URL: {reason}")]
    InvalidManagementUrl { reason: String },

    #[error("basePath must not contain whitespace or a query: '{0}'")]
    InvalidBasePath(String),

    #[error("{field} must be at least 1")]
    NotPositive { field: &'static str },
}

impl GatewayConfig {
    /// Loads the file at `path`, or the defaults when no path is given.
    ///
    /// `.yaml`/`.yml` files are read as YAML, everything else as JSON.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        let is_yaml = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml"));
        let config = if is_yaml {
            serde_yaml::from_str(&content).with_context(|| format!("parse YAML config {}", path.display()))?
        } else {
            serde_json::from_str(&content).with_context(|| format!("parse JSON config {}", path.display()))?
        };
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(value) = value.as_ref().filter(|value| !value.trim().is_empty()) {
                *target = value.clone();
            }
        }
        fn set_optional(target: &mut Option<String>, value: &Option<String>) {
            if let Some(value) = value.as_ref().filter(|value| !value.trim().is_empty()) {
                *target = Some(value.clone());
            }
        }

        set(&mut self.bind_address, &overrides.bind_address);
        set(&mut self.base_path, &overrides.base_path);
        set(&mut self.management_url, &overrides.management_url);
        set_optional(&mut self.management_api_key, &overrides.management_api_key);
        set_optional(&mut self.connector_id, &overrides.connector_id);
        set_optional(&mut self.counter_party_address, &overrides.counter_party_address);
        set(&mut self.protocol, &overrides.protocol);
        set(&mut self.transfer_type, &overrides.transfer_type);
        if let Some(timeout) = overrides.request_timeout_ms {
            self.request_timeout_ms = timeout;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_address()?;
        validate_base_url(&self.management_url).map_err(|error| ConfigError::InvalidManagementUrl {
            reason: error.to_string(),
        })?;
        if self.base_path.chars().any(|ch| ch.is_whitespace() || ch == '?' || ch == '#') {
            return Err(ConfigError::InvalidBasePath(self.base_path.clone()));
        }
        if self.poll.attempts == 0 {
            return Err(ConfigError::NotPositive { field: "poll.attempts" });
        }
        if self.poll.attempt_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "poll.attemptTimeoutMs",
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "requestTimeoutMs",
            });
        }
        if self.agreements.page_size == 0 {
            return Err(ConfigError::NotPositive {
                field: "agreements.pageSize",
            });
        }
        if self.agreements.max_pages == 0 {
            return Err(ConfigError::NotPositive {
                field: "agreements.maxPages",
            });
        }
        Ok(())
    }

    pub fn socket_address(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|error: std::net::AddrParseError| ConfigError::InvalidBindAddress {
                address: self.bind_address.clone(),
                reason: error.to_string(),
            })
    }

    /// Full route of the infer endpoint, e.g. `/api/infer`.
    pub fn infer_route(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            "/infer".to_string()
        } else {
            format!("/{trimmed}/infer")
        }
    }

    pub fn http_timeouts(&self) -> HttpTimeouts {
        HttpTimeouts {
            request: Duration::from_millis(self.request_timeout_ms),
            connect: Duration::from_millis(self.connect_timeout_ms),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            transfer: TransferDefaults {
                connector_id: self.connector_id.clone(),
                counter_party_address: self.counter_party_address.clone(),
                protocol: self.protocol.clone(),
                transfer_type: self.transfer_type.clone(),
            },
            poll: PollPolicy {
                attempts: self.poll.attempts,
                delay: Duration::from_millis(self.poll.delay_ms),
                attempt_timeout: Duration::from_millis(self.poll.attempt_timeout_ms),
            },
            agreements: AgreementPaging {
                page_size: self.agreements.page_size,
                max_pages: self.agreements.max_pages,
            },
        }
    }
}
