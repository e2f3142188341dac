//! Tunables for the resolution pipeline.

use std::time::Duration;

/// Default transfer protocol when neither the request nor the config names one.
pub const DEFAULT_PROTOCOL: &str = "dataspace-protocol-http";
/// Default transfer type when neither the request nor the config names one.
pub const DEFAULT_TRANSFER_TYPE: &str = "HttpData-PULL";

/// Transfer parameters applied when a request omits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDefaults {
    pub connector_id: Option<String>,
    pub counter_party_address: Option<String>,
    pub protocol: String,
    pub transfer_type: String,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            connector_id: None,
            counter_party_address: None,
            protocol: DEFAULT_PROTOCOL.to_string(),
            transfer_type: DEFAULT_TRANSFER_TYPE.to_string(),
        }
    }
}

/// Bounds for the EDR poll loop.
///
/// `attempt_timeout` caps a single EDR lookup independently of the client's
/// request timeout, so a hung collaborator cannot stretch the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(2),
        }
    }
}

/// Paging window for the agreement query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgreementPaging {
    pub page_size: usize,
    pub max_pages: usize,
}

impl Default for AgreementPaging {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineSettings {
    pub transfer: TransferDefaults,
    pub poll: PollPolicy,
    pub agreements: AgreementPaging,
}
