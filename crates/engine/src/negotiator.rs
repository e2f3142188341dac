//! Transfer process initiation.

use std::sync::Arc;

use infergate_api::{ManagementApi, TransferRequest};
use infergate_types::TransferOverrides;
use infergate_types::fields::{extract_text, first_non_blank, keys};
use tracing::{debug, warn};

use crate::InferError;
use crate::error::upstream_preview;
use crate::settings::TransferDefaults;

/// Starts a transfer process for an agreement and returns its id.
#[derive(Clone)]
pub struct TransferNegotiator {
    api: Arc<dyn ManagementApi>,
    defaults: TransferDefaults,
}

impl TransferNegotiator {
    pub fn new(api: Arc<dyn ManagementApi>, defaults: TransferDefaults) -> Self {
        Self { api, defaults }
    }

    /// Merges request overrides with the configured defaults.
    ///
    /// Fails without any network call when no counter-party address is known.
    pub fn transfer_request(&self, contract_id: &str, overrides: &TransferOverrides) -> Result<TransferRequest, InferError> {
        let counter_party_address = first_non_blank(
            overrides.counter_party_address.clone(),
            self.defaults.counter_party_address.as_deref(),
        )
        .ok_or_else(|| InferError::malformed("Missing counterPartyAddress and no default is configured"))?;

        Ok(TransferRequest {
            contract_id: contract_id.to_string(),
            connector_id: first_non_blank(overrides.connector_id.clone(), self.defaults.connector_id.as_deref()),
            counter_party_address,
            protocol: first_non_blank(overrides.protocol.clone(), Some(self.defaults.protocol.as_str()))
                .unwrap_or_else(|| self.defaults.protocol.clone()),
            transfer_type: first_non_blank(overrides.transfer_type.clone(), Some(self.defaults.transfer_type.as_str()))
                .unwrap_or_else(|| self.defaults.transfer_type.clone()),
        })
    }

    pub async fn negotiate(&self, contract_id: &str, overrides: &TransferOverrides) -> Result<String, InferError> {
        let request = self.transfer_request(contract_id, overrides)?;
        debug!(
            contract_id = %request.contract_id,
            counter_party_address = %request.counter_party_address,
            protocol = %request.protocol,
            transfer_type = %request.transfer_type,
            "initiating transfer process"
        );

        let document = self.api.initiate_transfer(&request).await.map_err(|error| {
            warn!(
                contract_id = %contract_id,
                error = %error,
                upstream_body = %upstream_preview(&error),
                "transfer initiation failed"
            );
            InferError::upstream("transfer initiation", &error)
        })?;

        let transfer_process_id = extract_text(&document, keys::TRANSFER_RESPONSE_ID).ok_or_else(|| {
            warn!(contract_id = %contract_id, "transfer initiation response carried no id");
            InferError::upstream_message("transfer initiation", "response did not contain a transfer process id")
        })?;
        debug!(contract_id = %contract_id, transfer_process_id = %transfer_process_id, "transfer process started");
        Ok(transfer_process_id)
    }
}
