//! Bounded polling for the EDR issued to a transfer process.

use std::sync::Arc;

use infergate_api::ManagementApi;
use infergate_types::Credential;
use tracing::{debug, warn};

use crate::InferError;
use crate::settings::PollPolicy;

/// Polls the EDR data address of a transfer process until it is complete.
#[derive(Clone)]
pub struct CredentialPoller {
    api: Arc<dyn ManagementApi>,
    policy: PollPolicy,
}

impl CredentialPoller {
    pub fn new(api: Arc<dyn ManagementApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Returns the first complete credential, or a timeout once every attempt
    /// came back not ready.
    ///
    /// A failed call, a call exceeding `attempt_timeout`, a non-success status
    /// and a document missing endpoint or authorization all count as "not
    /// ready". The delay is awaited between attempts only.
    pub async fn poll(&self, transfer_process_id: &str) -> Result<Credential, InferError> {
        let attempts = self.policy.attempts;
        for attempt in 1..=attempts {
            let lookup = self.api.get_edr_data_address(transfer_process_id);
            match tokio::time::timeout(self.policy.attempt_timeout, lookup).await {
                Err(_) => {
                    debug!(
                        transfer_process_id = %transfer_process_id,
                        attempt,
                        timeout_ms = self.policy.attempt_timeout.as_millis(),
                        "EDR lookup timed out"
                    );
                }
                Ok(Ok(document)) => {
                    if let Some(credential) = Credential::from_edr_document(&document) {
                        debug!(transfer_process_id = %transfer_process_id, attempt, "EDR available");
                        return Ok(credential);
                    }
                    debug!(transfer_process_id = %transfer_process_id, attempt, "EDR incomplete");
                }
                Ok(Err(error)) => {
                    debug!(
                        transfer_process_id = %transfer_process_id,
                        attempt,
                        timed_out = error.is_timeout(),
                        error = %error,
                        "EDR not ready"
                    );
                }
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.delay).await;
            }
        }

        warn!(transfer_process_id = %transfer_process_id, attempts, "EDR polling exhausted");
        Err(InferError::timeout(transfer_process_id, attempts))
    }
}
