//! Strategy dispatch from a parsed request to a credential.

use std::sync::Arc;

use infergate_api::ManagementApi;
use infergate_types::{Credential, ResolutionRequest, Strategy, TransferOverrides};
use tracing::debug;

use crate::InferError;
use crate::agreements::AgreementFinder;
use crate::negotiator::TransferNegotiator;
use crate::poller::CredentialPoller;
use crate::probe::LocalShortcutProbe;
use crate::settings::EngineSettings;

/// Drives the sub-flow selected by the request's [`Strategy`].
#[derive(Clone)]
pub struct CredentialResolver {
    probe: LocalShortcutProbe,
    finder: AgreementFinder,
    negotiator: TransferNegotiator,
    poller: CredentialPoller,
}

impl CredentialResolver {
    pub fn new(api: Arc<dyn ManagementApi>, settings: EngineSettings) -> Self {
        Self {
            probe: LocalShortcutProbe::new(Arc::clone(&api)),
            finder: AgreementFinder::new(Arc::clone(&api), settings.agreements),
            negotiator: TransferNegotiator::new(Arc::clone(&api), settings.transfer),
            poller: CredentialPoller::new(api, settings.poll),
        }
    }

    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Credential, InferError> {
        match request.strategy() {
            Strategy::ExplicitCredential(credential) => Ok(credential.clone()),
            Strategy::KnownTransfer { transfer_process_id } => self.poller.poll(transfer_process_id).await,
            Strategy::KnownContract { contract_id } => self.negotiate_and_poll(contract_id, request.overrides()).await,
            Strategy::KnownAsset { asset_id } => self.resolve_asset(asset_id, request.overrides()).await,
            Strategy::Unresolvable => Err(InferError::UnresolvableIdentifier),
        }
    }

    async fn resolve_asset(&self, asset_id: &str, overrides: &TransferOverrides) -> Result<Credential, InferError> {
        if let Some(endpoint) = self.probe.probe(asset_id).await? {
            debug!(asset_id = %asset_id, "using local shortcut");
            return Ok(Credential::local(endpoint));
        }

        let agreement = self
            .finder
            .find_best(asset_id)
            .await?
            .ok_or_else(|| InferError::no_agreement(asset_id))?;
        debug!(asset_id = %asset_id, agreement_id = %agreement.id, "agreement selected");
        self.negotiate_and_poll(&agreement.id, overrides).await
    }

    async fn negotiate_and_poll(&self, contract_id: &str, overrides: &TransferOverrides) -> Result<Credential, InferError> {
        let transfer_process_id = self.negotiator.negotiate(contract_id, overrides).await?;
        self.poller.poll(&transfer_process_id).await
    }
}
