//! # Infergate Engine
//!
//! Turns an `/infer` request body into exactly one proxied downstream call.
//!
//! ## Pipeline
//!
//! 1. [`ResolutionRequest`] parsing classifies the request into a [`Strategy`]
//! 2. [`CredentialResolver`] runs the matching sub-flow:
//!    - explicit credential: used as-is, no collaborator call
//!    - known transfer: [`CredentialPoller`]
//!    - known contract: [`TransferNegotiator`], then [`CredentialPoller`]
//!    - known asset: [`LocalShortcutProbe`], else [`AgreementFinder`] and the
//!      contract flow
//! 3. [`ProxyExecutor`] performs the downstream call and relays the response
//!
//! Nothing is cached between requests; every request resolves its own
//! credential.
//!
//! [`ResolutionRequest`]: infergate_types::ResolutionRequest
//! [`Strategy`]: infergate_types::Strategy

use std::sync::Arc;
use std::time::Instant;

use infergate_api::ManagementApi;
use infergate_types::ResolutionRequest;
use reqwest::Client;
use tracing::{info, warn};

pub mod agreements;
pub mod error;
pub mod negotiator;
pub mod poller;
pub mod probe;
pub mod proxy;
pub mod resolver;
pub mod settings;

#[cfg(test)]
mod test_support;

pub use agreements::{AgreementFinder, select_best};
pub use error::InferError;
pub use negotiator::TransferNegotiator;
pub use poller::CredentialPoller;
pub use probe::{LocalShortcutProbe, local_http_address};
pub use proxy::{DEFAULT_CONTENT_TYPE, ProxiedResponse, ProxyExecutor};
pub use resolver::CredentialResolver;
pub use settings::{AgreementPaging, EngineSettings, PollPolicy, TransferDefaults};

/// Resolver and proxy sharing one management API and one outbound client.
#[derive(Clone)]
pub struct InferenceService {
    resolver: CredentialResolver,
    proxy: ProxyExecutor,
}

impl InferenceService {
    pub fn new(api: Arc<dyn ManagementApi>, http: Client, settings: EngineSettings) -> Self {
        Self {
            resolver: CredentialResolver::new(api, settings),
            proxy: ProxyExecutor::new(http),
        }
    }

    /// Handles a raw `/infer` body end to end.
    pub async fn handle(&self, body: &[u8]) -> Result<ProxiedResponse, InferError> {
        let request = ResolutionRequest::from_slice(body)?;
        self.execute(&request).await
    }

    pub async fn execute(&self, request: &ResolutionRequest) -> Result<ProxiedResponse, InferError> {
        let start = Instant::now();
        let strategy = request.strategy().name();
        let outcome = match self.resolver.resolve(request).await {
            Ok(credential) => self.proxy.execute(&credential, request).await,
            Err(error) => Err(error),
        };

        match &outcome {
            Ok(response) => info!(
                method = %request.method(),
                path = %request.path(),
                strategy,
                status = response.status,
                duration_ms = start.elapsed().as_millis(),
                "infer request completed"
            ),
            Err(error) => warn!(
                method = %request.method(),
                strategy,
                error_code = error.error_code(),
                error = %error,
                duration_ms = start.elapsed().as_millis(),
                "infer request failed"
            ),
        }
        outcome
    }
}
