//! Local shortcut for assets this connector serves over plain HTTP.

use std::sync::Arc;

use infergate_api::{ApiError, ManagementApi};
use infergate_types::fields::{extract_text, first_node, keys};
use serde_json::Value;
use tracing::debug;

use crate::InferError;

/// Looks up an asset in the local registry and returns its base URL when the
/// asset is directly reachable.
#[derive(Clone)]
pub struct LocalShortcutProbe {
    api: Arc<dyn ManagementApi>,
}

impl LocalShortcutProbe {
    pub fn new(api: Arc<dyn ManagementApi>) -> Self {
        Self { api }
    }

    /// Returns the asset's HTTP base URL, or `None` when negotiation is required.
    ///
    /// A non-success lookup means the asset is not registered locally. A
    /// transport failure is reported as an upstream failure.
    pub async fn probe(&self, asset_id: &str) -> Result<Option<String>, InferError> {
        let asset = match self.api.get_asset(asset_id).await {
            Ok(asset) => asset,
            Err(ApiError::Status { status, .. }) => {
                debug!(asset_id = %asset_id, status, "asset not registered locally");
                return Ok(None);
            }
            Err(error) => return Err(InferError::upstream("asset lookup", &error)),
        };

        let base_url = local_http_address(&asset);
        debug!(asset_id = %asset_id, shortcut = base_url.is_some(), "local shortcut probe finished");
        Ok(base_url)
    }
}

/// Extracts the base URL of an asset whose data address is declared as HTTP.
///
/// Both the declared type and the base URL must be present.
pub fn local_http_address(asset: &Value) -> Option<String> {
    let data_address = first_node(asset, keys::DATA_ADDRESS)?;
    let address_type = extract_text(data_address, keys::DATA_ADDRESS_TYPE)?;
    if !address_type.to_ascii_lowercase().contains("http") {
        return None;
    }
    extract_text(data_address, keys::DATA_ADDRESS_BASE_URL)
}
