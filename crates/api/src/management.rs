//! Management API endpoints used by the resolution pipeline.
//!
//! All paths are relative to the versioned management root held by
//! [`ManagementClient`]. Request documents carry the EDC JSON-LD context so
//! that the connector expands plain keys into its namespace.

use async_trait::async_trait;
use infergate_types::fields::EDC_NAMESPACE;
use infergate_util::http::build_path;
use reqwest::Method;
use serde_json::{Value, json};

use crate::{ApiError, ManagementClient};

/// Paging window for the contract agreement query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgreementQuery {
    pub offset: usize,
    pub limit: usize,
}

impl AgreementQuery {
    /// A top-level `QuerySpec`, with the same window repeated under `querySpec`
    /// for connectors that read the wrapped form.
    pub fn to_document(&self) -> Value {
        json!({
            "@context": { "@vocab": EDC_NAMESPACE },
            "@type": "QuerySpec",
            "offset": self.offset,
            "limit": self.limit,
            "filterExpression": [],
            "querySpec": {
                "offset": self.offset,
                "limit": self.limit,
                "filterExpression": []
            }
        })
    }
}

/// Transfer initiation parameters after defaults have been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub contract_id: String,
    pub connector_id: Option<String>,
    pub counter_party_address: String,
    pub protocol: String,
    pub transfer_type: String,
}

impl TransferRequest {
    pub fn to_document(&self) -> Value {
        let mut document = json!({
            "@context": { "@vocab": EDC_NAMESPACE },
            "@type": "TransferRequest",
            "counterPartyAddress": self.counter_party_address,
            "contractId": self.contract_id,
            "protocol": self.protocol,
            "transferType": self.transfer_type,
        });
        if let Some(connector_id) = &self.connector_id {
            document["connectorId"] = Value::String(connector_id.clone());
        }
        document
    }
}

/// The four management calls the resolver depends on.
///
/// Every method returns the parsed response document on a success status and
/// an [`ApiError`] otherwise; interpreting the document is left to callers.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// `GET /assets/{id}`
    async fn get_asset(&self, asset_id: &str) -> Result<Value, ApiError>;

    /// `POST /contractagreements/request`
    async fn query_agreements(&self, query: AgreementQuery) -> Result<Value, ApiError>;

    /// `POST /transferprocesses`
    async fn initiate_transfer(&self, request: &TransferRequest) -> Result<Value, ApiError>;

    /// `GET /edrs/{transferProcessId}/dataaddress`
    async fn get_edr_data_address(&self, transfer_process_id: &str) -> Result<Value, ApiError>;
}

#[async_trait]
impl ManagementApi for ManagementClient {
    async fn get_asset(&self, asset_id: &str) -> Result<Value, ApiError> {
        let path = build_path("/assets/{id}", &[("id", asset_id)]);
        self.send_json(Method::GET, &path, None).await
    }

    async fn query_agreements(&self, query: AgreementQuery) -> Result<Value, ApiError> {
        self.send_json(Method::POST, "/contractagreements/request", Some(query.to_document()))
            .await
    }

    async fn initiate_transfer(&self, request: &TransferRequest) -> Result<Value, ApiError> {
        self.send_json(Method::POST, "/transferprocesses", Some(request.to_document()))
            .await
    }

    async fn get_edr_data_address(&self, transfer_process_id: &str) -> Result<Value, ApiError> {
        let path = build_path("/edrs/{id}/dataaddress", &[("id", transfer_process_id)]);
        self.send_json(Method::GET, &path, None).await
    }
}
