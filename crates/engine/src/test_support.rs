//! In-memory management API used by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use infergate_api::{AgreementQuery, ApiError, ManagementApi, TransferRequest};
use serde_json::Value;

/// Which management call was made, with its key argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetAsset(String),
    QueryAgreements(AgreementQuery),
    InitiateTransfer(TransferRequest),
    GetEdr(String),
}

type Reply = Result<Value, ApiError>;

#[derive(Default)]
pub struct FakeManagement {
    calls: Mutex<Vec<Call>>,
    assets: Mutex<VecDeque<Reply>>,
    agreements: Mutex<VecDeque<Reply>>,
    transfers: Mutex<VecDeque<Reply>>,
    edrs: Mutex<VecDeque<Reply>>,
    edr_delay: Option<Duration>,
}

impl FakeManagement {
    pub fn with_asset(self, reply: Reply) -> Self {
        push(&self.assets, reply);
        self
    }

    pub fn with_agreements(self, reply: Reply) -> Self {
        push(&self.agreements, reply);
        self
    }

    pub fn with_transfer(self, reply: Reply) -> Self {
        push(&self.transfers, reply);
        self
    }

    pub fn with_edr(self, reply: Reply) -> Self {
        push(&self.edrs, reply);
        self
    }

    /// Every EDR lookup waits this long before answering.
    pub fn with_edr_delay(mut self, delay: Duration) -> Self {
        self.edr_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }
}

fn push(queue: &Mutex<VecDeque<Reply>>, reply: Reply) {
    queue.lock().expect("queue").push_back(reply);
}

/// Pops the next scripted reply; an empty queue answers 404.
fn next(queue: &Mutex<VecDeque<Reply>>, url: &str) -> Reply {
    queue
        .lock()
        .expect("queue")
        .pop_front()
        .unwrap_or_else(|| Err(ApiError::status(url, 404, "")))
}

#[async_trait]
impl ManagementApi for FakeManagement {
    async fn get_asset(&self, asset_id: &str) -> Result<Value, ApiError> {
        self.record(Call::GetAsset(asset_id.to_string()));
        next(&self.assets, "fake://assets")
    }

    async fn query_agreements(&self, query: AgreementQuery) -> Result<Value, ApiError> {
        self.record(Call::QueryAgreements(query));
        next(&self.agreements, "fake://contractagreements/request")
    }

    async fn initiate_transfer(&self, request: &TransferRequest) -> Result<Value, ApiError> {
        self.record(Call::InitiateTransfer(request.clone()));
        next(&self.transfers, "fake://transferprocesses")
    }

    async fn get_edr_data_address(&self, transfer_process_id: &str) -> Result<Value, ApiError> {
        self.record(Call::GetEdr(transfer_process_id.to_string()));
        if let Some(delay) = self.edr_delay {
            tokio::time::sleep(delay).await;
        }
        next(&self.edrs, "fake://edrs")
    }
}
