//! Shared types for the infergate workspace.
//!
//! - [`fields`]: ordered alias tables and the generic lookup over JSON documents
//! - [`request`]: the inbound `/infer` request and its resolution [`Strategy`]
//! - [`credential`]: the Endpoint Data Reference used for the proxied call
//! - [`agreement`]: contract agreements and their signing time

pub mod agreement;
pub mod credential;
pub mod fields;
pub mod request;

pub use agreement::{Agreement, SigningTime};
pub use credential::{Credential, DEFAULT_AUTH_HEADER};
pub use request::{DEFAULT_METHOD, RequestError, ResolutionRequest, Strategy, TransferOverrides};
