//! Helpers shared by the management client and the resolution engine.

pub mod collection;
pub mod http;
mod redact;

pub use collection::extract_collection_items;
pub use redact::redact_sensitive;
