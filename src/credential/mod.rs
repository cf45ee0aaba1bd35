//! Credential records and the fetch-decrypt service

mod service;
mod types;

pub use service::CredentialService;
pub use types::{CredentialBundle, CredentialRecord, PlainCredentials};
