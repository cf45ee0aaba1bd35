//! Credential record persistence
//!
//! The store treats bundles as opaque ciphertext - no cryptography happens
//! here. Records are keyed uniquely by `(owner_id, api_name)`.

mod file;
mod memory;
mod traits;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::CredentialStore;
