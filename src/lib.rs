//! # panel-vault
//!
//! Encrypted credential vault and authenticated client for a hosting-panel
//! storefront API:
//! - AES-256-GCM encryption with zeroize-on-drop secret handling
//! - opaque credential records keyed by `(owner, api name)`
//! - per-fetch decryption so plaintext never outlives one operation's scope
//! - voucher issuance against the panel's HTTP API with distinguishable
//!   failure modes (missing credentials vs. transport vs. remote rejection)

pub mod credential;
pub mod crypto;
pub mod error;
pub mod panel;
pub mod store;

pub use credential::{CredentialBundle, CredentialRecord, CredentialService, PlainCredentials};
pub use crypto::{Cipher, EncryptedValue, MasterKey, SecretString};
pub use error::{Result, VaultError};
pub use panel::{PanelClient, Voucher, API_NAME};
pub use store::{CredentialStore, JsonFileStore, MemoryStore};
