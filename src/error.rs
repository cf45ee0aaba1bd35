//! Error types for panel-vault

use thiserror::Error;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

/// Vault error types
///
/// Credential-layer errors (`CredentialsNotConfigured`, `CredentialsCorrupted`)
/// indicate a configuration problem the owner has to fix and are never worth
/// retrying. `TransportError` is the only variant a caller may sensibly retry.
/// No variant ever carries a secret in its message.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("no API credentials configured for owner {owner_id} - store credentials first")]
    CredentialsNotConfigured { owner_id: String },

    #[error("stored credentials failed authenticated decryption: {0}")]
    CredentialsCorrupted(String),

    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("invalid master key: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    EncryptionError(String),

    #[error("decryption failed: {0}")]
    DecryptionError(String),

    #[error("could not reach the panel API: {0}")]
    TransportError(String),

    #[error("panel API rejected the request with status {status}")]
    RemoteRejected { status: u16, body: String },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
