//! Credential type definitions

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{EncryptedValue, SecretString};

/// The named set of encrypted fields for one external API
///
/// A closed record rather than an open map: the known fields are typed, and
/// `extra` is the extension point for encrypted fields added later. Every
/// field is ciphertext from the moment the bundle is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialBundle {
    /// Encrypted panel base URL
    pub url: EncryptedValue,
    /// Encrypted bearer token
    pub token: EncryptedValue,
    /// Extension point for future encrypted fields
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, EncryptedValue>,
}

impl CredentialBundle {
    pub fn new(url: EncryptedValue, token: EncryptedValue) -> Self {
        Self {
            url,
            token,
            extra: BTreeMap::new(),
        }
    }
}

/// Persisted credential entity, unique per `(owner_id, api_name)`
///
/// Created on the first rotation for a pair, replaced whole on later
/// rotations - never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Tenant identity the credentials belong to
    pub owner_id: String,
    /// External API the credentials authenticate against
    pub api_name: String,
    /// The encrypted bundle (opaque to the store)
    pub credentials: CredentialBundle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn new(owner_id: &str, api_name: &str, credentials: CredentialBundle) -> Self {
        let now = Utc::now();
        Self {
            owner_id: owner_id.to_string(),
            api_name: api_name.to_string(),
            credentials,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Decrypted credentials for one fetch - automatically zeroed when dropped
///
/// Lives only as long as the operation (or client instance) that fetched it.
/// Not serializable, and `Debug` redacts both fields.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PlainCredentials {
    url: String,
    token: SecretString,
}

impl PlainCredentials {
    pub(crate) fn new(url: String, token: SecretString) -> Self {
        Self { url, token }
    }

    /// Plaintext panel base URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Plaintext bearer token (use carefully)
    pub fn token(&self) -> &str {
        self.token.expose()
    }
}

impl std::fmt::Debug for PlainCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlainCredentials")
            .field("url", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Cipher, MasterKey};

    #[test]
    fn test_bundle_serde_roundtrip() {
        let cipher = Cipher::new(&MasterKey::new([7u8; 32]));
        let bundle = CredentialBundle::new(
            cipher.encrypt_str("https://panel.example.com").unwrap(),
            cipher.encrypt_str("tok123").unwrap(),
        );

        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: CredentialBundle = serde_json::from_str(&json).unwrap();

        assert_eq!(cipher.decrypt_str(&parsed.url).unwrap(), "https://panel.example.com");
        assert_eq!(cipher.decrypt_str(&parsed.token).unwrap(), "tok123");
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_plain_credentials_debug_redacted() {
        let plain = PlainCredentials::new(
            "https://panel.example.com".to_string(),
            SecretString::new("tok123".to_string()),
        );

        let debug = format!("{:?}", plain);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("tok123"));
        assert!(!debug.contains("panel.example.com"));
    }
}
