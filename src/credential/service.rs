//! Per-request fetch-decrypt facade over the credential store

use std::sync::Arc;

use tracing::{debug, info};

use super::types::{CredentialBundle, PlainCredentials};
use crate::crypto::{Cipher, SecretString};
use crate::error::{Result, VaultError};
use crate::store::CredentialStore;

/// Stateless facade that joins the store and the cipher
///
/// Every `fetch` re-reads and re-decrypts, so plaintext never outlives one
/// call's scope and a credential rotation is visible immediately without any
/// invalidation logic.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    cipher: Arc<Cipher>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn CredentialStore>, cipher: Arc<Cipher>) -> Self {
        Self { store, cipher }
    }

    /// Fetch and decrypt the credentials for an owner + API pair
    ///
    /// An absent record is [`VaultError::CredentialsNotConfigured`]; a record
    /// that fails authenticated decryption on any field is
    /// [`VaultError::CredentialsCorrupted`]. A partially decrypted bundle is
    /// never returned.
    pub async fn fetch(&self, owner_id: &str, api_name: &str) -> Result<PlainCredentials> {
        let record = self
            .store
            .find(owner_id, api_name)
            .await?
            .ok_or_else(|| VaultError::CredentialsNotConfigured {
                owner_id: owner_id.to_string(),
            })?;

        let url = self
            .cipher
            .decrypt_str(&record.credentials.url)
            .map_err(mark_corrupted)?;
        let token = self
            .cipher
            .decrypt_str(&record.credentials.token)
            .map_err(mark_corrupted)?;

        debug!("Decrypted {} credentials for owner {}", api_name, owner_id);
        Ok(PlainCredentials::new(url, SecretString::new(token)))
    }

    /// Encrypt a new url + token pair and upsert the whole bundle
    ///
    /// Rejects empty inputs, and defensively rejects an empty sealed value
    /// from a misconfigured cipher, as [`VaultError::InvalidCredentials`].
    pub async fn put(&self, owner_id: &str, api_name: &str, url: &str, token: &str) -> Result<()> {
        if url.is_empty() || token.is_empty() {
            return Err(VaultError::InvalidCredentials(
                "url and token must be non-empty".to_string(),
            ));
        }

        let url_enc = self.cipher.encrypt_str(url)?;
        let token_enc = self.cipher.encrypt_str(token)?;

        if url_enc.ciphertext.is_empty() || token_enc.ciphertext.is_empty() {
            return Err(VaultError::InvalidCredentials(
                "cipher produced an empty sealed value".to_string(),
            ));
        }

        self.store
            .upsert(owner_id, api_name, CredentialBundle::new(url_enc, token_enc))
            .await?;

        info!("Stored rotated {} credentials for owner {}", api_name, owner_id);
        Ok(())
    }
}

fn mark_corrupted(err: VaultError) -> VaultError {
    match err {
        VaultError::DecryptionError(cause) => VaultError::CredentialsCorrupted(cause),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::MasterKey;
    use crate::store::MemoryStore;

    fn test_service() -> CredentialService {
        let cipher = Arc::new(Cipher::new(&MasterKey::new([7u8; 32])));
        CredentialService::new(Arc::new(MemoryStore::new()), cipher)
    }

    #[tokio::test]
    async fn test_fetch_before_configure() {
        let service = test_service();

        let result = service.fetch("guild-1", "Ctrlpanel.gg").await;
        assert!(matches!(
            result,
            Err(VaultError::CredentialsNotConfigured { ref owner_id }) if owner_id == "guild-1"
        ));
    }

    #[tokio::test]
    async fn test_put_then_fetch() {
        let service = test_service();

        service
            .put("guild-1", "Ctrlpanel.gg", "https://panel.example.com", "tok123")
            .await
            .unwrap();

        let plain = service.fetch("guild-1", "Ctrlpanel.gg").await.unwrap();
        assert_eq!(plain.url(), "https://panel.example.com");
        assert_eq!(plain.token(), "tok123");
    }

    #[tokio::test]
    async fn test_rotation_is_visible_immediately() {
        let service = test_service();

        service
            .put("guild-1", "Ctrlpanel.gg", "https://old.example.com", "old-tok")
            .await
            .unwrap();
        service
            .put("guild-1", "Ctrlpanel.gg", "https://new.example.com", "new-tok")
            .await
            .unwrap();

        let plain = service.fetch("guild-1", "Ctrlpanel.gg").await.unwrap();
        assert_eq!(plain.url(), "https://new.example.com");
        assert_eq!(plain.token(), "new-tok");
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let service = test_service();

        service
            .put("guild-1", "Ctrlpanel.gg", "https://one.example.com", "tok-1")
            .await
            .unwrap();

        let result = service.fetch("guild-2", "Ctrlpanel.gg").await;
        assert!(matches!(
            result,
            Err(VaultError::CredentialsNotConfigured { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_inputs_rejected() {
        let service = test_service();

        assert!(matches!(
            service.put("guild-1", "Ctrlpanel.gg", "", "tok123").await,
            Err(VaultError::InvalidCredentials(_))
        ));
        assert!(matches!(
            service
                .put("guild-1", "Ctrlpanel.gg", "https://panel.example.com", "")
                .await,
            Err(VaultError::InvalidCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupted_field_fails_whole_fetch() {
        let cipher = Arc::new(Cipher::new(&MasterKey::new([7u8; 32])));
        let store = Arc::new(MemoryStore::new());
        let service = CredentialService::new(store.clone(), cipher.clone());

        // store a bundle whose token was tampered with after encryption
        let url = cipher.encrypt_str("https://panel.example.com").unwrap();
        let mut token = cipher.encrypt_str("tok123").unwrap();
        token.tag[0] ^= 0x01;

        store
            .upsert("guild-1", "Ctrlpanel.gg", CredentialBundle::new(url, token))
            .await
            .unwrap();

        let result = service.fetch("guild-1", "Ctrlpanel.gg").await;
        assert!(matches!(result, Err(VaultError::CredentialsCorrupted(_))));
    }

    #[tokio::test]
    async fn test_wrong_key_reports_corrupted() {
        let store = Arc::new(MemoryStore::new());
        let writer = CredentialService::new(
            store.clone(),
            Arc::new(Cipher::new(&MasterKey::new([7u8; 32]))),
        );
        let reader = CredentialService::new(
            store,
            Arc::new(Cipher::new(&MasterKey::new([8u8; 32]))),
        );

        writer
            .put("guild-1", "Ctrlpanel.gg", "https://panel.example.com", "tok123")
            .await
            .unwrap();

        let result = reader.fetch("guild-1", "Ctrlpanel.gg").await;
        assert!(matches!(result, Err(VaultError::CredentialsCorrupted(_))));
    }
}
