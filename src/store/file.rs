//! JSON file store backend
//!
//! Persists credential records as a single versioned JSON document in the
//! user's data directory. Bundles are stored as-is: they are already
//! ciphertext, the file layer adds no cryptography of its own.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::CredentialStore;
use crate::credential::{CredentialBundle, CredentialRecord};
use crate::error::{Result, VaultError};

const STORE_FILE: &str = "credentials.json";

/// File-backed credential record store
pub struct JsonFileStore {
    /// Directory holding the store file
    store_dir: PathBuf,
    /// In-memory view of the store file
    cache: RwLock<HashMap<String, CredentialRecord>>,
}

/// On-disk document shape
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: HashMap<String, CredentialRecord>,
}

// Owner ids and api names must not contain ':' - owner ids are numeric
// platform snowflakes in practice.
fn record_key(owner_id: &str, api_name: &str) -> String {
    format!("{}:{}", owner_id, api_name)
}

impl JsonFileStore {
    /// Create a store in the default data directory
    pub fn new() -> Result<Self> {
        let store_dir = Self::default_store_dir()?;
        Self::with_dir(store_dir)
    }

    /// Create a store with a custom directory (for testing)
    pub fn with_dir(store_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&store_dir)?;

        debug!("Credential file store initialized at: {:?}", store_dir);

        Ok(Self {
            store_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn default_store_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "panel-vault", "panel-vault")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| {
                VaultError::StorageError("could not determine data directory".to_string())
            })
    }

    fn store_file_path(&self) -> PathBuf {
        self.store_dir.join(STORE_FILE)
    }

    /// Load existing records from disk
    pub async fn load(&self) -> Result<()> {
        let path = self.store_file_path();

        if !path.exists() {
            debug!("No existing store file found");
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&path).await?;
        let file: StoreFile = serde_json::from_str(&contents)?;

        let mut cache = self.cache.write().await;
        *cache = file.records;

        debug!("Loaded {} credential records from store", cache.len());
        Ok(())
    }

    /// Write the given view of the records to disk atomically
    async fn persist(&self, records: &HashMap<String, CredentialRecord>) -> Result<()> {
        let file = StoreFile {
            version: 1,
            records: records.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.store_file_path();

        // Write atomically using a temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &path).await?;

        debug!("Saved {} credential records to store", records.len());
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for JsonFileStore {
    async fn find(&self, owner_id: &str, api_name: &str) -> Result<Option<CredentialRecord>> {
        let cache = self.cache.read().await;
        Ok(cache.get(&record_key(owner_id, api_name)).cloned())
    }

    // The write guard is held across the disk write so a concurrent reader
    // never observes a half-replaced bundle.
    async fn upsert(
        &self,
        owner_id: &str,
        api_name: &str,
        bundle: CredentialBundle,
    ) -> Result<()> {
        let mut cache = self.cache.write().await;

        match cache.get_mut(&record_key(owner_id, api_name)) {
            Some(existing) => {
                existing.credentials = bundle;
                existing.updated_at = Utc::now();
            }
            None => {
                cache.insert(
                    record_key(owner_id, api_name),
                    CredentialRecord::new(owner_id, api_name, bundle),
                );
            }
        }

        self.persist(&cache).await?;

        debug!("Upserted {} record for owner {}", api_name, owner_id);
        Ok(())
    }

    async fn remove(&self, owner_id: &str, api_name: &str) -> Result<bool> {
        let mut cache = self.cache.write().await;

        if cache.remove(&record_key(owner_id, api_name)).is_none() {
            return Ok(false);
        }

        self.persist(&cache).await?;

        debug!("Removed {} record for owner {}", api_name, owner_id);
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "JSON File Store"
    }
}
