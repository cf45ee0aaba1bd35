//! In-memory store backend
//!
//! Used by tests and by embedders that keep records in an external database
//! and only need the vault's crypto path.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::CredentialStore;
use crate::credential::{CredentialBundle, CredentialRecord};
use crate::error::Result;

/// In-memory credential record store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, String), CredentialRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find(&self, owner_id: &str, api_name: &str) -> Result<Option<CredentialRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(owner_id.to_string(), api_name.to_string()))
            .cloned())
    }

    async fn upsert(
        &self,
        owner_id: &str,
        api_name: &str,
        bundle: CredentialBundle,
    ) -> Result<()> {
        let mut records = self.records.write().await;

        match records.get_mut(&(owner_id.to_string(), api_name.to_string())) {
            Some(existing) => {
                existing.credentials = bundle;
                existing.updated_at = Utc::now();
            }
            None => {
                records.insert(
                    (owner_id.to_string(), api_name.to_string()),
                    CredentialRecord::new(owner_id, api_name, bundle),
                );
            }
        }

        debug!("Upserted {} record for owner {}", api_name, owner_id);
        Ok(())
    }

    async fn remove(&self, owner_id: &str, api_name: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let existed = records
            .remove(&(owner_id.to_string(), api_name.to_string()))
            .is_some();

        if existed {
            debug!("Removed {} record for owner {}", api_name, owner_id);
        }
        Ok(existed)
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory Store"
    }
}
