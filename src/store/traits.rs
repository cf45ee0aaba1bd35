//! Store trait definition

use async_trait::async_trait;

use crate::credential::{CredentialBundle, CredentialRecord};
use crate::error::Result;

/// Trait for credential record backends
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the record for an owner + API pair
    async fn find(&self, owner_id: &str, api_name: &str) -> Result<Option<CredentialRecord>>;

    /// Insert or replace the bundle for an owner + API pair
    ///
    /// Atomic per call: a concurrent reader sees the previous bundle or the
    /// new one, never a field-wise mix. Replacement keeps `created_at` and
    /// refreshes `updated_at`.
    async fn upsert(&self, owner_id: &str, api_name: &str, bundle: CredentialBundle)
        -> Result<()>;

    /// Remove the record for an owner + API pair, reporting whether it existed
    async fn remove(&self, owner_id: &str, api_name: &str) -> Result<bool>;

    /// Get a human-readable name for this backend
    fn backend_name(&self) -> &'static str;
}
