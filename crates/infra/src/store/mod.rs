//! Tenant-isolated record storage.
//!
//! Every read and write is keyed by `TenantId` first; there is no API that can
//! reach another tenant's records.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use thiserror::Error;

use neurocore_core::TenantId;

pub use memory::InMemoryTenantStore;
pub use postgres::{PostgresTenantStore, migrate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failure in {operation}: {message}")]
    Backend { operation: &'static str, message: String },

    /// A stored document no longer matches the record schema.
    #[error("stored {collection} document does not match its schema: {message}")]
    Deserialize { collection: &'static str, message: String },

    #[error("could not encode {collection} document: {message}")]
    Serialize { collection: &'static str, message: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Async tenant-scoped key/value store.
///
/// `list` returns records in key order. With UUIDv7 record ids that is
/// insertion order.
#[async_trait::async_trait]
pub trait TenantStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    async fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError>;

    /// Remove and return the record, `None` if it did not exist.
    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError>;

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError>;
}

#[async_trait::async_trait]
impl<K, V, S> TenantStore<K, V> for Arc<S>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: TenantStore<K, V> + ?Sized,
{
    async fn get(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).get(tenant_id, key).await
    }

    async fn upsert(&self, tenant_id: TenantId, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(tenant_id, key, value).await
    }

    async fn remove(&self, tenant_id: TenantId, key: &K) -> Result<Option<V>, StoreError> {
        (**self).remove(tenant_id, key).await
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<V>, StoreError> {
        (**self).list(tenant_id).await
    }
}

/// Shared, type-erased store handle.
pub type DynStore<K, V> = Arc<dyn TenantStore<K, V>>;
