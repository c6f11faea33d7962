//! Per-tenant feature flags.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use neurocore_core::{DomainError, TenantId};

use crate::error::ServiceError;
use crate::store::{DynStore, InMemoryTenantStore, StoreError};

/// Gates the package and combo endpoints.
pub const NC_INVENTORY_COMBOS: &str = "NC_INVENTORY_COMBOS";

/// Flags reported even when never set (as `false`).
pub const KNOWN_FLAGS: &[&str] = &[NC_INVENTORY_COMBOS];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub feature_code: String,
    pub enabled: bool,
}

#[derive(Clone)]
pub struct FeatureFlags {
    store: DynStore<String, FeatureFlag>,
}

impl FeatureFlags {
    pub fn new(store: DynStore<String, FeatureFlag>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTenantStore::new()))
    }

    /// Unknown or unset flags are disabled.
    pub async fn is_enabled(&self, tenant_id: TenantId, code: &str) -> Result<bool, StoreError> {
        Ok(self
            .store
            .get(tenant_id, &code.to_string())
            .await?
            .is_some_and(|flag| flag.enabled))
    }

    /// All flags for a tenant, known flags included.
    pub async fn all(&self, tenant_id: TenantId) -> Result<BTreeMap<String, bool>, StoreError> {
        let mut flags: BTreeMap<String, bool> =
            KNOWN_FLAGS.iter().map(|code| (code.to_string(), false)).collect();
        for flag in self.store.list(tenant_id).await? {
            flags.insert(flag.feature_code, flag.enabled);
        }
        Ok(flags)
    }

    pub async fn set(&self, tenant_id: TenantId, code: &str, enabled: bool) -> Result<FeatureFlag, ServiceError> {
        let code = code.trim();
        let well_formed = !code.is_empty()
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if !well_formed {
            return Err(DomainError::validation("feature code must match [A-Z0-9_]+").into());
        }

        let flag = FeatureFlag {
            feature_code: code.to_string(),
            enabled,
        };
        self.store.upsert(tenant_id, flag.feature_code.clone(), flag.clone()).await?;
        tracing::info!(tenant_id = %tenant_id, feature_code = code, enabled, "feature flag set");
        Ok(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_flags_are_off() {
        let flags = FeatureFlags::in_memory();
        let tenant = TenantId::new();
        assert!(!flags.is_enabled(tenant, NC_INVENTORY_COMBOS).await.unwrap());
        assert!(!flags.is_enabled(tenant, "NOPE").await.unwrap());
        assert_eq!(
            flags.all(tenant).await.unwrap(),
            BTreeMap::from([(NC_INVENTORY_COMBOS.to_string(), false)])
        );
    }

    #[tokio::test]
    async fn set_is_tenant_scoped() {
        let flags = FeatureFlags::in_memory();
        let (a, b) = (TenantId::new(), TenantId::new());
        flags.set(a, NC_INVENTORY_COMBOS, true).await.unwrap();
        assert!(flags.is_enabled(a, NC_INVENTORY_COMBOS).await.unwrap());
        assert!(!flags.is_enabled(b, NC_INVENTORY_COMBOS).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_codes_are_rejected() {
        let flags = FeatureFlags::in_memory();
        let err = flags.set(TenantId::new(), "combos on", true).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }
}
