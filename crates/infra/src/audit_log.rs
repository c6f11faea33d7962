//! Store-backed export audit log (append and list only).

use std::sync::Arc;

use chrono::Utc;

use neurocore_core::{RecordId, TenantId};
use neurocore_reporting::{AuditError, AuditSink, ExportAuditEntry, NewExportAudit};

use crate::store::{DynStore, InMemoryTenantStore, StoreError};

#[derive(Clone)]
pub struct StoreAuditLog {
    store: DynStore<RecordId, ExportAuditEntry>,
}

impl StoreAuditLog {
    pub fn new(store: DynStore<RecordId, ExportAuditEntry>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTenantStore::new()))
    }
}

fn unavailable(err: StoreError) -> AuditError {
    AuditError::Unavailable(err.to_string())
}

#[async_trait::async_trait]
impl AuditSink for StoreAuditLog {
    async fn record(&self, tenant_id: TenantId, audit: NewExportAudit) -> Result<ExportAuditEntry, AuditError> {
        // Fresh ids only: an existing entry is never overwritten.
        let entry = audit.into_entry(RecordId::new(), Utc::now());
        self.store
            .upsert(tenant_id, entry.id, entry.clone())
            .await
            .map_err(unavailable)?;
        tracing::info!(
            tenant_id = %tenant_id,
            audit_id = %entry.id,
            module_code = %entry.module_code,
            record_count = entry.record_count,
            "export audited"
        );
        Ok(entry)
    }

    async fn list(&self, tenant_id: TenantId) -> Result<Vec<ExportAuditEntry>, AuditError> {
        self.store.list(tenant_id).await.map_err(unavailable)
    }
}
