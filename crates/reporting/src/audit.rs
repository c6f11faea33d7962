//! Export audit records and the sink they are written to.
//!
//! Audit entries are write-once: sinks expose append and list, nothing else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use neurocore_core::{DomainResult, FieldErrors, RecordId, TenantId, UserId};

/// Dashboard module an export originates from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleCode {
    #[serde(rename = "MOD-NC-INV")]
    Inventory,
    #[serde(rename = "MOD-NC-VTA")]
    Sales,
    #[serde(rename = "MOD-NC-CLI")]
    Customers,
}

impl ModuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleCode::Inventory => "MOD-NC-INV",
            ModuleCode::Sales => "MOD-NC-VTA",
            ModuleCode::Customers => "MOD-NC-CLI",
        }
    }

    pub(crate) fn file_prefix(&self) -> &'static str {
        match self {
            ModuleCode::Inventory => "inventory",
            ModuleCode::Sales => "sales",
            ModuleCode::Customers => "customers",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "CSV")]
    Csv,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
        }
    }
}

/// An audit record that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExportAudit {
    pub user_id: UserId,
    pub module_code: String,
    pub format: String,
    pub filters: serde_json::Value,
    pub record_count: i64,
}

impl NewExportAudit {
    pub fn into_entry(self, id: RecordId, created_at: DateTime<Utc>) -> ExportAuditEntry {
        ExportAuditEntry {
            id,
            user_id: self.user_id,
            module_code: self.module_code,
            format: self.format,
            filters: self.filters,
            record_count: self.record_count,
            created_at,
        }
    }
}

/// Persisted, immutable audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAuditEntry {
    pub id: RecordId,
    pub user_id: UserId,
    pub module_code: String,
    pub format: String,
    pub filters: serde_json::Value,
    pub record_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Audit payload submitted directly by a client (the acting user comes from the session).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditSubmission {
    pub module_code: String,
    pub format: String,
    #[serde(default)]
    pub filters: serde_json::Value,
    pub record_count: i64,
}

impl AuditSubmission {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.module_code.trim().is_empty() {
            errors.add("module_code", "cannot be empty");
        }
        if self.format.trim().is_empty() {
            errors.add("format", "cannot be empty");
        }
        if self.record_count < 0 {
            errors.add("record_count", "must be >= 0");
        }
        errors.into_result()
    }

    pub fn into_audit(self, user_id: UserId) -> NewExportAudit {
        NewExportAudit {
            user_id,
            module_code: self.module_code,
            format: self.format,
            filters: self.filters,
            record_count: self.record_count,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for export audit records.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, tenant_id: TenantId, audit: NewExportAudit) -> Result<ExportAuditEntry, AuditError>;

    /// Entries for a tenant, oldest first.
    async fn list(&self, tenant_id: TenantId) -> Result<Vec<ExportAuditEntry>, AuditError>;
}
