//! `neurocore-reporting` — CSV export, export auditing and PII redaction.

pub mod audit;
pub mod export;
pub mod redact;

pub use audit::{AuditError, AuditSink, AuditSubmission, ExportAuditEntry, ExportFormat, ModuleCode, NewExportAudit};
pub use export::{
    CSV_CONTENT_TYPE, CUSTOMER_COLUMNS, ExportError, ExportFile, ExportLimit, ExportPipeline, ExportRow,
    INVENTORY_COLUMNS, PreparedExport, SALES_COLUMNS, export_to_delimited,
};
pub use redact::{MASK, SensitiveField, redact, redact_customer, redact_sale};
