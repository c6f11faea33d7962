//! Delimited-text export with a row-count guard.
//!
//! Values are written verbatim: no quoting, no escaping of `,` or newlines.

use chrono::{DateTime, Utc};
use thiserror::Error;

use neurocore_analytics::{CriticalItem, FilterSpec};
use neurocore_core::UserId;
use neurocore_customers::Customer;
use neurocore_sales::SaleRecord;

use crate::audit::{ExportFormat, ModuleCode, NewExportAudit};

pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8";

pub const INVENTORY_COLUMNS: &[&str] = &[
    "sku",
    "name",
    "category",
    "warehouse",
    "status",
    "stock",
    "min_stock_threshold",
    "rotation_rate",
    "criticality",
];

pub const SALES_COLUMNS: &[&str] = &["date", "channel", "product_id", "qty", "total_amount", "currency"];

pub const CUSTOMER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "phone",
    "segment",
    "last_purchase_at",
    "ltv",
    "churn_rate",
    "purchase_frequency",
];

/// A record that can render named columns as text.
pub trait ExportRow {
    /// Rendered value of `column`; `None` for absent values and unknown columns.
    fn column(&self, column: &str) -> Option<String>;
}

impl ExportRow for CriticalItem {
    fn column(&self, column: &str) -> Option<String> {
        let item = &self.item;
        match column {
            "sku" => Some(item.sku.clone()),
            "name" => Some(item.name.clone()),
            "category" => Some(item.category.clone()),
            "warehouse" => Some(item.warehouse.clone()),
            "status" => Some(item.status.clone()),
            "stock" => Some(item.stock.to_string()),
            "min_stock_threshold" => Some(item.min_stock_threshold.to_string()),
            "rotation_rate" => item.rotation_rate.map(|v| v.to_string()),
            "unit_price" => item.unit_price.map(|v| v.to_string()),
            "item_type" => Some(item.item_type.as_str().to_string()),
            "criticality" => Some(self.criticality.to_string()),
            _ => None,
        }
    }
}

impl ExportRow for SaleRecord {
    fn column(&self, column: &str) -> Option<String> {
        match column {
            "id" => Some(self.id.to_string()),
            "date" => Some(self.date.to_rfc3339()),
            "channel" => Some(self.channel.clone()),
            "product_id" => Some(self.product_id.clone()),
            "qty" => Some(self.qty.to_string()),
            "total_amount" => Some(self.total_amount.to_string()),
            "currency" => Some(self.currency.clone()),
            "customer_id" => self.customer_id.clone(),
            _ => None,
        }
    }
}

impl ExportRow for Customer {
    fn column(&self, column: &str) -> Option<String> {
        match column {
            "id" => Some(self.id.to_string()),
            "name" => Some(self.name.clone()),
            "email" => self.email.clone(),
            "phone" => self.phone.clone(),
            "segment" => Some(self.segment.as_str().to_string()),
            "last_purchase_at" => self.last_purchase_at.map(|d| d.to_rfc3339()),
            "ltv" => self.ltv.map(|v| v.to_string()),
            "churn_rate" => self.churn_rate.map(|v| v.to_string()),
            "purchase_frequency" => self.purchase_frequency.map(|v| v.to_string()),
            _ => None,
        }
    }
}

/// Header line, then one line per row; lines joined by `\n`, no trailing newline.
pub fn export_to_delimited<R: ExportRow>(rows: &[R], columns: &[&str]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(columns.join(","));
    for row in rows {
        let values: Vec<String> = columns
            .iter()
            .map(|column| row.column(column).unwrap_or_default())
            .collect();
        lines.push(values.join(","));
    }
    lines.join("\n")
}

/// Maximum number of rows a single export may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLimit(usize);

impl ExportLimit {
    pub const DEFAULT_ROWS: usize = 10_000;

    pub fn new(max_rows: usize) -> Self {
        Self(max_rows)
    }

    pub fn max_rows(&self) -> usize {
        self.0
    }
}

impl Default for ExportLimit {
    fn default() -> Self {
        Self(Self::DEFAULT_ROWS)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[error("export of {rows} rows exceeds the limit of {limit}; narrow the filters")]
    LimitExceeded { rows: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

/// A generated file together with the audit record describing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedExport {
    pub file: ExportFile,
    pub audit: NewExportAudit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportPipeline {
    limit: ExportLimit,
}

impl ExportPipeline {
    pub fn new(limit: ExportLimit) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> ExportLimit {
        self.limit
    }

    /// Build the CSV file and its audit record.
    ///
    /// Oversized row sets are rejected before anything is generated, so no
    /// audit record exists for a rejected export.
    pub fn prepare<R: ExportRow>(
        &self,
        module: ModuleCode,
        rows: &[R],
        columns: &[&str],
        filters: &FilterSpec,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<PreparedExport, ExportError> {
        if rows.len() > self.limit.max_rows() {
            return Err(ExportError::LimitExceeded {
                rows: rows.len(),
                limit: self.limit.max_rows(),
            });
        }

        let file = ExportFile {
            file_name: format!(
                "{}_{}.csv",
                module.file_prefix(),
                now.format("%Y-%m-%dT%H-%M-%S")
            ),
            content_type: CSV_CONTENT_TYPE,
            body: export_to_delimited(rows, columns),
        };
        let audit = NewExportAudit {
            user_id,
            module_code: module.as_str().to_string(),
            format: ExportFormat::Csv.as_str().to_string(),
            filters: serde_json::to_value(filters).unwrap_or(serde_json::Value::Null),
            record_count: rows.len() as i64,
        };
        Ok(PreparedExport { file, audit })
    }
}
