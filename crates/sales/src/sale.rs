use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId};

/// One sale line as synced from a sales channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub id: RecordId,
    pub date: DateTime<Utc>,
    pub channel: String,
    pub product_id: String,
    pub qty: i64,
    pub total_amount: f64,
    pub currency: String,
    pub customer_id: Option<String>,
}

impl Entity for SaleRecord {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command payload: record a sale (channel sync ingestion).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSaleRecord {
    pub date: DateTime<Utc>,
    pub channel: String,
    pub product_id: String,
    pub qty: i64,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub customer_id: Option<String>,
}

impl NewSaleRecord {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.channel.trim().is_empty() {
            errors.add("channel", "cannot be empty");
        }
        if self.product_id.trim().is_empty() {
            errors.add("product_id", "cannot be empty");
        }
        if self.currency.trim().is_empty() {
            errors.add("currency", "cannot be empty");
        }
        if !self.total_amount.is_finite() {
            errors.add("total_amount", "must be a finite number");
        }
        errors.into_result()
    }

    pub fn into_record(self, id: RecordId) -> SaleRecord {
        SaleRecord {
            id,
            date: self.date,
            channel: self.channel,
            product_id: self.product_id,
            qty: self.qty,
            total_amount: self.total_amount,
            currency: self.currency,
            customer_id: self.customer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_rfc3339_dates() {
        let raw = r#"{"date":"2024-03-04T10:15:00Z","channel":"web","product_id":"P1",
            "qty":2,"total_amount":40.0,"currency":"USD"}"#;
        let payload: NewSaleRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.validate(), Ok(()));
        let record = payload.into_record(RecordId::new());
        assert_eq!(record.customer_id, None);
        assert_eq!(record.date.to_rfc3339(), "2024-03-04T10:15:00+00:00");
    }

    #[test]
    fn malformed_date_fails_loudly() {
        let raw = r#"{"date":"yesterday","channel":"web","product_id":"P1",
            "qty":2,"total_amount":40.0,"currency":"USD"}"#;
        assert!(serde_json::from_str::<NewSaleRecord>(raw).is_err());
    }

    #[test]
    fn blank_channel_is_rejected() {
        let raw = r#"{"date":"2024-03-04T10:15:00Z","channel":" ","product_id":"P1",
            "qty":2,"total_amount":40.0,"currency":"USD"}"#;
        let payload: NewSaleRecord = serde_json::from_str(raw).unwrap();
        assert!(payload.validate().is_err());
    }
}
