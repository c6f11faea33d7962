use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId};

/// Customer lifecycle segment.
///
/// Legacy wire names (`nuevo`, `activo`, `inactivo`) are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    #[serde(alias = "nuevo")]
    New,
    #[serde(alias = "activo")]
    Active,
    #[serde(alias = "inactivo")]
    Inactive,
}

impl Segment {
    pub const ALL: [Segment; 3] = [Segment::New, Segment::Active, Segment::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::New => "new",
            Segment::Active => "active",
            Segment::Inactive => "inactive",
        }
    }

    /// Parse a filter value, accepting both canonical and legacy names.
    pub fn parse(raw: &str) -> Option<Segment> {
        match raw {
            "new" | "nuevo" => Some(Segment::New),
            "active" | "activo" => Some(Segment::Active),
            "inactive" | "inactivo" => Some(Segment::Inactive),
            _ => None,
        }
    }
}

impl core::fmt::Display for Segment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub segment: Segment,
    pub last_purchase_at: Option<DateTime<Utc>>,
    pub ltv: Option<f64>,
    pub churn_rate: Option<f64>,
    pub purchase_frequency: Option<f64>,
}

impl Entity for Customer {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command payload: upsert a customer from CRM sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub segment: Segment,
    #[serde(default)]
    pub last_purchase_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ltv: Option<f64>,
    #[serde(default)]
    pub churn_rate: Option<f64>,
    #[serde(default)]
    pub purchase_frequency: Option<f64>,
}

impl NewCustomer {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.name.trim().is_empty() {
            errors.add("name", "cannot be empty");
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                errors.add("email", "must contain '@'");
            }
        }
        for (field, value) in [
            ("ltv", self.ltv),
            ("churn_rate", self.churn_rate),
            ("purchase_frequency", self.purchase_frequency),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    errors.add(field, "must be a finite number >= 0");
                }
            }
        }
        errors.into_result()
    }

    pub fn into_customer(self, id: RecordId) -> Customer {
        Customer {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            segment: self.segment,
            last_purchase_at: self.last_purchase_at,
            ltv: self.ltv,
            churn_rate: self.churn_rate,
            purchase_frequency: self.purchase_frequency,
        }
    }
}
