//! Display-time masking of personal data for non-privileged viewers.
//!
//! Works on characters, not bytes, so multi-byte input is never split.

use std::borrow::Cow;

use neurocore_customers::Customer;
use neurocore_sales::SaleRecord;

pub const MASK: &str = "****";

/// Field kinds that carry masking rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SensitiveField {
    Email,
    Phone,
    CustomerRef,
}

impl SensitiveField {
    pub fn from_name(name: &str) -> Option<SensitiveField> {
        match name {
            "email" => Some(SensitiveField::Email),
            "phone" => Some(SensitiveField::Phone),
            "customer_id" => Some(SensitiveField::CustomerRef),
            _ => None,
        }
    }
}

fn keep_prefix(value: &str, chars: usize) -> String {
    let mut out: String = value.chars().take(chars).collect();
    out.push_str(MASK);
    out
}

fn mask_email(value: &str) -> String {
    match value.split_once('@') {
        Some((local, domain)) => format!("{}@{domain}", keep_prefix(local, 2)),
        None => keep_prefix(value, 2),
    }
}

/// Mask `value` of the named field unless the viewer is privileged.
///
/// Fields without a rule pass through unchanged.
pub fn redact<'a>(field: &str, value: &'a str, is_privileged: bool) -> Cow<'a, str> {
    if is_privileged {
        return Cow::Borrowed(value);
    }
    match SensitiveField::from_name(field) {
        Some(SensitiveField::Email) => Cow::Owned(mask_email(value)),
        Some(SensitiveField::Phone) => Cow::Owned(keep_prefix(value, 3)),
        Some(SensitiveField::CustomerRef) => Cow::Owned(keep_prefix(value, 4)),
        None => Cow::Borrowed(value),
    }
}

fn redact_opt(field: &str, value: Option<&str>, is_privileged: bool) -> Option<String> {
    value.map(|v| redact(field, v, is_privileged).into_owned())
}

/// Copy of `customer` fit for the viewer. The stored record is never touched.
pub fn redact_customer(customer: &Customer, is_privileged: bool) -> Customer {
    Customer {
        email: redact_opt("email", customer.email.as_deref(), is_privileged),
        phone: redact_opt("phone", customer.phone.as_deref(), is_privileged),
        ..customer.clone()
    }
}

pub fn redact_sale(sale: &SaleRecord, is_privileged: bool) -> SaleRecord {
    SaleRecord {
        customer_id: redact_opt("customer_id", sale.customer_id.as_deref(), is_privileged),
        ..sale.clone()
    }
}
