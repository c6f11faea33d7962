//! Flat equality filters over dashboard records.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use neurocore_customers::Customer;
use neurocore_inventory::InventoryItem;
use neurocore_sales::SaleRecord;

/// Field name → required value. An empty value (or a missing key) leaves the
/// field unconstrained; all non-empty constraints must hold (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec(BTreeMap<String, String>);

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// The constraint for `field`, if one is active.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Active (non-empty) constraints in field order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    pub fn is_unconstrained(&self) -> bool {
        self.active().next().is_none()
    }

    /// Keep only the listed keys (e.g. the query parameters a view understands).
    pub fn restricted_to(&self, fields: &[&str]) -> FilterSpec {
        FilterSpec(
            self.0
                .iter()
                .filter(|(field, _)| fields.contains(&field.as_str()))
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FilterSpec(
            iter.into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }
}

/// Exposes named string fields for equality filtering.
pub trait Filterable {
    /// Value of `field`, or `None` if the record has no such field or it is absent.
    fn field(&self, field: &str) -> Option<Cow<'_, str>>;
}

impl Filterable for InventoryItem {
    fn field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "sku" => Some(Cow::Borrowed(&self.sku)),
            "name" => Some(Cow::Borrowed(&self.name)),
            "category" => Some(Cow::Borrowed(&self.category)),
            "warehouse" => Some(Cow::Borrowed(&self.warehouse)),
            "status" => Some(Cow::Borrowed(&self.status)),
            "item_type" => Some(Cow::Borrowed(self.item_type.as_str())),
            _ => None,
        }
    }
}

impl Filterable for SaleRecord {
    fn field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "channel" => Some(Cow::Borrowed(&self.channel)),
            "product_id" => Some(Cow::Borrowed(&self.product_id)),
            "currency" => Some(Cow::Borrowed(&self.currency)),
            "customer_id" => self.customer_id.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}

impl Filterable for Customer {
    fn field(&self, field: &str) -> Option<Cow<'_, str>> {
        match field {
            "name" => Some(Cow::Borrowed(&self.name)),
            "segment" => Some(Cow::Borrowed(self.segment.as_str())),
            "email" => self.email.as_deref().map(Cow::Borrowed),
            "phone" => self.phone.as_deref().map(Cow::Borrowed),
            _ => None,
        }
    }
}

pub fn matches<T: Filterable>(record: &T, filters: &FilterSpec) -> bool {
    filters
        .active()
        .all(|(field, expected)| record.field(field).is_some_and(|actual| actual == expected))
}

/// Order-preserving subsequence of `items` matching every active constraint.
pub fn filter_items<T: Filterable + Clone>(items: &[T], filters: &FilterSpec) -> Vec<T> {
    items
        .iter()
        .filter(|item| matches(*item, filters))
        .cloned()
        .collect()
}
