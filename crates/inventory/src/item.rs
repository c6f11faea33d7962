use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId};

use crate::validation::{self, double_option};

/// Catalog classification of an inventory item.
///
/// Legacy wire names (`PRODUCTO_SIMPLE`, `PAQUETE_FIJO`, `COMBO_MIXTO`) are
/// accepted on input; output always uses the canonical names.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    #[default]
    #[serde(alias = "PRODUCTO_SIMPLE")]
    Simple,
    #[serde(alias = "PAQUETE_FIJO")]
    FixedPackage,
    #[serde(alias = "COMBO_MIXTO")]
    MixedCombo,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Simple => "SIMPLE",
            ItemType::FixedPackage => "FIXED_PACKAGE",
            ItemType::MixedCombo => "MIXED_COMBO",
        }
    }
}

/// Stored inventory record (tenant-scoped by the store key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub warehouse: String,
    pub status: String,
    pub stock: i64,
    pub min_stock_threshold: i64,
    pub rotation_rate: Option<f64>,
    pub unit_price: Option<f64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub item_type: ItemType,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Urgency score: threshold minus current stock. Higher is more urgent.
    pub fn criticality(&self) -> i64 {
        self.min_stock_threshold - self.stock
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock_threshold
    }

    /// Apply a validated patch, returning the updated record.
    pub fn patched(&self, patch: InventoryItemPatch, now: DateTime<Utc>) -> InventoryItem {
        let mut next = self.clone();
        if let Some(sku) = patch.sku {
            next.sku = sku.trim().to_string();
        }
        if let Some(name) = patch.name {
            next.name = name;
        }
        if let Some(category) = patch.category {
            next.category = category;
        }
        if let Some(warehouse) = patch.warehouse {
            next.warehouse = warehouse;
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(stock) = patch.stock {
            next.stock = stock;
        }
        if let Some(threshold) = patch.min_stock_threshold {
            next.min_stock_threshold = threshold;
        }
        if let Some(rotation_rate) = patch.rotation_rate {
            next.rotation_rate = rotation_rate;
        }
        if let Some(unit_price) = patch.unit_price {
            next.unit_price = unit_price;
        }
        if let Some(image_url) = patch.image_url {
            next.image_url = image_url;
        }
        if let Some(item_type) = patch.item_type {
            next.item_type = item_type;
        }
        next.updated_at = now;
        next
    }
}

impl Entity for InventoryItem {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command payload: create an inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub warehouse: String,
    pub status: String,
    pub stock: i64,
    pub min_stock_threshold: i64,
    #[serde(default)]
    pub rotation_rate: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub item_type: ItemType,
}

impl NewInventoryItem {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "sku", &self.sku);
        validation::require_text(&mut errors, "name", &self.name);
        validation::require_text(&mut errors, "category", &self.category);
        validation::require_text(&mut errors, "warehouse", &self.warehouse);
        validation::require_text(&mut errors, "status", &self.status);
        validation::non_negative(&mut errors, "stock", self.stock);
        validation::non_negative(&mut errors, "min_stock_threshold", self.min_stock_threshold);
        if let Some(rate) = self.rotation_rate {
            validation::finite(&mut errors, "rotation_rate", rate);
        }
        if let Some(price) = self.unit_price {
            validation::non_negative_amount(&mut errors, "unit_price", price);
        }
        validation::image_url(&mut errors, self.image_url.as_deref());
        errors.into_result()
    }

    pub fn into_item(self, id: RecordId, now: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id,
            sku: self.sku.trim().to_string(),
            name: self.name,
            category: self.category,
            warehouse: self.warehouse,
            status: self.status,
            stock: self.stock,
            min_stock_threshold: self.min_stock_threshold,
            rotation_rate: self.rotation_rate,
            unit_price: self.unit_price,
            image_url: self.image_url,
            item_type: self.item_type,
            updated_at: now,
        }
    }
}

/// Command payload: partial update of an inventory item.
///
/// `None` leaves a field untouched; nullable fields use `Some(None)` to clear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryItemPatch {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub warehouse: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stock: Option<i64>,
    #[serde(default)]
    pub min_stock_threshold: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub rotation_rate: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub unit_price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub item_type: Option<ItemType>,
}

impl InventoryItemPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "sku", self.sku.as_deref());
        validation::optional_text(&mut errors, "name", self.name.as_deref());
        validation::optional_text(&mut errors, "category", self.category.as_deref());
        validation::optional_text(&mut errors, "warehouse", self.warehouse.as_deref());
        validation::optional_text(&mut errors, "status", self.status.as_deref());
        if let Some(stock) = self.stock {
            validation::non_negative(&mut errors, "stock", stock);
        }
        if let Some(threshold) = self.min_stock_threshold {
            validation::non_negative(&mut errors, "min_stock_threshold", threshold);
        }
        if let Some(Some(rate)) = self.rotation_rate {
            validation::finite(&mut errors, "rotation_rate", rate);
        }
        if let Some(Some(price)) = self.unit_price {
            validation::non_negative_amount(&mut errors, "unit_price", price);
        }
        if let Some(image_url) = &self.image_url {
            validation::image_url(&mut errors, image_url.as_deref());
        }
        errors.into_result()
    }

    /// Normalized sku this patch would set, if any.
    pub fn sku(&self) -> Option<&str> {
        self.sku.as_deref().map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurocore_core::DomainError;

    fn payload() -> NewInventoryItem {
        NewInventoryItem {
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            category: "tools".to_string(),
            warehouse: "north".to_string(),
            status: "active".to_string(),
            stock: 5,
            min_stock_threshold: 10,
            rotation_rate: Some(1.5),
            unit_price: Some(9.99),
            image_url: None,
            item_type: ItemType::Simple,
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert_eq!(payload().validate(), Ok(()));
    }

    #[test]
    fn invalid_payload_reports_every_field() {
        let mut bad = payload();
        bad.sku = "  ".to_string();
        bad.stock = -1;
        bad.unit_price = Some(-3.0);
        bad.image_url = Some("nope".to_string());

        match bad.validate() {
            Err(DomainError::InvalidFields(errors)) => {
                let fields: Vec<_> = errors.fields().collect();
                assert_eq!(fields, vec!["image_url", "sku", "stock", "unit_price"]);
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn criticality_is_threshold_minus_stock() {
        let item = payload().into_item(RecordId::new(), Utc::now());
        assert_eq!(item.criticality(), 5);
        assert!(item.is_low_stock());
    }

    #[test]
    fn legacy_item_type_names_are_accepted() {
        let parsed: ItemType = serde_json::from_str("\"PAQUETE_FIJO\"").unwrap();
        assert_eq!(parsed, ItemType::FixedPackage);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"FIXED_PACKAGE\"");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{"sku":"A","name":"n","category":"c","warehouse":"w","status":"s",
            "stock":1,"min_stock_threshold":0,"colour":"red"}"#;
        assert!(serde_json::from_str::<NewInventoryItem>(raw).is_err());
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let item = payload().into_item(RecordId::new(), Utc::now());

        let keep: InventoryItemPatch = serde_json::from_str(r#"{"stock":7}"#).unwrap();
        let kept = item.patched(keep, Utc::now());
        assert_eq!(kept.stock, 7);
        assert_eq!(kept.unit_price, Some(9.99));

        let clear: InventoryItemPatch = serde_json::from_str(r#"{"unit_price":null}"#).unwrap();
        assert_eq!(clear.validate(), Ok(()));
        let cleared = item.patched(clear, Utc::now());
        assert_eq!(cleared.unit_price, None);
        assert_eq!(cleared.id, item.id);
    }

    #[test]
    fn patch_validation_applies_same_constraints() {
        let patch = InventoryItemPatch {
            min_stock_threshold: Some(-2),
            name: Some(String::new()),
            ..InventoryItemPatch::default()
        };
        assert!(matches!(patch.validate(), Err(DomainError::InvalidFields(_))));
    }
}
