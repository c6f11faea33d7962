use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId};

use crate::validation::{self, double_option};

/// Combo header. Components live in their own collection keyed by `combo_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboHeader {
    pub id: RecordId,
    pub combo_name: String,
    pub combo_price: f64,
    pub currency: String,
    pub is_active: bool,
    pub image_url: Option<String>,
}

impl ComboHeader {
    pub fn patched(&self, patch: ComboHeaderPatch) -> ComboHeader {
        let mut next = self.clone();
        if let Some(name) = patch.combo_name {
            next.combo_name = name;
        }
        if let Some(price) = patch.combo_price {
            next.combo_price = price;
        }
        if let Some(currency) = patch.currency {
            next.currency = currency;
        }
        if let Some(is_active) = patch.is_active {
            next.is_active = is_active;
        }
        if let Some(image_url) = patch.image_url {
            next.image_url = image_url;
        }
        next
    }
}

impl Entity for ComboHeader {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboComponent {
    pub id: RecordId,
    pub combo_id: RecordId,
    pub component_item_id: RecordId,
    pub component_qty: i64,
    pub consume_stock: bool,
}

impl Entity for ComboComponent {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A header together with its components, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRecord {
    #[serde(flatten)]
    pub header: ComboHeader,
    pub components: Vec<ComboComponent>,
}

impl ComboRecord {
    /// Zero components is allowed but the combo is not sellable as-is.
    pub fn is_complete(&self) -> bool {
        !self.components.is_empty()
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComboComponent {
    pub component_item_id: RecordId,
    pub component_qty: i64,
    #[serde(default = "default_true")]
    pub consume_stock: bool,
}

impl NewComboComponent {
    fn collect_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        validation::positive(&mut errors, "component_qty", self.component_qty);
        errors
    }

    pub fn into_component(self, id: RecordId, combo_id: RecordId) -> ComboComponent {
        ComboComponent {
            id,
            combo_id,
            component_item_id: self.component_item_id,
            component_qty: self.component_qty,
            consume_stock: self.consume_stock,
        }
    }
}

/// Command payload: create a combo header with its initial components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewCombo {
    pub combo_name: String,
    pub combo_price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub components: Vec<NewComboComponent>,
}

impl NewCombo {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::require_text(&mut errors, "combo_name", &self.combo_name);
        validation::non_negative_amount(&mut errors, "combo_price", self.combo_price);
        validation::require_text(&mut errors, "currency", &self.currency);
        validation::image_url(&mut errors, self.image_url.as_deref());
        for (idx, component) in self.components.iter().enumerate() {
            errors.merge_prefixed(&format!("components[{idx}]."), component.collect_errors());
        }
        errors.into_result()
    }

    /// Split into a header and its components, all sharing the new combo id.
    pub fn into_record(self, combo_id: RecordId) -> ComboRecord {
        let header = ComboHeader {
            id: combo_id,
            combo_name: self.combo_name,
            combo_price: self.combo_price,
            currency: self.currency,
            is_active: self.is_active,
            image_url: self.image_url,
        };
        let components = self
            .components
            .into_iter()
            .map(|c| c.into_component(RecordId::new(), combo_id))
            .collect();
        ComboRecord { header, components }
    }
}

/// Command payload: partial update of a combo.
///
/// When `components` is present it replaces the full component set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComboHeaderPatch {
    #[serde(default)]
    pub combo_name: Option<String>,
    #[serde(default)]
    pub combo_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default)]
    pub components: Option<Vec<NewComboComponent>>,
}

impl ComboHeaderPatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::optional_text(&mut errors, "combo_name", self.combo_name.as_deref());
        if let Some(price) = self.combo_price {
            validation::non_negative_amount(&mut errors, "combo_price", price);
        }
        validation::optional_text(&mut errors, "currency", self.currency.as_deref());
        if let Some(image_url) = &self.image_url {
            validation::image_url(&mut errors, image_url.as_deref());
        }
        for (idx, component) in self.components.iter().flatten().enumerate() {
            errors.merge_prefixed(&format!("components[{idx}]."), component.collect_errors());
        }
        errors.into_result()
    }
}
