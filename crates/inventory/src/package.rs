use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId};

use crate::validation::{self, double_option};

/// A sellable bundle tied to exactly one base inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDefinition {
    pub id: RecordId,
    pub base_item_id: RecordId,
    pub quantity_included: i64,
    pub package_price: f64,
    pub consume_stock: bool,
    pub currency: String,
    pub image_url: Option<String>,
}

impl PackageDefinition {
    pub fn patched(&self, patch: PackagePatch) -> PackageDefinition {
        let mut next = self.clone();
        if let Some(base_item_id) = patch.base_item_id {
            next.base_item_id = base_item_id;
        }
        if let Some(quantity) = patch.quantity_included {
            next.quantity_included = quantity;
        }
        if let Some(price) = patch.package_price {
            next.package_price = price;
        }
        if let Some(consume_stock) = patch.consume_stock {
            next.consume_stock = consume_stock;
        }
        if let Some(currency) = patch.currency {
            next.currency = currency;
        }
        if let Some(image_url) = patch.image_url {
            next.image_url = image_url;
        }
        next
    }
}

impl Entity for PackageDefinition {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

/// Command payload: create a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPackage {
    pub base_item_id: RecordId,
    pub quantity_included: i64,
    pub package_price: f64,
    #[serde(default = "default_true")]
    pub consume_stock: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewPackage {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::positive(&mut errors, "quantity_included", self.quantity_included);
        validation::non_negative_amount(&mut errors, "package_price", self.package_price);
        validation::require_text(&mut errors, "currency", &self.currency);
        validation::image_url(&mut errors, self.image_url.as_deref());
        errors.into_result()
    }

    pub fn into_package(self, id: RecordId) -> PackageDefinition {
        PackageDefinition {
            id,
            base_item_id: self.base_item_id,
            quantity_included: self.quantity_included,
            package_price: self.package_price,
            consume_stock: self.consume_stock,
            currency: self.currency,
            image_url: self.image_url,
        }
    }
}

/// Command payload: partial update of a package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagePatch {
    #[serde(default)]
    pub base_item_id: Option<RecordId>,
    #[serde(default)]
    pub quantity_included: Option<i64>,
    #[serde(default)]
    pub package_price: Option<f64>,
    #[serde(default)]
    pub consume_stock: Option<bool>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

impl PackagePatch {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if let Some(quantity) = self.quantity_included {
            validation::positive(&mut errors, "quantity_included", quantity);
        }
        if let Some(price) = self.package_price {
            validation::non_negative_amount(&mut errors, "package_price", price);
        }
        validation::optional_text(&mut errors, "currency", self.currency.as_deref());
        if let Some(image_url) = &self.image_url {
            validation::image_url(&mut errors, image_url.as_deref());
        }
        errors.into_result()
    }
}
