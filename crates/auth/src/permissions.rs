use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "inventory.read").
/// A special wildcard permission `"*"` can be used by policy layers to indicate
/// "allow all" without hardcoding domain permissions into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: &'static str = "*";
    pub const INVENTORY_READ: &'static str = "inventory.read";
    pub const INVENTORY_WRITE: &'static str = "inventory.write";
    pub const INVENTORY_EXPORT: &'static str = "inventory.export";
    pub const ALERTS_CREATE: &'static str = "inventory.alerts.create";
    pub const SALES_READ: &'static str = "sales.read";
    pub const SALES_EXPORT: &'static str = "sales.export";
    pub const SALES_WRITE: &'static str = "sales.write";
    pub const CUSTOMERS_READ: &'static str = "customers.read";
    pub const CUSTOMERS_EXPORT: &'static str = "customers.export";
    pub const CUSTOMERS_WRITE: &'static str = "customers.write";
    pub const AUDIT_WRITE: &'static str = "audit.write";
    pub const FEATURES_MANAGE: &'static str = "features.manage";
    pub const SERVICES_MANAGE: &'static str = "services.manage";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == Self::WILDCARD
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
