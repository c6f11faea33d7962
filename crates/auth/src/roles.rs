use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role identifier used for RBAC.
///
/// Roles are opaque strings as issued by the identity provider. Two of them
/// carry meaning here: the tenant-level client administrator (`Admin Cliente`)
/// and the platform `admin`. Both are privileged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const CLIENT_ADMIN: &'static str = "Admin Cliente";
    pub const PLATFORM_ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn client_admin() -> Self {
        Self::new(Self::CLIENT_ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Privileged roles see unredacted personal data and may manage the tenant.
    pub fn is_privileged(&self) -> bool {
        matches!(self.as_str(), Self::CLIENT_ADMIN | Self::PLATFORM_ADMIN)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether any of the given roles is privileged.
pub fn any_privileged(roles: &[Role]) -> bool {
    roles.iter().any(Role::is_privileged)
}

/// Role → permission policy.
///
/// Privileged roles get the wildcard. Every other authenticated role gets the
/// day-to-day dashboard permissions: read views, maintain the catalog, export
/// inventory and sales.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    if any_privileged(roles) {
        return vec![Permission::new(Permission::WILDCARD)];
    }
    if roles.is_empty() {
        return Vec::new();
    }

    [
        Permission::INVENTORY_READ,
        Permission::INVENTORY_WRITE,
        Permission::INVENTORY_EXPORT,
        Permission::SALES_READ,
        Permission::SALES_EXPORT,
        Permission::CUSTOMERS_READ,
        Permission::AUDIT_WRITE,
    ]
    .into_iter()
    .map(Permission::new)
    .collect()
}
