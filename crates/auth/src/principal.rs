use serde::{Deserialize, Serialize};

use neurocore_core::TenantId;

/// A principal's membership in a tenant.
///
/// This is an authorization boundary object: it states *which tenant* the
/// principal is acting within and which roles/permissions are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<crate::Role>,
    pub permissions: Vec<crate::Permission>,
}

impl TenantMembership {
    /// Membership whose permissions are derived from its roles.
    pub fn from_roles(tenant_id: TenantId, roles: Vec<crate::Role>) -> Self {
        let permissions = crate::roles::permissions_for_roles(&roles);
        Self {
            tenant_id,
            roles,
            permissions,
        }
    }
}
