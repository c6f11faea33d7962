//! API-side authorization guard.
//!
//! Enforced at the route boundary before any store is touched, keeping the
//! domain crates and infra auth-agnostic.

use neurocore_auth::{AuthzError, CommandAuthorization, Permission, Principal, TenantMembership, authorize};

use crate::context::{PrincipalContext, TenantContext};

/// Permissions a route needs.
pub struct Requires(Vec<Permission>);

impl Requires {
    pub fn one(permission: &'static str) -> Self {
        Self(vec![Permission::new(permission)])
    }
}

impl CommandAuthorization for Requires {
    fn required_permissions(&self) -> &[Permission] {
        &self.0
    }
}

/// Check authorization for an operation in the current request context.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = Principal {
        user_id: principal.user_id(),
        active_tenant_id: tenant.tenant_id(),
        membership: TenantMembership::from_roles(tenant.tenant_id(), principal.roles().to_vec()),
    };

    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }

    Ok(())
}

/// Shorthand for a single required permission.
pub fn require(tenant: &TenantContext, principal: &PrincipalContext, permission: &'static str) -> Result<(), AuthzError> {
    authorize_command(tenant, principal, &Requires::one(permission))
}
