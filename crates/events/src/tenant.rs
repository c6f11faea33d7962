use neurocore_core::TenantId;

/// Messages that belong to exactly one tenant.
///
/// Stream bridges use this to drop messages for other tenants before they
/// reach a client.
pub trait TenantScoped {
    fn tenant_id(&self) -> TenantId;
}
