use std::sync::Arc;

use axum::{Router, extract::Extension, routing::get};

use neurocore_auth::Permission;
use neurocore_reporting::AuditSubmission;

use crate::app::envelope::{self, ApiResult};
use crate::app::extract::Payload;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new().route("/exports", get(list_exports).post(record_export))
}

/// GET /audit/exports
///
/// Privileged callers see the whole tenant log, everyone else their own entries.
pub async fn list_exports(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    let mut entries = services.audit.list(tenant.tenant_id()).await?;
    if !principal.is_privileged() {
        entries.retain(|e| e.user_id == principal.user_id());
    }
    envelope::ok(entries)
}

/// POST /audit/exports: record an export produced client-side.
pub async fn record_export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<AuditSubmission>,
) -> ApiResult {
    require(&tenant, &principal, Permission::AUDIT_WRITE)?;
    body.validate()?;
    let entry = services
        .audit
        .record(tenant.tenant_id(), body.into_audit(principal.user_id()))
        .await?;
    envelope::created(entry)
}
