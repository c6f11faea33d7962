use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{get, put},
};

use neurocore_auth::Permission;

use crate::app::dto::SetFlagRequest;
use crate::app::envelope::{self, ApiResult};
use crate::app::extract::Payload;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_flags))
        .route("/:code", put(set_flag))
}

/// GET /neurocore/features: `{code: enabled}` for the caller's tenant.
pub async fn list_flags(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> ApiResult {
    envelope::ok(services.flags.all(tenant.tenant_id()).await?)
}

pub async fn set_flag(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
    Payload(body): Payload<SetFlagRequest>,
) -> ApiResult {
    require(&tenant, &principal, Permission::FEATURES_MANAGE)?;
    let flag = services.flags.set(tenant.tenant_id(), &code, body.enabled).await?;
    envelope::ok(flag)
}
