use std::sync::Arc;

use axum::extract::Extension;

use neurocore_observability::timed;

use crate::app::envelope::{self, ApiResult};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// GET /user-data
///
/// Everything the dashboard shell loads at start-up, fetched concurrently.
/// Individual source failures are listed under `errors`.
pub async fn get_user_data(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    let data = timed(
        "user_data.fetch",
        services
            .user_data
            .fetch(tenant.tenant_id(), principal.user_id(), principal.roles()),
    )
    .await;
    envelope::ok(data)
}
