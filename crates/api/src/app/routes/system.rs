use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::sse::Event as SseEvent};
use serde_json::json;

use crate::app::envelope::{self, ApiResult};
use crate::app::services::{self, AppServices};
use crate::context::{PrincipalContext, TenantContext};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(tenant): Extension<TenantContext>, Extension(principal): Extension<PrincipalContext>) -> ApiResult {
    envelope::ok(json!({
        "tenant_id": tenant.tenant_id().to_string(),
        "user_id": principal.user_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "privileged": principal.is_privileged(),
    }))
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    services::tenant_sse_stream(services, tenant.tenant_id())
}
