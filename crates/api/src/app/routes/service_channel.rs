//! Service access and the "selected service" channel.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Path},
    routing::{get, post, put},
};

use neurocore_auth::Permission;
use neurocore_events::{ChannelMessage, ServiceCode};
use neurocore_infra::ServiceSubscription;

use crate::app::dto::{SelectServiceRequest, SubscriptionRequest};
use crate::app::envelope::{self, ApiResult};
use crate::app::errors::ApiError;
use crate::app::extract::Payload;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_services))
        .route("/selected", post(select_service))
        .route("/:code/subscriptions", put(set_subscription))
}

/// GET /services: service codes the caller may use.
pub async fn list_services(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    let active = services
        .dashboard
        .active_services(tenant.tenant_id(), principal.user_id())
        .await?;
    envelope::ok(active)
}

/// POST /services/selected
///
/// Publishes `service.selected` so every open session of the user follows.
pub async fn select_service(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<SelectServiceRequest>,
) -> ApiResult {
    let active = services
        .dashboard
        .active_services(tenant.tenant_id(), principal.user_id())
        .await?;
    if !active.contains(&body.service) {
        return Err(ApiError::Forbidden(format!(
            "no active subscription to {}",
            body.service.as_str()
        )));
    }

    let message = ChannelMessage::ServiceSelected {
        tenant_id: tenant.tenant_id(),
        user_id: principal.user_id(),
        service: body.service,
    };
    services.publish(message.clone());
    envelope::ok(message)
}

/// PUT /services/:code/subscriptions (admin only)
pub async fn set_subscription(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(code): Path<String>,
    Payload(body): Payload<SubscriptionRequest>,
) -> ApiResult {
    require(&tenant, &principal, Permission::SERVICES_MANAGE)?;
    let service_code = ServiceCode::parse(&code).ok_or(ApiError::NotFound)?;
    let subscription = services
        .dashboard
        .set_subscription(
            tenant.tenant_id(),
            ServiceSubscription {
                user_id: body.user_id,
                service_code,
                active: body.active,
            },
        )
        .await?;
    envelope::ok(subscription)
}
