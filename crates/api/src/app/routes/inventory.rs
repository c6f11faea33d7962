use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    response::Response,
    routing::{get, put},
};
use chrono::Utc;

use neurocore_analytics::{FilterSpec, filter_items, summary_kpis, with_criticality};
use neurocore_auth::Permission;
use neurocore_events::ChangeKind;
use neurocore_inventory::NewInventoryAlert;
use neurocore_reporting::{INVENTORY_COLUMNS, ModuleCode};

use crate::app::dto::{CreateItemRequest, InventoryViewResponse, SavedItemResponse, UpdateItemRequest};
use crate::app::envelope::{self, ApiResult};
use crate::app::errors::ApiError;
use crate::app::extract::{Payload, RecordPath};
use crate::app::routes::{announce, deliver_export};
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

/// Filter keys understood by the inventory view and export.
const VIEW_FILTERS: &[&str] = &["category", "warehouse", "status"];
const ITEMS: &str = "inventory_items";

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", put(update_item).delete(delete_item))
        .route("/view", get(view))
        .route("/export", get(export))
        .route("/alerts", get(list_alerts).post(create_alert))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_READ)?;
    let items = services.catalog.items(tenant.tenant_id()).await?;
    envelope::ok(items.as_slice())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<CreateItemRequest>,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_WRITE)?;
    let image = body.image.map(|i| i.decode()).transpose()?;

    let saved = services
        .catalog
        .create_item(tenant.tenant_id(), body.item, image, Utc::now())
        .await?;
    announce(&services, tenant.tenant_id(), ITEMS, saved.record.id, ChangeKind::Created);
    envelope::created(SavedItemResponse::from(saved))
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
    Payload(body): Payload<UpdateItemRequest>,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_WRITE)?;
    let image = body.image.map(|i| i.decode()).transpose()?;

    let saved = services
        .catalog
        .update_item(tenant.tenant_id(), id, body.item, image, Utc::now())
        .await?;
    announce(&services, tenant.tenant_id(), ITEMS, id, ChangeKind::Updated);
    envelope::ok(SavedItemResponse::from(saved))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_WRITE)?;
    let removed = services.catalog.delete_item(tenant.tenant_id(), id).await?;
    announce(&services, tenant.tenant_id(), ITEMS, id, ChangeKind::Deleted);
    envelope::ok(removed)
}

/// GET /neurocore/inventory/view?category&warehouse&status
///
/// Filtered items in criticality order. KPIs cover the whole catalog.
pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filters): Query<FilterSpec>,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_READ)?;
    let items = services.catalog.items(tenant.tenant_id()).await?;
    let filters = filters.restricted_to(VIEW_FILTERS);

    let filtered = filter_items(items.as_slice(), &filters);
    envelope::ok(InventoryViewResponse {
        items: with_criticality(&filtered),
        kpis: summary_kpis(items.as_slice()),
    })
}

pub async fn export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filters): Query<FilterSpec>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, Permission::INVENTORY_EXPORT)?;
    let items = services.catalog.items(tenant.tenant_id()).await?;
    let filters = filters.restricted_to(VIEW_FILTERS);

    let rows = with_criticality(&filter_items(items.as_slice(), &filters));
    let prepared = services.exports.prepare(
        ModuleCode::Inventory,
        &rows,
        INVENTORY_COLUMNS,
        &filters,
        principal.user_id(),
        Utc::now(),
    )?;
    Ok(deliver_export(services.clone(), tenant.tenant_id(), prepared))
}

pub async fn list_alerts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    require(&tenant, &principal, Permission::INVENTORY_READ)?;
    envelope::ok(services.catalog.alerts(tenant.tenant_id()).await?)
}

/// POST /neurocore/inventory/alerts (admin only)
pub async fn create_alert(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<NewInventoryAlert>,
) -> ApiResult {
    require(&tenant, &principal, Permission::ALERTS_CREATE)?;
    let alert = services
        .catalog
        .create_alert(tenant.tenant_id(), body, principal.user_id(), Utc::now())
        .await?;
    envelope::created(alert)
}
