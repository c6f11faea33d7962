//! Packages and combos. Every route here requires the `NC_INVENTORY_COMBOS`
//! feature flag for the caller's tenant.

use std::sync::Arc;

use axum::{
    Router,
    extract::Extension,
    routing::{get, put},
};

use neurocore_auth::Permission;
use neurocore_events::ChangeKind;
use neurocore_infra::NC_INVENTORY_COMBOS;
use neurocore_inventory::{ComboHeaderPatch, NewCombo, NewPackage, PackagePatch};

use crate::app::envelope::{self, ApiResult};
use crate::app::errors::ApiError;
use crate::app::extract::{Payload, RecordPath};
use crate::app::routes::announce;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

const PACKAGES: &str = "inventory_packages";
const COMBOS: &str = "combo_headers";

pub fn router() -> Router {
    Router::new()
        .route("/packages", get(list_packages).post(create_package))
        .route("/packages/:id", put(update_package).delete(delete_package))
        .route("/combos", get(list_combos).post(create_combo))
        .route("/combos/:id", put(update_combo).delete(delete_combo))
}

async fn gate(
    services: &AppServices,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    permission: &'static str,
) -> Result<(), ApiError> {
    require(tenant, principal, permission)?;
    if !services.flags.is_enabled(tenant.tenant_id(), NC_INVENTORY_COMBOS).await? {
        return Err(ApiError::FeatureDisabled(NC_INVENTORY_COMBOS));
    }
    Ok(())
}

pub async fn list_packages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_READ).await?;
    envelope::ok(services.catalog.packages(tenant.tenant_id()).await?)
}

pub async fn create_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<NewPackage>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let package = services.catalog.create_package(tenant.tenant_id(), body).await?;
    announce(&services, tenant.tenant_id(), PACKAGES, package.id, ChangeKind::Created);
    envelope::created(package)
}

pub async fn update_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
    Payload(body): Payload<PackagePatch>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let package = services.catalog.update_package(tenant.tenant_id(), id, body).await?;
    announce(&services, tenant.tenant_id(), PACKAGES, id, ChangeKind::Updated);
    envelope::ok(package)
}

pub async fn delete_package(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let package = services.catalog.delete_package(tenant.tenant_id(), id).await?;
    announce(&services, tenant.tenant_id(), PACKAGES, id, ChangeKind::Deleted);
    envelope::ok(package)
}

pub async fn list_combos(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_READ).await?;
    envelope::ok(services.catalog.combos(tenant.tenant_id()).await?)
}

pub async fn create_combo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<NewCombo>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let combo = services.catalog.create_combo(tenant.tenant_id(), body).await?;
    announce(&services, tenant.tenant_id(), COMBOS, combo.header.id, ChangeKind::Created);
    envelope::created(combo)
}

pub async fn update_combo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
    Payload(body): Payload<ComboHeaderPatch>,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let combo = services.catalog.update_combo(tenant.tenant_id(), id, body).await?;
    announce(&services, tenant.tenant_id(), COMBOS, id, ChangeKind::Updated);
    envelope::ok(combo)
}

/// Removes the header and all of its components.
pub async fn delete_combo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    RecordPath(id): RecordPath,
) -> ApiResult {
    gate(&services, &tenant, &principal, Permission::INVENTORY_WRITE).await?;
    let combo = services.catalog.delete_combo(tenant.tenant_id(), id).await?;
    announce(&services, tenant.tenant_id(), COMBOS, id, ChangeKind::Deleted);
    envelope::ok(combo)
}
