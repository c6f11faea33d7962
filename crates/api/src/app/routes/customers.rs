use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    response::Response,
    routing::get,
};
use chrono::Utc;

use neurocore_analytics::{FilterSpec, customer_kpis, filter_customers, segment_counts};
use neurocore_auth::Permission;
use neurocore_customers::NewCustomer;
use neurocore_reporting::{CUSTOMER_COLUMNS, ModuleCode, redact_customer};

use crate::app::dto::{CustomersViewResponse, SegmentQuery};
use crate::app::envelope::{self, ApiResult};
use crate::app::errors::ApiError;
use crate::app::extract::Payload;
use crate::app::routes::deliver_export;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/", get(view).post(ingest))
        .route("/export", get(export))
}

/// GET /neurocore/customers?segment
///
/// Rows follow the segment filter; counts and KPIs cover every customer.
pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<SegmentQuery>,
) -> ApiResult {
    require(&tenant, &principal, Permission::CUSTOMERS_READ)?;
    let customers = services.dashboard.customers(tenant.tenant_id()).await?;

    let privileged = principal.is_privileged();
    let rows = filter_customers(&customers, query.segment.as_deref())
        .iter()
        .map(|c| redact_customer(c, privileged))
        .collect();

    envelope::ok(CustomersViewResponse {
        rows,
        segments: segment_counts(&customers),
        kpis: customer_kpis(&customers),
    })
}

/// GET /neurocore/customers/export?segment (admin only; rows are not redacted)
pub async fn export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<SegmentQuery>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, Permission::CUSTOMERS_EXPORT)?;
    let customers = services.dashboard.customers(tenant.tenant_id()).await?;

    let segment = query.segment.unwrap_or_default();
    let rows = filter_customers(&customers, Some(segment.as_str()));
    let filters = FilterSpec::new().with("segment", segment);
    let prepared = services.exports.prepare(
        ModuleCode::Customers,
        &rows,
        CUSTOMER_COLUMNS,
        &filters,
        principal.user_id(),
        Utc::now(),
    )?;
    Ok(deliver_export(services.clone(), tenant.tenant_id(), prepared))
}

/// POST /neurocore/customers: CRM sync ingestion (admin only).
pub async fn ingest(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<NewCustomer>,
) -> ApiResult {
    require(&tenant, &principal, Permission::CUSTOMERS_WRITE)?;
    let customer = services
        .dashboard
        .ingest_customer(tenant.tenant_id(), body, Utc::now())
        .await?;
    envelope::created(customer)
}
