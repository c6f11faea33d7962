use std::sync::Arc;

use axum::{
    Router,
    extract::{Extension, Query},
    response::Response,
    routing::get,
};
use chrono::Utc;

use neurocore_analytics::{FilterSpec, SalesFilter, filter_sales, previous_period_series, sales_kpis, time_series};
use neurocore_auth::Permission;
use neurocore_reporting::{ModuleCode, SALES_COLUMNS, redact_sale};
use neurocore_sales::NewSaleRecord;

use crate::app::dto::SalesViewResponse;
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

/// GET /neurocore/sales?start&end&channel
///
/// Rows and series follow the filters; KPIs cover every sale.
pub async fn view(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filters): Query<FilterSpec>,
) -> ApiResult {
    require(&tenant, &principal, Permission::SALES_READ)?;
    let sales = services.dashboard.sales(tenant.tenant_id()).await?;
    let offset = services.report_offset;
    let filters = filters.restricted_to(&SalesFilter::KEYS);

    let privileged = principal.is_privileged();
    let rows = filter_sales(&sales, &filters, offset)
        .iter()
        .map(|sale| redact_sale(sale, privileged))
        .collect();

    envelope::ok(SalesViewResponse {
        rows,
        kpis: sales_kpis(&sales, Utc::now().with_timezone(&offset)),
        series: time_series(&sales, &filters, offset),
        previous_series: previous_period_series(
            &sales,
            filters.get("start"),
            filters.get("end"),
            filters.get("channel"),
            offset,
        ),
    })
}

pub async fn export(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(filters): Query<FilterSpec>,
) -> Result<Response, ApiError> {
    require(&tenant, &principal, Permission::SALES_EXPORT)?;
    let sales = services.dashboard.sales(tenant.tenant_id()).await?;
    let filters = filters.restricted_to(&SalesFilter::KEYS);

    let rows = filter_sales(&sales, &filters, services.report_offset);
    let prepared = services.exports.prepare(
        ModuleCode::Sales,
        &rows,
        SALES_COLUMNS,
        &filters,
        principal.user_id(),
        Utc::now(),
    )?;
    Ok(deliver_export(services.clone(), tenant.tenant_id(), prepared))
}

/// POST /neurocore/sales: channel sync ingestion (admin only).
pub async fn ingest(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Payload(body): Payload<NewSaleRecord>,
) -> ApiResult {
    require(&tenant, &principal, Permission::SALES_WRITE)?;
    let sale = services
        .dashboard
        .ingest_sale(tenant.tenant_id(), body, Utc::now())
        .await?;
    envelope::created(sale)
}
