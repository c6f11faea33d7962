use std::sync::Arc;

use axum::{
    Router,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;

use neurocore_core::{RecordId, TenantId};
use neurocore_events::{ChangeKind, ChannelMessage};
use neurocore_reporting::{ExportFile, PreparedExport};

use crate::app::services::AppServices;

pub mod audit;
pub mod bundles;
pub mod customers;
pub mod features;
pub mod inventory;
pub mod sales;
pub mod service_channel;
pub mod system;
pub mod user_data;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .route("/user-data", get(user_data::get_user_data))
        .nest("/services", service_channel::router())
        .nest("/audit", audit::router())
        .nest("/neurocore", neurocore_router())
}

fn neurocore_router() -> Router {
    Router::new()
        .nest("/inventory", inventory::router().merge(bundles::router()))
        .nest("/sales", sales::router())
        .nest("/customers", customers::router())
        .nest("/features", features::router())
}

/// Tell channel subscribers about a confirmed catalog write.
pub(crate) fn announce(
    services: &AppServices,
    tenant_id: TenantId,
    collection: &str,
    record_id: RecordId,
    change: ChangeKind,
) {
    services.publish(ChannelMessage::CatalogChanged {
        tenant_id,
        collection: collection.to_string(),
        record_id,
        change,
    });
}

/// Hand the audit record to the sink in the background and return the file.
///
/// The audit write never affects the response: a failure is only logged.
pub(crate) fn deliver_export(services: Arc<AppServices>, tenant_id: TenantId, prepared: PreparedExport) -> Response {
    let PreparedExport { file, audit } = prepared;
    let record_count = audit.record_count;
    let module_code = audit.module_code.clone();

    let sink = services.audit.clone();
    tokio::spawn(async move {
        if let Err(e) = sink.record(tenant_id, audit).await {
            tracing::error!(tenant_id = %tenant_id, error = %e, "export audit write failed");
        }
    });

    tracing::info!(
        tenant_id = %tenant_id,
        module_code = %module_code,
        record_count,
        file_name = %file.file_name,
        at = %Utc::now(),
        "export generated"
    );
    file_response(file)
}

fn file_response(file: ExportFile) -> Response {
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.body,
    )
        .into_response()
}
