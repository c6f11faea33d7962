//! Infrastructure wiring shared by every handler.

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use chrono::FixedOffset;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use neurocore_core::TenantId;
use neurocore_events::{ChannelMessage, EventBus, InMemoryEventBus, TenantScoped};
use neurocore_infra::{
    CatalogService, CatalogStores, DashboardService, DashboardStores, FeatureFlags, InMemoryImageStore,
    PostgresTenantStore, StoreAuditLog, StoreError, UserDataFetcher, migrate,
};
use neurocore_reporting::{AuditSink, ExportPipeline};

use crate::config::ApiConfig;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("could not connect to the database: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] StoreError),
}

/// Channel message as delivered to SSE subscribers.
#[derive(Debug, Clone)]
pub struct RealtimeMessage {
    pub tenant_id: TenantId,
    pub topic: &'static str,
    pub payload: serde_json::Value,
}

pub struct AppServices {
    pub catalog: CatalogService,
    pub dashboard: DashboardService,
    pub flags: FeatureFlags,
    pub audit: Arc<dyn AuditSink>,
    pub user_data: UserDataFetcher,
    pub exports: ExportPipeline,
    pub report_offset: FixedOffset,
    bus: Arc<InMemoryEventBus<ChannelMessage>>,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

pub async fn build_services(config: &ApiConfig) -> Result<AppServices, ServicesError> {
    let (catalog_stores, dashboard_stores, flags, audit) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            migrate(&pool).await?;
            tracing::info!("using postgres-backed stores");
            (
                CatalogStores::postgres(pool.clone()),
                DashboardStores::postgres(pool.clone()),
                FeatureFlags::new(Arc::new(PostgresTenantStore::new(pool.clone(), "feature_flags"))),
                StoreAuditLog::new(Arc::new(PostgresTenantStore::new(pool, "exports_audit"))),
            )
        }
        None => {
            tracing::info!("using in-memory stores");
            (
                CatalogStores::in_memory(),
                DashboardStores::in_memory(),
                FeatureFlags::in_memory(),
                StoreAuditLog::in_memory(),
            )
        }
    };
    let audit: Arc<dyn AuditSink> = Arc::new(audit);
    let images = Arc::new(InMemoryImageStore::new(config.image_base_url.clone()));

    let bus: Arc<InMemoryEventBus<ChannelMessage>> = Arc::new(InMemoryEventBus::new());
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    // Bus -> SSE bridge. Ends when the bus (and with it every sender) is dropped.
    {
        let sub = bus.subscribe();
        let realtime_tx = realtime_tx.clone();
        tokio::task::spawn_blocking(move || {
            while let Ok(message) = sub.recv() {
                let payload = match serde_json::to_value(&message) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping unencodable channel message");
                        continue;
                    }
                };
                // Lossy: no subscribers simply means nobody is listening.
                let _ = realtime_tx.send(RealtimeMessage {
                    tenant_id: message.tenant_id(),
                    topic: message.topic(),
                    payload,
                });
            }
        });
    }

    Ok(AppServices {
        catalog: CatalogService::new(catalog_stores.clone(), images),
        dashboard: DashboardService::new(dashboard_stores.clone()),
        flags,
        audit: audit.clone(),
        user_data: UserDataFetcher::new(catalog_stores, dashboard_stores, audit),
        exports: ExportPipeline::new(config.export_limit),
        report_offset: config.report_offset,
        bus,
        realtime_tx,
    })
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }

    /// Publish on the channel. Failures are logged; the caller's write already happened.
    pub fn publish(&self, message: ChannelMessage) {
        let topic = message.topic();
        if let Err(e) = self.bus.publish(message) {
            tracing::warn!(topic, error = %e, "channel publish failed");
        }
    }
}

pub fn tenant_sse_stream(
    services: Arc<AppServices>,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(m) if m.tenant_id == tenant_id => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
