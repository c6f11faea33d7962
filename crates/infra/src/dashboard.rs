//! Sales, customers and the supporting dashboard records.
//!
//! Sales and customers are normally synced in from external systems; the
//! ingest calls here validate a record, store it and bump the module's
//! [`SyncStatus`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use neurocore_core::{RecordId, TenantId, UserId};
use neurocore_customers::{Customer, NewCustomer};
use neurocore_events::ServiceCode;
use neurocore_reporting::ModuleCode;
use neurocore_sales::{NewSaleRecord, SaleRecord};

use crate::error::ServiceError;
use crate::records::{Notification, ServiceSubscription, SyncStatus};
use crate::store::{DynStore, InMemoryTenantStore, PostgresTenantStore};

#[derive(Clone)]
pub struct DashboardStores {
    pub sales: DynStore<RecordId, SaleRecord>,
    pub customers: DynStore<RecordId, Customer>,
    pub notifications: DynStore<RecordId, Notification>,
    pub sync_status: DynStore<String, SyncStatus>,
    pub services: DynStore<String, ServiceSubscription>,
}

impl DashboardStores {
    pub fn in_memory() -> Self {
        Self {
            sales: Arc::new(InMemoryTenantStore::new()),
            customers: Arc::new(InMemoryTenantStore::new()),
            notifications: Arc::new(InMemoryTenantStore::new()),
            sync_status: Arc::new(InMemoryTenantStore::new()),
            services: Arc::new(InMemoryTenantStore::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            sales: Arc::new(PostgresTenantStore::new(pool.clone(), "sales_orders")),
            customers: Arc::new(PostgresTenantStore::new(pool.clone(), "customers")),
            notifications: Arc::new(PostgresTenantStore::new(pool.clone(), "notifications")),
            sync_status: Arc::new(PostgresTenantStore::new(pool.clone(), "sync_status")),
            services: Arc::new(PostgresTenantStore::new(pool, "service_subscriptions")),
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    stores: DashboardStores,
}

impl DashboardService {
    pub fn new(stores: DashboardStores) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &DashboardStores {
        &self.stores
    }

    pub async fn sales(&self, tenant_id: TenantId) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self.stores.sales.list(tenant_id).await?)
    }

    pub async fn customers(&self, tenant_id: TenantId) -> Result<Vec<Customer>, ServiceError> {
        Ok(self.stores.customers.list(tenant_id).await?)
    }

    pub async fn ingest_sale(
        &self,
        tenant_id: TenantId,
        payload: NewSaleRecord,
        now: DateTime<Utc>,
    ) -> Result<SaleRecord, ServiceError> {
        payload.validate()?;
        let sale = payload.into_record(RecordId::new());
        self.stores.sales.upsert(tenant_id, sale.id, sale.clone()).await?;
        self.mark_synced(tenant_id, ModuleCode::Sales, now).await?;
        tracing::info!(tenant_id = %tenant_id, sale_id = %sale.id, channel = %sale.channel, "sale ingested");
        Ok(sale)
    }

    pub async fn ingest_customer(
        &self,
        tenant_id: TenantId,
        payload: NewCustomer,
        now: DateTime<Utc>,
    ) -> Result<Customer, ServiceError> {
        payload.validate()?;
        let customer = payload.into_customer(RecordId::new());
        self.stores
            .customers
            .upsert(tenant_id, customer.id, customer.clone())
            .await?;
        self.mark_synced(tenant_id, ModuleCode::Customers, now).await?;
        tracing::info!(tenant_id = %tenant_id, customer_id = %customer.id, "customer ingested");
        Ok(customer)
    }

    async fn mark_synced(&self, tenant_id: TenantId, module: ModuleCode, now: DateTime<Utc>) -> Result<(), ServiceError> {
        let status = SyncStatus {
            module_code: module.as_str().to_string(),
            last_sync_at: Some(now),
        };
        self.stores
            .sync_status
            .upsert(tenant_id, status.module_code.clone(), status)
            .await?;
        Ok(())
    }

    /// Services the user currently has access to.
    pub async fn active_services(&self, tenant_id: TenantId, user_id: UserId) -> Result<Vec<ServiceCode>, ServiceError> {
        Ok(self
            .stores
            .services
            .list(tenant_id)
            .await?
            .into_iter()
            .filter(|s| s.user_id == user_id && s.active)
            .map(|s| s.service_code)
            .collect())
    }

    pub async fn set_subscription(
        &self,
        tenant_id: TenantId,
        subscription: ServiceSubscription,
    ) -> Result<ServiceSubscription, ServiceError> {
        let key = ServiceSubscription::key(subscription.user_id, subscription.service_code);
        self.stores
            .services
            .upsert(tenant_id, key, subscription.clone())
            .await?;
        tracing::info!(
            tenant_id = %tenant_id,
            user_id = %subscription.user_id,
            service = subscription.service_code.as_str(),
            active = subscription.active,
            "service subscription set"
        );
        Ok(subscription)
    }
}
