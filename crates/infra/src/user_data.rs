//! Batched read of everything the dashboard shell needs for one user.

use std::sync::Arc;

use serde::Serialize;

use neurocore_auth::Role;
use neurocore_core::{TenantId, UserId};
use neurocore_customers::Customer;
use neurocore_events::ServiceCode;
use neurocore_inventory::{InventoryAlert, InventoryItem};
use neurocore_reporting::{AuditSink, ExportAuditEntry};
use neurocore_sales::SaleRecord;

use crate::catalog::CatalogStores;
use crate::dashboard::DashboardStores;
use crate::records::{Notification, SyncStatus};

#[derive(Debug, Clone, Serialize)]
pub struct RoleEntry {
    pub role: Role,
}

/// Result of [`UserDataFetcher::fetch`]. A failed read leaves its list empty
/// and adds one message to `errors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub roles: Vec<RoleEntry>,
    pub services: Vec<ServiceCode>,
    pub exports: Vec<ExportAuditEntry>,
    pub notifications: Vec<Notification>,
    pub inventory_alerts: Vec<InventoryAlert>,
    pub sync_status: Vec<SyncStatus>,
    pub inventory_items: Vec<InventoryItem>,
    pub sales_orders: Vec<SaleRecord>,
    pub customers: Vec<Customer>,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct UserDataFetcher {
    catalog: CatalogStores,
    dashboard: DashboardStores,
    audit: Arc<dyn AuditSink>,
}

impl UserDataFetcher {
    pub fn new(catalog: CatalogStores, dashboard: DashboardStores, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            catalog,
            dashboard,
            audit,
        }
    }

    /// Issue every read concurrently and collect per-source failures.
    pub async fn fetch(&self, tenant_id: TenantId, user_id: UserId, roles: &[Role]) -> UserData {
        let (services, exports, notifications, alerts, sync_status, items, sales, customers) = tokio::join!(
            self.dashboard.services.list(tenant_id),
            self.audit.list(tenant_id),
            self.dashboard.notifications.list(tenant_id),
            self.catalog.alerts.list(tenant_id),
            self.dashboard.sync_status.list(tenant_id),
            self.catalog.items.list(tenant_id),
            self.dashboard.sales.list(tenant_id),
            self.dashboard.customers.list(tenant_id),
        );

        let mut errors = Vec::new();
        let mut data = UserData {
            roles: roles.iter().cloned().map(|role| RoleEntry { role }).collect(),
            ..UserData::default()
        };

        data.services = collect(&mut errors, "services", services)
            .into_iter()
            .filter(|s| s.user_id == user_id && s.active)
            .map(|s| s.service_code)
            .collect();
        data.exports = collect(&mut errors, "exports", exports)
            .into_iter()
            .filter(|e| e.user_id == user_id)
            .collect();
        data.notifications = collect(&mut errors, "notifications", notifications)
            .into_iter()
            .filter(|n| n.user_id == user_id)
            .collect();
        data.inventory_alerts = collect(&mut errors, "inventory_alerts", alerts);
        data.sync_status = collect(&mut errors, "sync_status", sync_status);
        data.inventory_items = collect(&mut errors, "inventory_items", items);
        data.sales_orders = collect(&mut errors, "sales_orders", sales);
        data.customers = collect(&mut errors, "customers", customers);
        data.errors = errors;

        if !data.errors.is_empty() {
            tracing::warn!(tenant_id = %tenant_id, user_id = %user_id, failed = data.errors.len(), "user data partially loaded");
        }
        data
    }
}

fn collect<T, E: std::fmt::Display>(errors: &mut Vec<String>, source: &str, result: Result<Vec<T>, E>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        errors.push(format!("{source}: {e}"));
        Vec::new()
    })
}
