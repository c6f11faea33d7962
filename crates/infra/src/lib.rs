//! Infrastructure layer: tenant-isolated storage and the services built on it.

pub mod audit_log;
pub mod catalog;
pub mod dashboard;
pub mod error;
pub mod feature_flags;
pub mod images;
pub mod records;
pub mod store;
pub mod user_data;

pub use audit_log::StoreAuditLog;
pub use catalog::{CatalogService, CatalogStores, Saved};
pub use dashboard::{DashboardService, DashboardStores};
pub use error::ServiceError;
pub use feature_flags::{FeatureFlag, FeatureFlags, NC_INVENTORY_COMBOS};
pub use images::{ImageStore, ImageStoreError, ImageUpload, InMemoryImageStore};
pub use records::{Notification, NotificationLevel, ServiceSubscription, SyncStatus};
pub use store::{DynStore, InMemoryTenantStore, PostgresTenantStore, StoreError, TenantStore, migrate};
pub use user_data::{UserData, UserDataFetcher};
