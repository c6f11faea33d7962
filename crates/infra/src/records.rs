//! Supporting dashboard records: sync status, notifications, service access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neurocore_core::{Entity, RecordId, UserId};
use neurocore_events::ServiceCode;

/// Last successful sync of a dashboard module (keyed by `module_code`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub module_code: String,
    pub last_sync_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub user_id: UserId,
    pub module_code: String,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Entity for Notification {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Whether a user may work in a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSubscription {
    pub user_id: UserId,
    pub service_code: ServiceCode,
    pub active: bool,
}

impl ServiceSubscription {
    /// Store key: one subscription per user and service.
    pub fn key(user_id: UserId, service_code: ServiceCode) -> String {
        format!("{user_id}:{}", service_code.as_str())
    }
}
