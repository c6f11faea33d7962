//! Dashboard channel message schema.
//!
//! Messages are JSON objects tagged by `type`:
//!
//! ```text
//! {"type":"service_selected","tenant_id":"<uuid>","user_id":"<uuid>","service":"buildpro"|"neurocore"}
//! {"type":"catalog_changed","tenant_id":"<uuid>","collection":"inventory_items","record_id":"<uuid>","change":"created"|"updated"|"deleted"}
//! ```
//!
//! Over SSE the event name is [`ChannelMessage::topic`] and the data is the
//! JSON object above.

use serde::{Deserialize, Serialize};

use neurocore_core::{RecordId, TenantId, UserId};

use crate::tenant::TenantScoped;

/// Product a user can work in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCode {
    Buildpro,
    Neurocore,
}

impl ServiceCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCode::Buildpro => "buildpro",
            ServiceCode::Neurocore => "neurocore",
        }
    }

    pub fn parse(raw: &str) -> Option<ServiceCode> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "buildpro" => Some(ServiceCode::Buildpro),
            "neurocore" => Some(ServiceCode::Neurocore),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    /// The user switched the active service; every open session of that
    /// user in the tenant should follow.
    ServiceSelected {
        tenant_id: TenantId,
        user_id: UserId,
        service: ServiceCode,
    },
    /// A catalog mutation was confirmed by the store.
    CatalogChanged {
        tenant_id: TenantId,
        collection: String,
        record_id: RecordId,
        change: ChangeKind,
    },
}

impl ChannelMessage {
    pub fn topic(&self) -> &'static str {
        match self {
            ChannelMessage::ServiceSelected { .. } => "service.selected",
            ChannelMessage::CatalogChanged { .. } => "catalog.changed",
        }
    }
}

impl TenantScoped for ChannelMessage {
    fn tenant_id(&self) -> TenantId {
        match self {
            ChannelMessage::ServiceSelected { tenant_id, .. } => *tenant_id,
            ChannelMessage::CatalogChanged { tenant_id, .. } => *tenant_id,
        }
    }
}
