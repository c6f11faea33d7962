//! Request/response DTOs and their mapping to domain types.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

use neurocore_analytics::{CriticalItem, CustomerKpis, SalesKpis, SegmentCounts, SeriesPoint, SummaryKpis};
use neurocore_core::UserId;
use neurocore_customers::Customer;
use neurocore_events::ServiceCode;
use neurocore_infra::{ImageUpload, Saved};
use neurocore_inventory::{InventoryItem, InventoryItemPatch, NewInventoryItem};
use neurocore_sales::SaleRecord;

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

/// Image sent inline with an item mutation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagePayload {
    pub file_name: String,
    pub content_base64: String,
}

impl ImagePayload {
    pub fn decode(self) -> Result<ImageUpload, ApiError> {
        let bytes = general_purpose::STANDARD
            .decode(self.content_base64.trim())
            .map_err(|e| ApiError::Validation(format!("image.content_base64 is not valid base64: {e}")))?;
        Ok(ImageUpload {
            file_name: self.file_name,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateItemRequest {
    pub item: NewInventoryItem,
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    pub item: InventoryItemPatch,
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectServiceRequest {
    pub service: ServiceCode,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscriptionRequest {
    pub user_id: UserId,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFlagRequest {
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SegmentQuery {
    #[serde(default)]
    pub segment: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct SavedItemResponse {
    pub item: InventoryItem,
    /// Why the accompanying image was not stored, when it was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_error: Option<String>,
}

impl From<Saved<InventoryItem>> for SavedItemResponse {
    fn from(saved: Saved<InventoryItem>) -> Self {
        Self {
            item: saved.record,
            image_error: saved.image_error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryViewResponse {
    pub items: Vec<CriticalItem>,
    pub kpis: SummaryKpis,
}

#[derive(Debug, Serialize)]
pub struct SalesViewResponse {
    pub rows: Vec<SaleRecord>,
    pub kpis: SalesKpis,
    pub series: Vec<SeriesPoint>,
    pub previous_series: Vec<SeriesPoint>,
}

#[derive(Debug, Serialize)]
pub struct CustomersViewResponse {
    pub rows: Vec<Customer>,
    pub segments: SegmentCounts,
    pub kpis: CustomerKpis,
}
