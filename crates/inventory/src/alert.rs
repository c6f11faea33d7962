use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use neurocore_core::{DomainResult, Entity, FieldErrors, RecordId, UserId};

use crate::validation;

/// Where a low-stock alert is delivered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    Portal,
    Email,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryAlert {
    pub id: RecordId,
    pub threshold: i64,
    pub channel: AlertChannel,
    pub active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Entity for InventoryAlert {
    type Id = RecordId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Command payload: create an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewInventoryAlert {
    pub threshold: i64,
    pub channel: AlertChannel,
}

impl NewInventoryAlert {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::non_negative(&mut errors, "threshold", self.threshold);
        errors.into_result()
    }

    pub fn into_alert(self, id: RecordId, created_by: UserId, now: DateTime<Utc>) -> InventoryAlert {
        InventoryAlert {
            id,
            threshold: self.threshold,
            channel: self.channel,
            active: true,
            created_by,
            created_at: now,
        }
    }
}
