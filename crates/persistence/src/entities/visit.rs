//! Visit entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the visits table.
#[derive(Debug, Clone, FromRow)]
pub struct VisitEntity {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    pub invitation_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub override_reason: Option<String>,
    pub override_by: Option<String>,
}

impl From<VisitEntity> for domain::models::Visit {
    fn from(entity: VisitEntity) -> Self {
        Self {
            id: entity.id,
            guest_id: entity.guest_id,
            host_id: entity.host_id,
            location_id: entity.location_id,
            invitation_id: entity.invitation_id,
            checked_in_at: entity.checked_in_at,
            expires_at: entity.expires_at,
            checked_out_at: entity.checked_out_at,
            override_reason: entity.override_reason,
            override_by: entity.override_by,
        }
    }
}
