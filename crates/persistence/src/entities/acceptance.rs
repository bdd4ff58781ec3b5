//! Acceptance entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the acceptances table.
#[derive(Debug, Clone, FromRow)]
pub struct AcceptanceEntity {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub invitation_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub accepted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub signature: String,
    pub ip_address: Option<String>,
}

impl From<AcceptanceEntity> for domain::models::Acceptance {
    fn from(entity: AcceptanceEntity) -> Self {
        Self {
            id: entity.id,
            guest_id: entity.guest_id,
            invitation_id: entity.invitation_id,
            visit_id: entity.visit_id,
            accepted_at: entity.accepted_at,
            expires_at: entity.expires_at,
            signature: entity.signature,
            ip_address: entity.ip_address,
        }
    }
}
