//! Override audit entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the override_logs table. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct OverrideLogEntity {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub user_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<OverrideLogEntity> for domain::models::OverrideLog {
    fn from(entity: OverrideLogEntity) -> Self {
        Self {
            id: entity.id,
            visit_id: entity.visit_id,
            user_id: entity.user_id,
            reason: entity.reason,
            created_at: entity.created_at,
        }
    }
}
