//! Policy entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the policies table.
#[derive(Debug, Clone, FromRow)]
pub struct PolicyEntity {
    pub id: Uuid,
    pub location_id: Uuid,
    pub guest_monthly_limit: i32,
    pub host_concurrent_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PolicyEntity> for domain::models::Policy {
    fn from(entity: PolicyEntity) -> Self {
        Self {
            id: entity.id,
            location_id: entity.location_id,
            guest_monthly_limit: entity.guest_monthly_limit,
            host_concurrent_limit: entity.host_concurrent_limit,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
