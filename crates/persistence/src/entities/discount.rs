//! Discount entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the discounts table.
#[derive(Debug, Clone, FromRow)]
pub struct DiscountEntity {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
}

impl From<DiscountEntity> for domain::models::Discount {
    fn from(entity: DiscountEntity) -> Self {
        Self {
            id: entity.id,
            guest_id: entity.guest_id,
            visit_count: entity.visit_count,
            created_at: entity.created_at,
        }
    }
}
