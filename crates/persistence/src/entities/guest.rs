//! Guest entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the guests table.
#[derive(Debug, Clone, FromRow)]
pub struct GuestEntity {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub profile_completed: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<GuestEntity> for domain::models::Guest {
    fn from(entity: GuestEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            phone: entity.phone,
            company: entity.company,
            profile_completed: entity.profile_completed,
            terms_accepted_at: entity.terms_accepted_at,
            blacklisted_at: entity.blacklisted_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
