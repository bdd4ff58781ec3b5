//! Invitation entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::InvitationStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for invitation_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "snake_case")]
pub enum InvitationStatusDb {
    Pending,
    Activated,
    CheckedIn,
    Expired,
}

impl From<InvitationStatusDb> for InvitationStatus {
    fn from(db_status: InvitationStatusDb) -> Self {
        match db_status {
            InvitationStatusDb::Pending => InvitationStatus::Pending,
            InvitationStatusDb::Activated => InvitationStatus::Activated,
            InvitationStatusDb::CheckedIn => InvitationStatus::CheckedIn,
            InvitationStatusDb::Expired => InvitationStatus::Expired,
        }
    }
}

impl From<InvitationStatus> for InvitationStatusDb {
    fn from(status: InvitationStatus) -> Self {
        match status {
            InvitationStatus::Pending => InvitationStatusDb::Pending,
            InvitationStatus::Activated => InvitationStatusDb::Activated,
            InvitationStatus::CheckedIn => InvitationStatusDb::CheckedIn,
            InvitationStatus::Expired => InvitationStatusDb::Expired,
        }
    }
}

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    pub invite_date: Option<NaiveDate>,
    pub status: InvitationStatusDb,
    pub qr_token: Option<String>,
    pub qr_issued_at: Option<DateTime<Utc>>,
    pub qr_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<InvitationEntity> for domain::models::Invitation {
    fn from(entity: InvitationEntity) -> Self {
        Self {
            id: entity.id,
            guest_id: entity.guest_id,
            host_id: entity.host_id,
            location_id: entity.location_id,
            invite_date: entity.invite_date,
            status: entity.status.into(),
            qr_token: entity.qr_token,
            qr_issued_at: entity.qr_issued_at,
            qr_expires_at: entity.qr_expires_at,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
