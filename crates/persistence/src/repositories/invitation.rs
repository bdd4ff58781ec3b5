//! Invitation repository for database operations.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::InvitationEntity;
use crate::metrics::QueryTimer;

const INVITATION_COLUMNS: &str = "id, guest_id, host_id, location_id, invite_date, status, \
     qr_token, qr_issued_at, qr_expires_at, created_at, updated_at";

/// Repository for invitation-related database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Creates a new InvitationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending invitation.
    pub async fn create(
        &self,
        guest_id: Uuid,
        host_id: Uuid,
        location_id: Uuid,
        invite_date: Option<NaiveDate>,
    ) -> Result<InvitationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            INSERT INTO invitations (guest_id, host_id, location_id, invite_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {INVITATION_COLUMNS}
            "#,
        ))
        .bind(guest_id)
        .bind(host_id)
        .bind(location_id)
        .bind(invite_date)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find invitation by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_by_id");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find invitation by its QR entry token.
    pub async fn find_by_qr_token(
        &self,
        qr_token: &str,
    ) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_by_qr_token");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE qr_token = $1
            "#,
        ))
        .bind(qr_token)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Activate a pending invitation: store the freshly issued QR token and
    /// its validity window. Returns None when the row was not pending, so a
    /// second activation attempt surfaces as a state conflict to the caller.
    pub async fn activate(
        &self,
        id: Uuid,
        qr_token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("activate_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            UPDATE invitations
            SET status = 'activated', qr_token = $2, qr_issued_at = $3,
                qr_expires_at = $4, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {INVITATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(qr_token)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Reissue a fresh QR token for an expired invitation. Returns None when
    /// the row was not expired.
    pub async fn reissue(
        &self,
        id: Uuid,
        qr_token: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("reissue_invitation");
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            UPDATE invitations
            SET status = 'activated', qr_token = $2, qr_issued_at = $3,
                qr_expires_at = $4, updated_at = NOW()
            WHERE id = $1 AND status = 'expired'
            RETURNING {INVITATION_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(qr_token)
        .bind(issued_at)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Transition an activated invitation to expired. Idempotent: rows
    /// already past activated are left untouched. The token is cleared so
    /// the presentability invariant holds.
    pub async fn mark_expired(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_invitation_expired");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', qr_token = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'activated'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Sweep: expire every activated invitation whose QR window has lapsed.
    /// Returns the number of rows transitioned.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("expire_overdue_invitations");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', qr_token = NULL, updated_at = NOW()
            WHERE status = 'activated' AND qr_expires_at < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// List invitations, newest first, optionally filtered by guest and
    /// stored status, keyset-paginated on (created_at, id).
    pub async fn list(
        &self,
        guest_id: Option<Uuid>,
        status: Option<&str>,
        cursor: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invitations");
        let (cursor_at, cursor_id) = match cursor {
            Some((at, id)) => (Some(at), Some(id)),
            None => (None, None),
        };
        let result = sqlx::query_as::<_, InvitationEntity>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE ($1::uuid IS NULL OR guest_id = $1)
              AND ($2::text IS NULL OR status = $2::invitation_status)
              AND ($3::timestamptz IS NULL OR (created_at, id) < ($3, $4))
            ORDER BY created_at DESC, id DESC
            LIMIT $5
            "#,
        ))
        .bind(guest_id)
        .bind(status)
        .bind(cursor_at)
        .bind(cursor_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: InvitationRepository tests require a database connection and
    // are covered by integration tests.
}
