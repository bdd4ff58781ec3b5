//! Acceptance repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::AcceptanceEntity;
use crate::metrics::QueryTimer;

const ACCEPTANCE_COLUMNS: &str =
    "id, guest_id, invitation_id, visit_id, accepted_at, expires_at, signature, ip_address";

/// Repository for acceptance-related database operations.
#[derive(Clone)]
pub struct AcceptanceRepository {
    pool: PgPool,
}

impl AcceptanceRepository {
    /// Creates a new AcceptanceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record terms agreement for an invitation scope.
    ///
    /// Single-statement upsert keyed on the partial unique index, so
    /// concurrent submissions cannot produce duplicate rows: a repeated
    /// agreement refreshes the existing row in place.
    pub async fn upsert_for_invitation(
        &self,
        guest_id: Uuid,
        invitation_id: Uuid,
        accepted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        signature: &str,
        ip_address: Option<&str>,
    ) -> Result<AcceptanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_acceptance_for_invitation");
        let result = sqlx::query_as::<_, AcceptanceEntity>(&format!(
            r#"
            INSERT INTO acceptances (guest_id, invitation_id, accepted_at, expires_at, signature, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (guest_id, invitation_id) WHERE invitation_id IS NOT NULL
            DO UPDATE SET accepted_at = EXCLUDED.accepted_at,
                          expires_at = EXCLUDED.expires_at,
                          signature = EXCLUDED.signature,
                          ip_address = EXCLUDED.ip_address
            RETURNING {ACCEPTANCE_COLUMNS}
            "#,
        ))
        .bind(guest_id)
        .bind(invitation_id)
        .bind(accepted_at)
        .bind(expires_at)
        .bind(signature)
        .bind(ip_address)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record terms agreement for a visit scope.
    pub async fn upsert_for_visit(
        &self,
        guest_id: Uuid,
        visit_id: Uuid,
        accepted_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        signature: &str,
        ip_address: Option<&str>,
    ) -> Result<AcceptanceEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_acceptance_for_visit");
        let result = sqlx::query_as::<_, AcceptanceEntity>(&format!(
            r#"
            INSERT INTO acceptances (guest_id, visit_id, accepted_at, expires_at, signature, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (guest_id, visit_id) WHERE visit_id IS NOT NULL
            DO UPDATE SET accepted_at = EXCLUDED.accepted_at,
                          expires_at = EXCLUDED.expires_at,
                          signature = EXCLUDED.signature,
                          ip_address = EXCLUDED.ip_address
            RETURNING {ACCEPTANCE_COLUMNS}
            "#,
        ))
        .bind(guest_id)
        .bind(visit_id)
        .bind(accepted_at)
        .bind(expires_at)
        .bind(signature)
        .bind(ip_address)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the non-expired acceptance for a (guest, invitation) pair.
    pub async fn find_valid_for_invitation(
        &self,
        guest_id: Uuid,
        invitation_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<AcceptanceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_valid_acceptance_for_invitation");
        let result = sqlx::query_as::<_, AcceptanceEntity>(&format!(
            r#"
            SELECT {ACCEPTANCE_COLUMNS}
            FROM acceptances
            WHERE guest_id = $1 AND invitation_id = $2 AND expires_at > $3
            "#,
        ))
        .bind(guest_id)
        .bind(invitation_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count acceptance rows for a (guest, invitation) pair, expired or
    /// not. Used by tests to assert the upsert never duplicates.
    pub async fn count_for_invitation(
        &self,
        guest_id: Uuid,
        invitation_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_acceptances_for_invitation");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM acceptances
            WHERE guest_id = $1 AND invitation_id = $2
            "#,
        )
        .bind(guest_id)
        .bind(invitation_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: AcceptanceRepository tests require a database connection and
    // are covered by integration tests.
}
