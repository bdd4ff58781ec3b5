//! Check-in unit of work.
//!
//! A check-in reads shared counters (guest rolling window, host concurrent
//! count) and then writes a visit. Both must happen inside one transaction
//! serialized per host, or two simultaneous scans could each observe
//! `count = limit - 1` and push the host over capacity. Serialization uses
//! a Postgres advisory lock scoped to the transaction and keyed on the
//! host id.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{GuestEntity, InvitationEntity, PolicyEntity, VisitEntity};
use crate::metrics::QueryTimer;

/// Everything the admission evaluator needs, read at evaluation time
/// inside the serialized transaction.
#[derive(Debug)]
pub struct CheckInSnapshot {
    pub guest: GuestEntity,
    pub has_valid_acceptance: bool,
    pub monthly_visit_count: i64,
    pub host_concurrent_count: i64,
    pub policy: Option<PolicyEntity>,
}

/// Repository for the transactional check-in path.
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    /// Creates a new CheckInRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the check-in transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    /// Serializes check-ins per host for the duration of the transaction.
    /// `hashtext` folds the uuid into the advisory lock keyspace.
    pub async fn lock_host(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        host_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("advisory_lock_host");
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(host_id)
            .execute(&mut **tx)
            .await?;
        timer.record();
        Ok(())
    }

    /// Reads the admission inputs under the host lock. Counts are computed
    /// here, at evaluation time, never from a cache.
    #[allow(clippy::too_many_arguments)]
    pub async fn snapshot(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        guest_id: Uuid,
        invitation_id: Uuid,
        location_id: Uuid,
        host_id: Uuid,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<CheckInSnapshot, sqlx::Error> {
        let timer = QueryTimer::new("check_in_snapshot");

        let guest = sqlx::query_as::<_, GuestEntity>(
            r#"
            SELECT id, email, name, phone, company, profile_completed,
                   terms_accepted_at, blacklisted_at, created_at, updated_at
            FROM guests
            WHERE id = $1
            "#,
        )
        .bind(guest_id)
        .fetch_one(&mut **tx)
        .await?;

        let has_valid_acceptance = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM acceptances
                WHERE guest_id = $1 AND invitation_id = $2 AND expires_at > $3
            )
            "#,
        )
        .bind(guest_id)
        .bind(invitation_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        let monthly_visit_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE guest_id = $1 AND checked_in_at >= $2
            "#,
        )
        .bind(guest_id)
        .bind(window_start)
        .fetch_one(&mut **tx)
        .await?;

        let host_concurrent_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE host_id = $1 AND checked_out_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(host_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        let policy = sqlx::query_as::<_, PolicyEntity>(
            r#"
            SELECT id, location_id, guest_monthly_limit, host_concurrent_limit,
                   created_at, updated_at
            FROM policies
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&mut **tx)
        .await?;

        timer.record();
        Ok(CheckInSnapshot {
            guest,
            has_valid_acceptance,
            monthly_visit_count,
            host_concurrent_count,
            policy,
        })
    }

    /// Performs the admitted check-in mutation: flips the invitation to
    /// checked-in and creates the visit row. The override columns are set
    /// only on the Override Authority path.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_check_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invitation_id: Uuid,
        host_id: Uuid,
        checked_in_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        override_reason: Option<&str>,
        override_by: Option<&str>,
    ) -> Result<Option<VisitEntity>, sqlx::Error> {
        let timer = QueryTimer::new("record_check_in");

        let updated = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'checked_in', updated_at = NOW()
            WHERE id = $1 AND status = 'activated'
            "#,
        )
        .bind(invitation_id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            timer.record();
            return Ok(None);
        }

        let visit = sqlx::query_as::<_, VisitEntity>(
            r#"
            INSERT INTO visits (guest_id, host_id, location_id, invitation_id,
                                checked_in_at, expires_at, override_reason, override_by)
            SELECT guest_id, $2, location_id, id, $3, $4, $5, $6
            FROM invitations
            WHERE id = $1
            RETURNING id, guest_id, host_id, location_id, invitation_id, checked_in_at,
                      expires_at, checked_out_at, override_reason, override_by
            "#,
        )
        .bind(invitation_id)
        .bind(host_id)
        .bind(checked_in_at)
        .bind(expires_at)
        .bind(override_reason)
        .bind(override_by)
        .fetch_one(&mut **tx)
        .await?;

        timer.record();
        Ok(Some(visit))
    }

    /// Expires an activated invitation inside the transaction. Used when a
    /// scan detects a lapsed QR window; the detection side effect commits
    /// even though the check-in itself is denied.
    pub async fn mark_expired(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        invitation_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("mark_invitation_expired_tx");
        let result = sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired', qr_token = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'activated'
            "#,
        )
        .bind(invitation_id)
        .execute(&mut **tx)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Guest's lifetime visit count, read inside the transaction for
    /// discount threshold detection.
    pub async fn lifetime_visit_count(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        guest_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("lifetime_visit_count");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM visits WHERE guest_id = $1",
        )
        .bind(guest_id)
        .fetch_one(&mut **tx)
        .await;
        timer.record();
        result
    }

    /// Records a discount earned at a visit-count threshold.
    pub async fn insert_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        guest_id: Uuid,
        visit_count: i64,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_discount");
        sqlx::query("INSERT INTO discounts (guest_id, visit_count) VALUES ($1, $2)")
            .bind(guest_id)
            .bind(visit_count)
            .execute(&mut **tx)
            .await?;
        timer.record();
        Ok(())
    }

    /// Appends the override audit row. No code path updates or deletes
    /// these rows.
    pub async fn insert_override_log(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        visit_id: Uuid,
        user_id: &str,
        reason: &str,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("insert_override_log");
        sqlx::query("INSERT INTO override_logs (visit_id, user_id, reason) VALUES ($1, $2, $3)")
            .bind(visit_id)
            .bind(user_id)
            .bind(reason)
            .execute(&mut **tx)
            .await?;
        timer.record();
        Ok(())
    }

    /// Re-reads the invitation by token inside the transaction, after the
    /// host lock is held, so the status check races with nothing.
    pub async fn find_invitation_by_qr_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        qr_token: &str,
    ) -> Result<Option<InvitationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invitation_by_qr_token_tx");
        let result = sqlx::query_as::<_, InvitationEntity>(
            r#"
            SELECT id, guest_id, host_id, location_id, invite_date, status,
                   qr_token, qr_issued_at, qr_expires_at, created_at, updated_at
            FROM invitations
            WHERE qr_token = $1
            FOR UPDATE
            "#,
        )
        .bind(qr_token)
        .fetch_optional(&mut **tx)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: CheckInRepository tests require a database connection and are
    // covered by integration tests.
}
