//! Guest repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::GuestEntity;
use crate::metrics::QueryTimer;

/// Repository for guest-related database operations.
#[derive(Clone)]
pub struct GuestRepository {
    pool: PgPool,
}

impl GuestRepository {
    /// Creates a new GuestRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the guest for an email, creating a bare row if none exists.
    ///
    /// Reuses an existing guest without touching any profile field, so a
    /// re-invitation never downgrades `profile_completed` or resets
    /// `terms_accepted_at`. The no-op conflict update makes the row come
    /// back through RETURNING either way.
    pub async fn find_or_create_by_email(&self, email: &str) -> Result<GuestEntity, sqlx::Error> {
        let timer = QueryTimer::new("find_or_create_guest_by_email");
        let result = sqlx::query_as::<_, GuestEntity>(
            r#"
            INSERT INTO guests (email)
            VALUES ($1)
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING id, email, name, phone, company, profile_completed,
                      terms_accepted_at, blacklisted_at, created_at, updated_at
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find guest by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_guest_by_id");
        let result = sqlx::query_as::<_, GuestEntity>(
            r#"
            SELECT id, email, name, phone, company, profile_completed,
                   terms_accepted_at, blacklisted_at, created_at, updated_at
            FROM guests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find guest by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<GuestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_guest_by_email");
        let result = sqlx::query_as::<_, GuestEntity>(
            r#"
            SELECT id, email, name, phone, company, profile_completed,
                   terms_accepted_at, blacklisted_at, created_at, updated_at
            FROM guests
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Complete a guest's profile from self-service registration.
    ///
    /// Optional fields only fill gaps; `profile_completed` never goes back
    /// to false once set.
    pub async fn complete_profile(
        &self,
        id: Uuid,
        name: &str,
        phone: Option<&str>,
        company: Option<&str>,
        terms_accepted_at: DateTime<Utc>,
    ) -> Result<GuestEntity, sqlx::Error> {
        let timer = QueryTimer::new("complete_guest_profile");
        let result = sqlx::query_as::<_, GuestEntity>(
            r#"
            UPDATE guests
            SET name = $2,
                phone = COALESCE($3, phone),
                company = COALESCE($4, company),
                profile_completed = TRUE,
                terms_accepted_at = COALESCE(terms_accepted_at, $5),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, phone, company, profile_completed,
                      terms_accepted_at, blacklisted_at, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(phone)
        .bind(company)
        .bind(terms_accepted_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Blacklist a guest. Idempotent: an existing stamp is preserved.
    pub async fn set_blacklisted(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("set_guest_blacklisted");
        let result = sqlx::query(
            r#"
            UPDATE guests
            SET blacklisted_at = COALESCE(blacklisted_at, NOW()), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Clear a guest's blacklist stamp.
    pub async fn clear_blacklisted(&self, id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("clear_guest_blacklisted");
        let result = sqlx::query(
            r#"
            UPDATE guests
            SET blacklisted_at = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Administrative purge of a guest and every dependent record.
    ///
    /// Deletion order is fixed: discounts, acceptances, visits,
    /// invitations, then the guest row itself. Override audit rows are not
    /// touched. Returns false when the guest did not exist.
    pub async fn purge(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("purge_guest");

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM discounts WHERE guest_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM acceptances WHERE guest_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM visits WHERE guest_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM invitations WHERE guest_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM guests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(deleted.rows_affected() > 0)
    }
}
