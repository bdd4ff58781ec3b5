//! Visit repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::VisitEntity;
use crate::metrics::QueryTimer;

const VISIT_COLUMNS: &str = "id, guest_id, host_id, location_id, invitation_id, checked_in_at, \
     expires_at, checked_out_at, override_reason, override_by";

/// Repository for visit-related database operations.
#[derive(Clone)]
pub struct VisitRepository {
    pool: PgPool,
}

impl VisitRepository {
    /// Creates a new VisitRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find visit by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<VisitEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_visit_by_id");
        let result = sqlx::query_as::<_, VisitEntity>(&format!(
            r#"
            SELECT {VISIT_COLUMNS}
            FROM visits
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Check out a visit. Returns None when the visit was already checked
    /// out, so repeated check-outs surface as a state conflict.
    pub async fn check_out(
        &self,
        id: Uuid,
        checked_out_at: DateTime<Utc>,
    ) -> Result<Option<VisitEntity>, sqlx::Error> {
        let timer = QueryTimer::new("check_out_visit");
        let result = sqlx::query_as::<_, VisitEntity>(&format!(
            r#"
            UPDATE visits
            SET checked_out_at = $2
            WHERE id = $1 AND checked_out_at IS NULL
            RETURNING {VISIT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(checked_out_at)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count a guest's visits since `window_start` (trailing rolling
    /// window). Recomputed on every call; never cached.
    pub async fn count_in_window(
        &self,
        guest_id: Uuid,
        window_start: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_guest_visits_in_window");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE guest_id = $1 AND checked_in_at >= $2
            "#,
        )
        .bind(guest_id)
        .bind(window_start)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count guests currently checked in under a host.
    pub async fn count_active_for_host(
        &self,
        host_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_visits_for_host");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM visits
            WHERE host_id = $1 AND checked_out_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(host_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: VisitRepository tests require a database connection and are
    // covered by integration tests.
}
