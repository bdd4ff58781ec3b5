//! Override audit repository. Insert and read only; the table is
//! append-only by contract.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::OverrideLogEntity;
use crate::metrics::QueryTimer;

/// Repository for override audit records.
#[derive(Clone)]
pub struct OverrideLogRepository {
    pool: PgPool,
}

impl OverrideLogRepository {
    /// Creates a new OverrideLogRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List audit rows for a visit, oldest first.
    pub async fn list_for_visit(
        &self,
        visit_id: Uuid,
    ) -> Result<Vec<OverrideLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_override_logs_for_visit");
        let result = sqlx::query_as::<_, OverrideLogEntity>(
            r#"
            SELECT id, visit_id, user_id, reason, created_at
            FROM override_logs
            WHERE visit_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(visit_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count all audit rows. Used by tests to assert nothing is written on
    /// a rejected override.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_override_logs");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM override_logs")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }
}
