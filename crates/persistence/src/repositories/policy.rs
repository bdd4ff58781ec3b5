//! Policy repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PolicyEntity;
use crate::metrics::QueryTimer;

/// Repository for policy-related database operations. Policies are
/// read-only from the engine's perspective; rows are maintained through
/// administrative configuration.
#[derive(Clone)]
pub struct PolicyRepository {
    pool: PgPool,
}

impl PolicyRepository {
    /// Creates a new PolicyRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the policy row for a location, if one exists.
    pub async fn find_for_location(
        &self,
        location_id: Uuid,
    ) -> Result<Option<PolicyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_policy_for_location");
        let result = sqlx::query_as::<_, PolicyEntity>(
            r#"
            SELECT id, location_id, guest_monthly_limit, host_concurrent_limit,
                   created_at, updated_at
            FROM policies
            WHERE location_id = $1
            "#,
        )
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Upsert the policy row for a location. Used by administrative
    /// seeding and integration tests.
    pub async fn upsert_for_location(
        &self,
        location_id: Uuid,
        guest_monthly_limit: i32,
        host_concurrent_limit: i32,
    ) -> Result<PolicyEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_policy_for_location");
        let result = sqlx::query_as::<_, PolicyEntity>(
            r#"
            INSERT INTO policies (location_id, guest_monthly_limit, host_concurrent_limit)
            VALUES ($1, $2, $3)
            ON CONFLICT (location_id)
            DO UPDATE SET guest_monthly_limit = EXCLUDED.guest_monthly_limit,
                          host_concurrent_limit = EXCLUDED.host_concurrent_limit,
                          updated_at = NOW()
            RETURNING id, location_id, guest_monthly_limit, host_concurrent_limit,
                      created_at, updated_at
            "#,
        )
        .bind(location_id)
        .bind(guest_monthly_limit)
        .bind(host_concurrent_limit)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
