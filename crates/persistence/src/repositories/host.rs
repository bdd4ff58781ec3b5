//! Host repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::HostEntity;
use crate::metrics::QueryTimer;

/// Repository for host referential data.
#[derive(Clone)]
pub struct HostRepository {
    pool: PgPool,
}

impl HostRepository {
    /// Creates a new HostRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find host by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<HostEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_host_by_id");
        let result = sqlx::query_as::<_, HostEntity>(
            r#"
            SELECT id, name, email, created_at
            FROM hosts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Create a host. Used by administrative seeding and tests.
    pub async fn create(&self, name: &str, email: &str) -> Result<HostEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_host");
        let result = sqlx::query_as::<_, HostEntity>(
            r#"
            INSERT INTO hosts (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
