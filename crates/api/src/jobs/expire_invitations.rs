//! Invitation expiry sweep.
//!
//! The write-path companion to lazy expiry: correctness never depends on
//! this job running on schedule, because reads derive the expired status
//! and check-ins detect it, but the sweep keeps stored state from drifting
//! behind indefinitely.

use persistence::repositories::InvitationRepository;
use shared::clock::BusinessClock;
use sqlx::PgPool;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

/// Background job that expires invitations whose QR window has lapsed.
pub struct ExpireInvitationsJob {
    pool: PgPool,
    clock: BusinessClock,
    frequency_minutes: u64,
}

impl ExpireInvitationsJob {
    pub fn new(pool: PgPool, clock: BusinessClock, frequency_minutes: u64) -> Self {
        Self {
            pool,
            clock,
            frequency_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExpireInvitationsJob {
    fn name(&self) -> &'static str {
        "expire_invitations"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.frequency_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let expired = InvitationRepository::new(self.pool.clone())
            .expire_overdue(self.clock.now())
            .await
            .map_err(|e| e.to_string())?;

        if expired > 0 {
            info!(expired, "Expired overdue invitations");
        }

        Ok(())
    }
}
