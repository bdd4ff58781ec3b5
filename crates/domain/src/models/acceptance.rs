//! Acceptance domain model: a recorded, time-bounded terms agreement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::token::AcceptanceScope;
use uuid::Uuid;

/// Terms agreement scoped to exactly one invitation or one visit.
/// At most one row exists per (guest, invitation) or (guest, visit) pair;
/// a repeated agreement updates the row in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Acceptance {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub invitation_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub accepted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub signature: String,
    pub ip_address: Option<String>,
}

impl Acceptance {
    /// True while the agreement window has not lapsed.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// The scope this acceptance is bound to.
    pub fn scope(&self) -> AcceptanceScope {
        if self.visit_id.is_some() {
            AcceptanceScope::Visit
        } else {
            AcceptanceScope::Invitation
        }
    }
}
