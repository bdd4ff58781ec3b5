//! Override audit record for capacity bypasses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit record written when the Override Authority bypasses a
/// host-capacity denial. Append-only: never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OverrideLog {
    pub id: Uuid,
    pub visit_id: Uuid,
    /// Opaque caller identity of the authorizing staff member.
    pub user_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
