//! Loyalty discount earned at visit-count thresholds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discount earned when a guest's lifetime visit count crosses a multiple
/// of the configured threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Discount {
    pub id: Uuid,
    pub guest_id: Uuid,
    /// Lifetime visit count at the moment the discount was earned.
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
}

/// True when `total_visits` lands exactly on a threshold multiple.
pub fn crossed_threshold(total_visits: i64, threshold: i64) -> bool {
    threshold > 0 && total_visits > 0 && total_visits % threshold == 0
}
