//! Admission policy thresholds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-location policy row. Absent rows fall back to configured defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Policy {
    pub id: Uuid,
    pub location_id: Uuid,
    pub guest_monthly_limit: i32,
    pub host_concurrent_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Thresholds the admission evaluator runs against, resolved once per
/// check-in transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyLimits {
    /// Maximum visits per guest in the trailing 30 days.
    pub guest_monthly_limit: i32,
    /// Maximum guests concurrently checked in under one host.
    pub host_concurrent_limit: i32,
}

impl PolicyLimits {
    /// Resolves effective limits: the location's policy row when present,
    /// otherwise the configured defaults.
    pub fn resolve(policy: Option<&Policy>, defaults: PolicyLimits) -> Self {
        match policy {
            Some(p) => Self {
                guest_monthly_limit: p.guest_monthly_limit,
                host_concurrent_limit: p.host_concurrent_limit,
            },
            None => defaults,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: PolicyLimits = PolicyLimits {
        guest_monthly_limit: 3,
        host_concurrent_limit: 3,
    };

    #[test]
    fn test_resolve_prefers_location_policy() {
        let policy = Policy {
            id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            guest_monthly_limit: 10,
            host_concurrent_limit: 5,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let limits = PolicyLimits::resolve(Some(&policy), DEFAULTS);
        assert_eq!(limits.guest_monthly_limit, 10);
        assert_eq!(limits.host_concurrent_limit, 5);
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        assert_eq!(PolicyLimits::resolve(None, DEFAULTS), DEFAULTS);
    }
}
