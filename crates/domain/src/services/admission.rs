//! Admission policy evaluator.
//!
//! A pure decision function invoked immediately before a check-in is
//! admitted. Checks run in a fixed precedence order and short-circuit on
//! the first failure:
//!
//! 1. Blacklist
//! 2. Terms acceptance
//! 3. QR validity
//! 4. Guest rolling 30-day limit
//! 5. Host concurrency (the only overridable denial)
//!
//! Counts must be read at evaluation time, inside the check-in
//! transaction; the evaluator itself performs no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::PolicyLimits;

/// Snapshot of everything the evaluator needs, gathered by the caller.
#[derive(Debug, Clone)]
pub struct AdmissionInput {
    pub blacklisted_at: Option<DateTime<Utc>>,
    /// A non-expired acceptance exists for the relevant scope.
    pub has_valid_acceptance: bool,
    /// The presented QR window has lapsed or the invitation reads expired.
    pub qr_expired: bool,
    /// Guest's visits in the trailing 30 days, recomputed at evaluation time.
    pub monthly_visit_count: i64,
    /// Guests currently checked in under the target host.
    pub host_concurrent_count: i64,
    pub limits: PolicyLimits,
}

/// Why a check-in was denied. Denials are structured verdicts the caller
/// branches on, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    Blacklisted,
    TermsRequired,
    QrExpired,
    GuestLimitExceeded { current: i64, max: i32 },
    HostAtCapacity { current: i64, max: i32 },
}

impl DenialReason {
    /// Only a host-capacity denial may be bypassed by the Override
    /// Authority.
    pub fn is_overridable(&self) -> bool {
        matches!(self, DenialReason::HostAtCapacity { .. })
    }
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::Blacklisted => write!(f, "guest is blacklisted"),
            DenialReason::TermsRequired => write!(f, "terms acceptance required"),
            DenialReason::QrExpired => write!(f, "QR entry token expired"),
            DenialReason::GuestLimitExceeded { current, max } => {
                write!(f, "guest visited {} times in 30 days (limit {})", current, max)
            }
            DenialReason::HostAtCapacity { current, max } => {
                write!(f, "host has {} concurrent guests (limit {})", current, max)
            }
        }
    }
}

/// Outcome of an admission evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionVerdict {
    Allow,
    Deny {
        #[serde(flatten)]
        reason: DenialReason,
    },
}

impl AdmissionVerdict {
    pub fn deny(reason: DenialReason) -> Self {
        AdmissionVerdict::Deny { reason }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, AdmissionVerdict::Allow)
    }

    pub fn denial(&self) -> Option<&DenialReason> {
        match self {
            AdmissionVerdict::Allow => None,
            AdmissionVerdict::Deny { reason } => Some(reason),
        }
    }
}

/// Evaluates the admission policy. First failing check wins.
pub fn evaluate(input: &AdmissionInput) -> AdmissionVerdict {
    if input.blacklisted_at.is_some() {
        return AdmissionVerdict::deny(DenialReason::Blacklisted);
    }

    if !input.has_valid_acceptance {
        return AdmissionVerdict::deny(DenialReason::TermsRequired);
    }

    if input.qr_expired {
        return AdmissionVerdict::deny(DenialReason::QrExpired);
    }

    if input.monthly_visit_count >= i64::from(input.limits.guest_monthly_limit) {
        return AdmissionVerdict::deny(DenialReason::GuestLimitExceeded {
            current: input.monthly_visit_count,
            max: input.limits.guest_monthly_limit,
        });
    }

    if input.host_concurrent_count >= i64::from(input.limits.host_concurrent_limit) {
        return AdmissionVerdict::deny(DenialReason::HostAtCapacity {
            current: input.host_concurrent_count,
            max: input.limits.host_concurrent_limit,
        });
    }

    AdmissionVerdict::Allow
}
