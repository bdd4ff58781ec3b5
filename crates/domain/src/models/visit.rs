//! Visit domain models and check-in request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::admission::AdmissionVerdict;

/// A realized, time-bounded admission event. Created exactly once when an
/// invitation transitions to checked-in; immutable afterwards except
/// `checked_out_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Visit {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    pub invitation_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub override_reason: Option<String>,
    pub override_by: Option<String>,
}

impl Visit {
    /// True while the guest counts against the host's concurrent capacity.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.checked_out_at.is_none() && now < self.expires_at
    }

    /// True when this visit was admitted through the Override Authority.
    pub fn was_overridden(&self) -> bool {
        self.override_by.is_some()
    }
}

lazy_static::lazy_static! {
    static ref QR_TOKEN_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9]{20,64}$").unwrap();
}

/// Kiosk check-in request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRequest {
    #[validate(regex(
        path = *QR_TOKEN_REGEX,
        message = "qr_token must be an opaque alphanumeric code"
    ))]
    pub qr_token: String,

    /// Overrides the invitation's host for drop-in desks; defaults to the
    /// inviting host.
    pub host_id: Option<Uuid>,
}

/// Security override of a host-capacity denial.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct OverrideCheckInRequest {
    #[validate(regex(
        path = *QR_TOKEN_REGEX,
        message = "qr_token must be an opaque alphanumeric code"
    ))]
    pub qr_token: String,

    pub host_id: Option<Uuid>,

    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub reason: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Visit representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct VisitResponse {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    pub invitation_id: Uuid,
    pub checked_in_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_out_at: Option<DateTime<Utc>>,
    pub overridden: bool,
}

impl From<Visit> for VisitResponse {
    fn from(visit: Visit) -> Self {
        let overridden = visit.was_overridden();
        Self {
            id: visit.id,
            guest_id: visit.guest_id,
            host_id: visit.host_id,
            location_id: visit.location_id,
            invitation_id: visit.invitation_id,
            checked_in_at: visit.checked_in_at,
            expires_at: visit.expires_at,
            checked_out_at: visit.checked_out_at,
            overridden,
        }
    }
}

/// Envelope returned by the check-in endpoints. Policy denials are values
/// the caller branches on, not errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInResponse {
    pub admitted: bool,
    pub verdict: AdmissionVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit: Option<VisitResponse>,
}

impl CheckInResponse {
    pub fn admitted(verdict: AdmissionVerdict, visit: VisitResponse) -> Self {
        Self {
            admitted: true,
            verdict,
            visit: Some(visit),
        }
    }

    pub fn denied(verdict: AdmissionVerdict) -> Self {
        Self {
            admitted: false,
            verdict,
            visit: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn visit(now: DateTime<Utc>) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            guest_id: Uuid::new_v4(),
            host_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            invitation_id: Uuid::new_v4(),
            checked_in_at: now,
            expires_at: now + Duration::hours(12),
            checked_out_at: None,
            override_reason: None,
            override_by: None,
        }
    }

    #[test]
    fn test_visit_active_until_expiry() {
        let now = Utc::now();
        let v = visit(now);
        assert!(v.is_active(now));
        assert!(v.is_active(now + Duration::hours(11)));
        assert!(!v.is_active(now + Duration::hours(12)));
    }

    #[test]
    fn test_checked_out_visit_is_inactive() {
        let now = Utc::now();
        let mut v = visit(now);
        v.checked_out_at = Some(now + Duration::hours(1));
        assert!(!v.is_active(now + Duration::hours(2)));
    }

    #[test]
    fn test_override_request_requires_nonblank_reason() {
        let valid = OverrideCheckInRequest {
            qr_token: "A".repeat(32),
            host_id: None,
            reason: "VIP guest".to_string(),
            password: "secret".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank_reason = OverrideCheckInRequest {
            reason: "   ".to_string(),
            ..valid
        };
        assert!(blank_reason.validate().is_err());
    }

    #[test]
    fn test_check_in_request_rejects_short_token() {
        let req = CheckInRequest {
            qr_token: "short".to_string(),
            host_id: None,
        };
        assert!(req.validate().is_err());
    }
}
