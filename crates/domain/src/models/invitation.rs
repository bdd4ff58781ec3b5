//! Invitation domain models and QR entry token generation.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle state of an invitation.
///
/// `qr_token` is set if and only if the status is `Activated` or
/// `CheckedIn`. `Expired` may be re-entered into `Activated` via reissue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Activated,
    CheckedIn,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Activated => "activated",
            InvitationStatus::CheckedIn => "checked_in",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "activated" => Ok(InvitationStatus::Activated),
            "checked_in" => Ok(InvitationStatus::CheckedIn),
            "expired" => Ok(InvitationStatus::Expired),
            other => Err(format!("unknown invitation status: {}", other)),
        }
    }
}

/// A planned single-day visit linking a guest, host, and location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Invitation {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    pub invite_date: Option<NaiveDate>,
    pub status: InvitationStatus,
    pub qr_token: Option<String>,
    pub qr_issued_at: Option<DateTime<Utc>>,
    pub qr_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// True when the stored QR window has lapsed.
    pub fn qr_is_expired(&self, now: DateTime<Utc>) -> bool {
        self.qr_expires_at.is_some_and(|exp| now > exp)
    }

    /// Status as seen at read time: an activated invitation whose QR window
    /// has lapsed reads as expired even before the sweep or a check-in
    /// attempt writes the transition.
    pub fn derived_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.status == InvitationStatus::Activated && self.qr_is_expired(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }
}

/// Request to create a new invitation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInvitationRequest {
    #[validate(email(message = "A valid guest email is required"))]
    pub email: String,

    /// Planned visit date (`YYYY-MM-DD`, business timezone). Defaults to
    /// an open invitation when absent.
    #[validate(custom(function = "shared::validation::validate_calendar_date"))]
    pub invite_date: Option<String>,

    pub host_id: Uuid,
    pub location_id: Uuid,
}

/// Invitation representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitationResponse {
    pub id: Uuid,
    pub guest_id: Uuid,
    pub host_id: Uuid,
    pub location_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_date: Option<NaiveDate>,
    pub status: InvitationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_issued_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Registration link credential, present on creation only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_token: Option<String>,
}

impl InvitationResponse {
    /// Response with the derived (read-time) status.
    pub fn from_invitation(invitation: Invitation, now: DateTime<Utc>) -> Self {
        let status = invitation.derived_status(now);
        Self {
            id: invitation.id,
            guest_id: invitation.guest_id,
            host_id: invitation.host_id,
            location_id: invitation.location_id,
            invite_date: invitation.invite_date,
            status,
            qr_token: invitation.qr_token,
            qr_issued_at: invitation.qr_issued_at,
            qr_expires_at: invitation.qr_expires_at,
            created_at: invitation.created_at,
            acceptance_token: None,
        }
    }

    pub fn with_acceptance_token(mut self, token: String) -> Self {
        self.acceptance_token = Some(token);
        self
    }
}

/// Query parameters for listing invitations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInvitationsQuery {
    pub guest_id: Option<Uuid>,
    pub status: Option<InvitationStatus>,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

/// Response for listing invitations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInvitationsResponse {
    pub data: Vec<InvitationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Length of a generated QR entry token.
pub const QR_TOKEN_LEN: usize = 32;

/// Generates an opaque QR entry token: random alphanumeric, 32 characters.
///
/// The token only identifies an invitation at the kiosk; it carries no
/// claims and does not constitute terms agreement.
pub fn generate_qr_token() -> String {
    let mut rng = rand::thread_rng();
    (0..QR_TOKEN_LEN)
        .map(|_| rng.sample(rand::distributions::Alphanumeric) as char)
        .collect()
}
