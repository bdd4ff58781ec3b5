//! Guest domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A guest identity record. Created on first invitation; completed by
/// guest self-service registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Guest {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub profile_completed: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub blacklisted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    /// True when staff have blacklisted this guest.
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted_at.is_some()
    }
}

/// Guest self-service registration submitted with an acceptance token.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RegisterGuestRequest {
    /// Acceptance token from the invitation email link.
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,

    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,

    #[validate(length(max = 40, message = "phone must be at most 40 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 120, message = "company must be at most 120 characters"))]
    pub company: Option<String>,

    /// Must be true; registration doubles as terms agreement.
    pub accept_terms: bool,

    /// Client IP recorded on the acceptance, when the caller knows it.
    pub ip_address: Option<String>,
}

/// Guest representation returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GuestResponse {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub profile_completed: bool,
    pub terms_accepted_at: Option<DateTime<Utc>>,
    pub blacklisted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Guest> for GuestResponse {
    fn from(guest: Guest) -> Self {
        Self {
            id: guest.id,
            email: guest.email,
            name: guest.name,
            phone: guest.phone,
            company: guest.company,
            profile_completed: guest.profile_completed,
            terms_accepted_at: guest.terms_accepted_at,
            blacklisted: guest.blacklisted_at.is_some(),
            created_at: guest.created_at,
        }
    }
}
