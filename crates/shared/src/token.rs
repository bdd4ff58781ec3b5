//! Acceptance token issuance and verification.
//!
//! Acceptance tokens are HS256-signed JWTs that authorize a guest to
//! complete self-service registration and record terms agreement. Claims are
//! self-contained, so verification needs no database round trip. A token is
//! scoped to exactly one invitation or one visit, never both; the scope is
//! enforced at construction and re-checked on verification.
//!
//! Verification never surfaces an error to the caller: forged, malformed,
//! mis-scoped, or expired tokens all collapse to `None`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for token issuance. Verification has no error type.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),
}

/// What an acceptance token is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptanceScope {
    Invitation,
    Visit,
}

/// Claims carried by an acceptance token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceClaims {
    /// Scope tag; decides which of the id fields must be present.
    #[serde(rename = "typ")]
    pub scope: AcceptanceScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_id: Option<Uuid>,
    pub guest_id: Uuid,
    pub guest_email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl AcceptanceClaims {
    /// Claims for an invitation-scoped token.
    pub fn for_invitation(
        invitation_id: Uuid,
        guest_id: Uuid,
        guest_email: impl Into<String>,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        Self {
            scope: AcceptanceScope::Invitation,
            invitation_id: Some(invitation_id),
            visit_id: None,
            guest_id,
            guest_email: guest_email.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + validity).timestamp(),
        }
    }

    /// Claims for a visit-scoped token.
    pub fn for_visit(
        visit_id: Uuid,
        guest_id: Uuid,
        guest_email: impl Into<String>,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        Self {
            scope: AcceptanceScope::Visit,
            invitation_id: None,
            visit_id: Some(visit_id),
            guest_id,
            guest_email: guest_email.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + validity).timestamp(),
        }
    }

    /// True when the id fields match the declared scope exactly.
    fn scope_is_consistent(&self) -> bool {
        match self.scope {
            AcceptanceScope::Invitation => {
                self.invitation_id.is_some() && self.visit_id.is_none()
            }
            AcceptanceScope::Visit => self.visit_id.is_some() && self.invitation_id.is_none(),
        }
    }
}

/// Default acceptance token validity window.
pub const DEFAULT_VALIDITY_DAYS: i64 = 7;

/// Signs and verifies acceptance tokens with a server secret.
#[derive(Clone)]
pub struct AcceptanceTokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl std::fmt::Debug for AcceptanceTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceptanceTokenSigner")
            .field("validity", &self.validity)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl AcceptanceTokenSigner {
    /// Creates a signer from the configured server secret.
    pub fn new(secret: &str, validity_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validity: Duration::days(validity_days),
        }
    }

    /// The validity window applied to issued tokens.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issues a token for an invitation-scoped acceptance.
    pub fn issue_for_invitation(
        &self,
        invitation_id: Uuid,
        guest_id: Uuid,
        guest_email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.sign(&AcceptanceClaims::for_invitation(
            invitation_id,
            guest_id,
            guest_email,
            now,
            self.validity,
        ))
    }

    /// Issues a token for a visit-scoped acceptance.
    pub fn issue_for_visit(
        &self,
        visit_id: Uuid,
        guest_id: Uuid,
        guest_email: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        self.sign(&AcceptanceClaims::for_visit(
            visit_id,
            guest_id,
            guest_email,
            now,
            self.validity,
        ))
    }

    /// Signs an arbitrary claims object. Exposed for tests that need to
    /// craft inconsistent claims.
    pub fn sign(&self, claims: &AcceptanceClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingError(e.to_string()))
    }

    /// Verifies a token against `now` and returns its claims.
    ///
    /// Returns `None` when the signature is invalid, the token is malformed,
    /// the id fields do not match the declared scope, or the expiration is in
    /// the past. Signature and structure checks run before any claim
    /// inspection.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<AcceptanceClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below, not wall time.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<AcceptanceClaims>(token, &self.decoding_key, &validation)
            .ok()?
            .claims;

        if !claims.scope_is_consistent() {
            return None;
        }
        if now.timestamp() >= claims.exp {
            return None;
        }
        Some(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AcceptanceTokenSigner {
        AcceptanceTokenSigner::new("test_secret_key_for_token_testing_12345", 7)
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-15T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_invitation_token_round_trip() {
        let signer = signer();
        let invitation_id = Uuid::new_v4();
        let guest_id = Uuid::new_v4();

        let token = signer
            .issue_for_invitation(invitation_id, guest_id, "guest@x.com", now())
            .unwrap();
        let claims = signer.verify(&token, now()).unwrap();

        assert_eq!(claims.scope, AcceptanceScope::Invitation);
        assert_eq!(claims.invitation_id, Some(invitation_id));
        assert_eq!(claims.visit_id, None);
        assert_eq!(claims.guest_id, guest_id);
        assert_eq!(claims.guest_email, "guest@x.com");
    }

    #[test]
    fn test_visit_token_round_trip() {
        let signer = signer();
        let visit_id = Uuid::new_v4();
        let guest_id = Uuid::new_v4();

        let token = signer
            .issue_for_visit(visit_id, guest_id, "guest@x.com", now())
            .unwrap();
        let claims = signer.verify(&token, now()).unwrap();

        assert_eq!(claims.scope, AcceptanceScope::Visit);
        assert_eq!(claims.visit_id, Some(visit_id));
        assert_eq!(claims.invitation_id, None);
    }

    #[test]
    fn test_round_trip_preserves_full_claims() {
        let signer = signer();
        let claims =
            AcceptanceClaims::for_invitation(Uuid::new_v4(), Uuid::new_v4(), "a@b.c", now(), Duration::days(7));
        let token = signer.sign(&claims).unwrap();
        assert_eq!(signer.verify(&token, now()).unwrap(), claims);
    }

    #[test]
    fn test_wrong_secret_fails_regardless_of_claims() {
        let other = AcceptanceTokenSigner::new("a_completely_different_secret", 7);
        let token = other
            .issue_for_invitation(Uuid::new_v4(), Uuid::new_v4(), "guest@x.com", now())
            .unwrap();

        assert!(signer().verify(&token, now()).is_none());
    }

    #[test]
    fn test_expired_token_fails() {
        let signer = signer();
        let token = signer
            .issue_for_invitation(Uuid::new_v4(), Uuid::new_v4(), "guest@x.com", now())
            .unwrap();

        // Valid one second before expiry...
        let just_before = now() + Duration::days(7) - Duration::seconds(1);
        assert!(signer.verify(&token, just_before).is_some());

        // ...failure at and after the 7-day mark.
        let at_expiry = now() + Duration::days(7);
        assert!(signer.verify(&token, at_expiry).is_none());
        assert!(signer.verify(&token, at_expiry + Duration::days(1)).is_none());
    }

    #[test]
    fn test_malformed_token_fails() {
        let signer = signer();
        assert!(signer.verify("not_a_jwt", now()).is_none());
        assert!(signer.verify("only.two", now()).is_none());
        assert!(signer.verify("", now()).is_none());
        assert!(signer.verify("a.b.c", now()).is_none());
    }

    #[test]
    fn test_scope_field_mismatch_fails() {
        let signer = signer();

        // Invitation scope without an invitation id.
        let mut claims =
            AcceptanceClaims::for_invitation(Uuid::new_v4(), Uuid::new_v4(), "a@b.c", now(), Duration::days(7));
        claims.invitation_id = None;
        let token = signer.sign(&claims).unwrap();
        assert!(signer.verify(&token, now()).is_none());

        // Visit scope carrying both ids.
        let mut claims =
            AcceptanceClaims::for_visit(Uuid::new_v4(), Uuid::new_v4(), "a@b.c", now(), Duration::days(7));
        claims.invitation_id = Some(Uuid::new_v4());
        let token = signer.sign(&claims).unwrap();
        assert!(signer.verify(&token, now()).is_none());
    }

    #[test]
    fn test_acceptance_token_does_not_verify_with_qr_semantics() {
        // An opaque QR string is never a valid acceptance token.
        let signer = signer();
        assert!(signer.verify("A7kQzP3mX9rT2wN5bV8cD1fG", now()).is_none());
    }

    #[test]
    fn test_token_has_three_parts() {
        let token = signer()
            .issue_for_invitation(Uuid::new_v4(), Uuid::new_v4(), "guest@x.com", now())
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }
}
