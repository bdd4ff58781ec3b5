//! Invitation lifecycle orchestration.
//!
//! Owns the PENDING -> ACTIVATED -> CHECKED_IN / EXPIRED state machine for
//! everything except the check-in transition itself, which lives in
//! [`super::AdmissionService`] because it must run inside the serialized
//! admission transaction.

use std::sync::Arc;

use domain::models::{
    generate_qr_token, CreateInvitationRequest, Guest, GuestResponse, Invitation,
    InvitationResponse, InvitationStatus, ListInvitationsQuery, ListInvitationsResponse,
    RegisterGuestRequest, VisitResponse,
};
use domain::services::{NotificationRequest, Notifier};
use persistence::repositories::{
    AcceptanceRepository, GuestRepository, HostRepository, InvitationRepository,
    LocationRepository, VisitRepository,
};
use shared::clock::{parse_calendar_date, BusinessClock};
use shared::crypto::acceptance_signature;
use shared::token::{AcceptanceScope, AcceptanceTokenSigner};
use sqlx::PgPool;
use uuid::Uuid;

use super::{dispatch_notification, ServiceError};
use crate::config::Config;

/// Orchestrates invitation creation, activation, reissue, expiry, guest
/// registration, and check-out.
#[derive(Clone)]
pub struct LifecycleService {
    pool: PgPool,
    config: Arc<Config>,
    clock: BusinessClock,
    signer: Arc<AcceptanceTokenSigner>,
    notifier: Arc<dyn Notifier>,
}

impl LifecycleService {
    pub fn new(
        pool: PgPool,
        config: Arc<Config>,
        clock: BusinessClock,
        signer: Arc<AcceptanceTokenSigner>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            config,
            clock,
            signer,
            notifier,
        }
    }

    /// Create a pending invitation, finding or creating the guest by email.
    ///
    /// Re-inviting an existing guest reuses the row without touching
    /// completed profile fields. The response carries the acceptance token
    /// for the registration link; the invitation notification is queued for
    /// the email collaborator.
    pub async fn create_invitation(
        &self,
        request: CreateInvitationRequest,
    ) -> Result<InvitationResponse, ServiceError> {
        let invite_date = request
            .invite_date
            .as_deref()
            .map(parse_calendar_date)
            .transpose()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let host = HostRepository::new(self.pool.clone())
            .find_by_id(request.host_id)
            .await?
            .ok_or(ServiceError::NotFound("Host"))?;
        let location = LocationRepository::new(self.pool.clone())
            .find_by_id(request.location_id)
            .await?
            .ok_or(ServiceError::NotFound("Location"))?;

        let guest = GuestRepository::new(self.pool.clone())
            .find_or_create_by_email(request.email.trim())
            .await?;

        let invitation = InvitationRepository::new(self.pool.clone())
            .create(guest.id, host.id, location.id, invite_date)
            .await?;

        let now = self.clock.now();
        let acceptance_token = self
            .signer
            .issue_for_invitation(invitation.id, guest.id, &guest.email, now)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        tracing::info!(
            invitation_id = %invitation.id,
            guest_id = %guest.id,
            host_id = %host.id,
            "Invitation created"
        );

        dispatch_notification(
            self.notifier.clone(),
            NotificationRequest::invitation(
                &guest.email,
                guest.name.clone().unwrap_or_default(),
                &host.name,
                &location.name,
            ),
        );

        Ok(
            InvitationResponse::from_invitation(invitation.into(), now)
                .with_acceptance_token(acceptance_token),
        )
    }

    /// Activate a pending invitation: issue the QR entry token and open its
    /// validity window.
    pub async fn activate(&self, invitation_id: Uuid) -> Result<InvitationResponse, ServiceError> {
        let repo = InvitationRepository::new(self.pool.clone());
        let invitation: Invitation = repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?
            .into();

        if invitation.status != InvitationStatus::Pending {
            return Err(ServiceError::AlreadyActivated);
        }
        self.check_invite_deadline(&invitation)?;

        let issued_at = self.clock.now();
        let expires_at = self
            .clock
            .add_days(issued_at, self.config.admission.qr_token_validity_days);
        let qr_token = generate_qr_token();

        let activated = repo
            .activate(invitation_id, &qr_token, issued_at, expires_at)
            .await?
            // Lost the race with a concurrent activation.
            .ok_or(ServiceError::AlreadyActivated)?;

        tracing::info!(invitation_id = %invitation_id, qr_expires_at = %expires_at, "Invitation activated");

        self.notify_qr_issued(&activated.clone().into()).await?;

        Ok(InvitationResponse::from_invitation(activated.into(), issued_at))
    }

    /// Reissue a fresh QR token for an expired invitation.
    pub async fn reissue(&self, invitation_id: Uuid) -> Result<InvitationResponse, ServiceError> {
        let repo = InvitationRepository::new(self.pool.clone());
        let invitation: Invitation = repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?
            .into();

        let now = self.clock.now();
        match invitation.derived_status(now) {
            InvitationStatus::Expired => {}
            _ => return Err(ServiceError::NotExpired),
        }
        self.check_invite_deadline(&invitation)?;

        // Write-through for a lazily detected expiry so the reissue
        // predicate sees a stored 'expired' row.
        if invitation.status == InvitationStatus::Activated {
            repo.mark_expired(invitation_id).await?;
        }

        let issued_at = now;
        let expires_at = self
            .clock
            .add_days(issued_at, self.config.admission.qr_token_validity_days);
        let qr_token = generate_qr_token();

        let reissued = repo
            .reissue(invitation_id, &qr_token, issued_at, expires_at)
            .await?
            .ok_or(ServiceError::NotExpired)?;

        tracing::info!(invitation_id = %invitation_id, "Invitation reissued");

        self.notify_qr_issued(&reissued.clone().into()).await?;

        Ok(InvitationResponse::from_invitation(reissued.into(), issued_at))
    }

    /// Explicitly expire an activated invitation. Idempotent.
    pub async fn mark_expired(
        &self,
        invitation_id: Uuid,
    ) -> Result<InvitationResponse, ServiceError> {
        let repo = InvitationRepository::new(self.pool.clone());
        repo.find_by_id(invitation_id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?;

        repo.mark_expired(invitation_id).await?;

        let invitation = repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?;

        Ok(InvitationResponse::from_invitation(
            invitation.into(),
            self.clock.now(),
        ))
    }

    /// Fetch one invitation with its derived (read-time) status.
    pub async fn get(&self, invitation_id: Uuid) -> Result<InvitationResponse, ServiceError> {
        let invitation = InvitationRepository::new(self.pool.clone())
            .find_by_id(invitation_id)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?;

        Ok(InvitationResponse::from_invitation(
            invitation.into(),
            self.clock.now(),
        ))
    }

    /// List invitations, newest first, keyset-paginated.
    pub async fn list(
        &self,
        query: ListInvitationsQuery,
    ) -> Result<ListInvitationsResponse, ServiceError> {
        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let cursor = query
            .cursor
            .as_deref()
            .map(shared::pagination::decode_cursor)
            .transpose()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;

        let rows = InvitationRepository::new(self.pool.clone())
            .list(
                query.guest_id,
                query.status.map(|s| s.as_str()),
                cursor,
                limit + 1,
            )
            .await?;

        let now = self.clock.now();
        let has_more = rows.len() as i64 > limit;
        let data: Vec<InvitationResponse> = rows
            .into_iter()
            .take(limit as usize)
            .map(|row| InvitationResponse::from_invitation(row.into(), now))
            .collect();
        let next_cursor = if has_more {
            data.last()
                .map(|last| shared::pagination::encode_cursor(last.created_at, last.id))
        } else {
            None
        };

        Ok(ListInvitationsResponse { data, next_cursor })
    }

    /// Guest self-service registration: verify the acceptance token,
    /// complete the profile, and upsert the terms acceptance atomically.
    pub async fn register_guest(
        &self,
        request: RegisterGuestRequest,
    ) -> Result<GuestResponse, ServiceError> {
        let now = self.clock.now();
        let claims = self
            .signer
            .verify(&request.token, now)
            .ok_or(ServiceError::InvalidToken)?;

        if !request.accept_terms {
            return Err(ServiceError::Validation(
                "Terms must be accepted to register".to_string(),
            ));
        }

        let guests = GuestRepository::new(self.pool.clone());
        let guest: Guest = guests
            .find_by_id(claims.guest_id)
            .await?
            .ok_or(ServiceError::NotFound("Guest"))?
            .into();

        // A token minted for a purged-and-recreated guest must not carry over.
        if !guest.email.eq_ignore_ascii_case(&claims.guest_email) {
            return Err(ServiceError::InvalidToken);
        }

        let updated = guests
            .complete_profile(
                guest.id,
                request.name.trim(),
                request.phone.as_deref(),
                request.company.as_deref(),
                now,
            )
            .await?;

        let expires_at = self
            .clock
            .add_days(now, self.config.admission.acceptance_token_validity_days);
        let acceptances = AcceptanceRepository::new(self.pool.clone());
        match claims.scope {
            AcceptanceScope::Invitation => {
                let invitation_id = claims.invitation_id.ok_or(ServiceError::InvalidToken)?;
                let signature = acceptance_signature(
                    &self.config.security.token_secret,
                    &format!("{}:{}:{}", guest.id, invitation_id, now.to_rfc3339()),
                );
                acceptances
                    .upsert_for_invitation(
                        guest.id,
                        invitation_id,
                        now,
                        expires_at,
                        &signature,
                        request.ip_address.as_deref(),
                    )
                    .await?;
            }
            AcceptanceScope::Visit => {
                let visit_id = claims.visit_id.ok_or(ServiceError::InvalidToken)?;
                let signature = acceptance_signature(
                    &self.config.security.token_secret,
                    &format!("{}:{}:{}", guest.id, visit_id, now.to_rfc3339()),
                );
                acceptances
                    .upsert_for_visit(
                        guest.id,
                        visit_id,
                        now,
                        expires_at,
                        &signature,
                        request.ip_address.as_deref(),
                    )
                    .await?;
            }
        }

        tracing::info!(guest_id = %guest.id, "Guest profile completed");

        Ok(GuestResponse::from(Guest::from(updated)))
    }

    /// Blacklist a guest.
    pub async fn blacklist_guest(&self, guest_id: Uuid) -> Result<(), ServiceError> {
        let updated = GuestRepository::new(self.pool.clone())
            .set_blacklisted(guest_id)
            .await?;
        if updated == 0 {
            return Err(ServiceError::NotFound("Guest"));
        }
        tracing::warn!(guest_id = %guest_id, "Guest blacklisted");
        Ok(())
    }

    /// Clear a guest's blacklist stamp.
    pub async fn unblacklist_guest(&self, guest_id: Uuid) -> Result<(), ServiceError> {
        let updated = GuestRepository::new(self.pool.clone())
            .clear_blacklisted(guest_id)
            .await?;
        if updated == 0 {
            return Err(ServiceError::NotFound("Guest"));
        }
        Ok(())
    }

    /// Administrative purge of a guest and dependents, in fixed order.
    pub async fn purge_guest(&self, guest_id: Uuid) -> Result<(), ServiceError> {
        let purged = GuestRepository::new(self.pool.clone()).purge(guest_id).await?;
        if !purged {
            return Err(ServiceError::NotFound("Guest"));
        }
        tracing::warn!(guest_id = %guest_id, "Guest purged");
        Ok(())
    }

    /// Check out a visit; the only mutation a visit allows after creation.
    pub async fn check_out(&self, visit_id: Uuid) -> Result<VisitResponse, ServiceError> {
        let repo = VisitRepository::new(self.pool.clone());
        match repo.check_out(visit_id, self.clock.now()).await? {
            Some(visit) => Ok(VisitResponse::from(domain::models::Visit::from(visit))),
            None => match repo.find_by_id(visit_id).await? {
                Some(_) => Err(ServiceError::AlreadyCheckedOut),
                None => Err(ServiceError::NotFound("Visit")),
            },
        }
    }

    /// Activation is pointless once the invite day is over, and same-day
    /// activation closes at the entry cutoff hour.
    fn check_invite_deadline(&self, invitation: &Invitation) -> Result<(), ServiceError> {
        let Some(date) = invitation.invite_date else {
            return Ok(());
        };
        let now = self.clock.now();
        if now >= self.clock.end_of_day(date) {
            return Err(ServiceError::InviteExpired);
        }
        if date == self.clock.now_in_zone().date_naive()
            && self.clock.is_after_cutoff(self.config.admission.cutoff_hour)
        {
            return Err(ServiceError::InviteExpired);
        }
        Ok(())
    }

    /// Queue the invitation notification carrying the freshly issued QR
    /// token.
    async fn notify_qr_issued(&self, invitation: &Invitation) -> Result<(), ServiceError> {
        let guest = GuestRepository::new(self.pool.clone())
            .find_by_id(invitation.guest_id)
            .await?
            .ok_or(ServiceError::NotFound("Guest"))?;
        let host = HostRepository::new(self.pool.clone())
            .find_by_id(invitation.host_id)
            .await?
            .ok_or(ServiceError::NotFound("Host"))?;
        let location = LocationRepository::new(self.pool.clone())
            .find_by_id(invitation.location_id)
            .await?
            .ok_or(ServiceError::NotFound("Location"))?;

        let mut request = NotificationRequest::invitation(
            &guest.email,
            guest.name.unwrap_or_default(),
            &host.name,
            &location.name,
        );
        if let (Some(token), Some(expires_at)) =
            (invitation.qr_token.clone(), invitation.qr_expires_at)
        {
            request = request.with_qr(token, expires_at);
        }
        dispatch_notification(self.notifier.clone(), request);
        Ok(())
    }
}
