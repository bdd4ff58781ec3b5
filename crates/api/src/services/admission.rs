//! Transactional check-in and the Override Authority.
//!
//! The count reads and the visit write run in one transaction serialized
//! per host with an advisory lock, so concurrent scans cannot both pass a
//! `limit - 1` read. The policy evaluator runs on the snapshot read under
//! that lock; denials leave the store untouched (except the QR-expiry
//! detection side effect, which commits on its own).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::models::{discount::crossed_threshold, Invitation, InvitationStatus, PolicyLimits};
use domain::models::{CheckInRequest, CheckInResponse, OverrideCheckInRequest, VisitResponse};
use domain::services::admission::{evaluate, AdmissionInput, AdmissionVerdict, DenialReason};
use domain::services::{NotificationRequest, Notifier};
use persistence::entities::VisitEntity;
use persistence::repositories::{CheckInRepository, HostRepository, LocationRepository};
use shared::clock::BusinessClock;
use shared::crypto::secret_matches;
use sqlx::PgPool;
use uuid::Uuid;

use super::{dispatch_notification, ServiceError};
use crate::config::Config;
use crate::middleware::metrics::record_check_in_outcome;

/// Rolling guest-limit window, in calendar days.
const ROLLING_WINDOW_DAYS: u64 = 30;

/// Context for an Override Authority bypass.
struct OverrideContext {
    reason: String,
    caller: String,
}

/// Runs the admission transaction for kiosk check-ins and overrides.
#[derive(Clone)]
pub struct AdmissionService {
    pool: PgPool,
    config: Arc<Config>,
    clock: BusinessClock,
    notifier: Arc<dyn Notifier>,
}

impl AdmissionService {
    pub fn new(
        pool: PgPool,
        config: Arc<Config>,
        clock: BusinessClock,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            config,
            clock,
            notifier,
        }
    }

    /// Kiosk check-in: look up the invitation by QR token, evaluate policy,
    /// and admit or return the structured denial.
    pub async fn check_in(&self, request: CheckInRequest) -> Result<CheckInResponse, ServiceError> {
        self.admit(&request.qr_token, request.host_id, None).await
    }

    /// Override Authority: bypass a host-capacity denial under a shared
    /// security credential, writing an append-only audit row.
    ///
    /// Credential and reason are checked before anything touches the store,
    /// so a rejected override writes nothing.
    pub async fn override_check_in(
        &self,
        request: OverrideCheckInRequest,
        caller: &str,
    ) -> Result<CheckInResponse, ServiceError> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(ServiceError::ReasonRequired);
        }
        if !secret_matches(&request.password, &self.config.security.override_password) {
            return Err(ServiceError::InvalidCredential);
        }

        self.admit(
            &request.qr_token,
            request.host_id,
            Some(OverrideContext {
                reason: reason.to_string(),
                caller: caller.to_string(),
            }),
        )
        .await
    }

    async fn admit(
        &self,
        qr_token: &str,
        host_override: Option<Uuid>,
        override_ctx: Option<OverrideContext>,
    ) -> Result<CheckInResponse, ServiceError> {
        let repo = CheckInRepository::new(self.pool.clone());
        let now = self.clock.now();

        let mut tx = repo.begin().await?;

        let invitation: Invitation = repo
            .find_invitation_by_qr_token(&mut tx, qr_token)
            .await?
            .ok_or(ServiceError::NotFound("Invitation"))?
            .into();

        match invitation.status {
            InvitationStatus::Activated => {}
            InvitationStatus::CheckedIn => return Err(ServiceError::AlreadyCheckedIn),
            // Unreachable while the presentability invariant holds: neither
            // state carries a token.
            InvitationStatus::Pending | InvitationStatus::Expired => {
                return Err(ServiceError::NotFound("Invitation"))
            }
        }

        // Lazy expiry detection: deny with a verdict, and persist the
        // transition the scan just proved necessary.
        if invitation.qr_is_expired(now) {
            repo.mark_expired(&mut tx, invitation.id).await?;
            tx.commit().await?;
            record_check_in_outcome("qr_expired");
            return Ok(CheckInResponse::denied(AdmissionVerdict::deny(
                DenialReason::QrExpired,
            )));
        }

        let host_id = host_override.unwrap_or(invitation.host_id);
        repo.lock_host(&mut tx, host_id).await?;

        let window_start = self.clock.days_ago(ROLLING_WINDOW_DAYS);
        let snapshot = repo
            .snapshot(
                &mut tx,
                invitation.guest_id,
                invitation.id,
                invitation.location_id,
                host_id,
                window_start,
                now,
            )
            .await?;

        let limits = PolicyLimits::resolve(
            snapshot
                .policy
                .as_ref()
                .map(|p| domain::models::Policy::from(p.clone()))
                .as_ref(),
            PolicyLimits {
                guest_monthly_limit: self.config.admission.guest_monthly_limit,
                host_concurrent_limit: self.config.admission.host_concurrent_limit,
            },
        );

        let input = AdmissionInput {
            blacklisted_at: snapshot.guest.blacklisted_at,
            has_valid_acceptance: snapshot.has_valid_acceptance,
            qr_expired: false,
            monthly_visit_count: snapshot.monthly_visit_count,
            host_concurrent_count: snapshot.host_concurrent_count,
            limits,
        };
        let verdict = evaluate(&input);

        match verdict {
            AdmissionVerdict::Allow => {
                let (visit, discount) = self
                    .record_admission(&repo, &mut tx, &invitation, host_id, now, None)
                    .await?;
                tx.commit().await?;
                record_check_in_outcome("admitted");
                self.after_admission(&snapshot.guest.email, snapshot.guest.name.clone(), &visit, discount)
                    .await;
                Ok(CheckInResponse::admitted(
                    AdmissionVerdict::Allow,
                    VisitResponse::from(domain::models::Visit::from(visit)),
                ))
            }
            AdmissionVerdict::Deny { reason } => match override_ctx {
                Some(ctx) if reason.is_overridable() => {
                    let (visit, discount) = self
                        .record_admission(&repo, &mut tx, &invitation, host_id, now, Some(&ctx))
                        .await?;
                    repo.insert_override_log(&mut tx, visit.id, &ctx.caller, &ctx.reason)
                        .await?;
                    tx.commit().await?;
                    record_check_in_outcome("overridden");
                    tracing::warn!(
                        visit_id = %visit.id,
                        caller = %ctx.caller,
                        denied = %reason,
                        "Capacity denial overridden"
                    );
                    self.after_admission(
                        &snapshot.guest.email,
                        snapshot.guest.name.clone(),
                        &visit,
                        discount,
                    )
                    .await;
                    Ok(CheckInResponse::admitted(
                        AdmissionVerdict::Allow,
                        VisitResponse::from(domain::models::Visit::from(visit)),
                    ))
                }
                _ => {
                    // Rolls back implicitly when the transaction drops.
                    record_check_in_outcome("denied");
                    tracing::info!(
                        invitation_id = %invitation.id,
                        denied = %reason,
                        "Check-in denied"
                    );
                    Ok(CheckInResponse::denied(AdmissionVerdict::Deny { reason }))
                }
            },
        }
    }

    /// The admitted check-in mutation plus discount threshold detection,
    /// all inside the caller's transaction.
    async fn record_admission(
        &self,
        repo: &CheckInRepository,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        invitation: &Invitation,
        host_id: Uuid,
        now: DateTime<Utc>,
        override_ctx: Option<&OverrideContext>,
    ) -> Result<(VisitEntity, Option<i64>), ServiceError> {
        let expires_at = self
            .clock
            .add_hours(now, self.config.admission.visit_duration_hours);

        let visit = repo
            .record_check_in(
                tx,
                invitation.id,
                host_id,
                now,
                expires_at,
                override_ctx.map(|c| c.reason.as_str()),
                override_ctx.map(|c| c.caller.as_str()),
            )
            .await?
            .ok_or(ServiceError::AlreadyCheckedIn)?;

        let lifetime = repo.lifetime_visit_count(tx, invitation.guest_id).await?;
        let discount = if crossed_threshold(lifetime, self.config.admission.discount_visit_threshold)
        {
            repo.insert_discount(tx, invitation.guest_id, lifetime).await?;
            Some(lifetime)
        } else {
            None
        };

        Ok((visit, discount))
    }

    /// Post-commit notification fan-out. Failures here never affect the
    /// admission outcome.
    async fn after_admission(
        &self,
        guest_email: &str,
        guest_name: Option<String>,
        visit: &VisitEntity,
        discount: Option<i64>,
    ) {
        let Some(visit_count) = discount else {
            return;
        };

        let host_name = HostRepository::new(self.pool.clone())
            .find_by_id(visit.host_id)
            .await
            .ok()
            .flatten()
            .map(|h| h.name)
            .unwrap_or_default();
        let location_name = LocationRepository::new(self.pool.clone())
            .find_by_id(visit.location_id)
            .await
            .ok()
            .flatten()
            .map(|l| l.name)
            .unwrap_or_default();

        tracing::info!(
            guest_id = %visit.guest_id,
            visit_count,
            "Discount threshold crossed"
        );

        dispatch_notification(
            self.notifier.clone(),
            NotificationRequest::discount(
                guest_email,
                guest_name.unwrap_or_default(),
                host_name,
                location_name,
                visit_count,
            ),
        );
    }
}
