//! Application services orchestrating the admission and invitation
//! lifecycle over the repositories.

pub mod admission;
pub mod lifecycle;

pub use admission::AdmissionService;
pub use lifecycle::LifecycleService;

use domain::services::{NotificationRequest, NotificationResult, Notifier};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the lifecycle and admission services. Policy denials
/// are NOT errors; they travel as verdict values in the check-in envelope.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invitation is already activated")]
    AlreadyActivated,

    #[error("Invitation is already checked in")]
    AlreadyCheckedIn,

    #[error("Visit is already checked out")]
    AlreadyCheckedOut,

    #[error("Invitation is not expired")]
    NotExpired,

    #[error("Invitation deadline has passed")]
    InviteExpired,

    #[error("Invalid or expired registration token")]
    InvalidToken,

    #[error("Invalid override credential")]
    InvalidCredential,

    #[error("Override reason is required")]
    ReasonRequired,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// Fire-and-forget notification dispatch. A delivery failure is logged and
/// never rolls back the lifecycle transition that triggered it.
pub(crate) fn dispatch_notification(notifier: Arc<dyn Notifier>, request: NotificationRequest) {
    tokio::spawn(async move {
        if let NotificationResult::Failed(error) = notifier.deliver(request).await {
            tracing::warn!(error = %error, "Notification dispatch failed");
        }
    });
}
