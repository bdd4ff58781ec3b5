//! Notification triggers emitted by lifecycle transitions.
//!
//! The engine decides *whether* and *what* to notify; rendering and
//! transport belong to the external email collaborator. Dispatch is
//! fire-and-forget: a failed delivery is logged and never affects the
//! lifecycle outcome that triggered it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification kind enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Invitation,
    Discount,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationKind::Invitation => write!(f, "invitation"),
            NotificationKind::Discount => write!(f, "discount"),
        }
    }
}

/// Structured request handed to the email collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub kind: NotificationKind,
    pub to: String,
    pub guest_name: String,
    pub host_name: String,
    pub location_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<i64>,
}

impl NotificationRequest {
    /// Invitation notification (created or activated; the QR fields are
    /// present once a token exists).
    pub fn invitation(
        to: impl Into<String>,
        guest_name: impl Into<String>,
        host_name: impl Into<String>,
        location_name: impl Into<String>,
    ) -> Self {
        Self {
            kind: NotificationKind::Invitation,
            to: to.into(),
            guest_name: guest_name.into(),
            host_name: host_name.into(),
            location_name: location_name.into(),
            qr_token: None,
            expires_at: None,
            visit_count: None,
        }
    }

    /// Discount-earned notification.
    pub fn discount(
        to: impl Into<String>,
        guest_name: impl Into<String>,
        host_name: impl Into<String>,
        location_name: impl Into<String>,
        visit_count: i64,
    ) -> Self {
        Self {
            kind: NotificationKind::Discount,
            to: to.into(),
            guest_name: guest_name.into(),
            host_name: host_name.into(),
            location_name: location_name.into(),
            qr_token: None,
            expires_at: None,
            visit_count: Some(visit_count),
        }
    }

    pub fn with_qr(mut self, qr_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        self.qr_token = Some(qr_token.into());
        self.expires_at = Some(expires_at);
        self
    }
}

/// Result of a notification dispatch attempt.
#[derive(Debug, Clone)]
pub enum NotificationResult {
    /// Request was handed to the collaborator.
    Sent,
    /// Dispatch failed (non-blocking).
    Failed(String),
    /// Dispatch was skipped (e.g. notifications disabled).
    Skipped,
}

/// Collaborator that delivers notification requests.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, request: NotificationRequest) -> NotificationResult;
}

/// Logs notification requests instead of delivering them. Production
/// default until an email transport is wired in.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn deliver(&self, request: NotificationRequest) -> NotificationResult {
        tracing::info!(
            kind = %request.kind,
            to = %request.to,
            guest = %request.guest_name,
            host = %request.host_name,
            location = %request.location_name,
            "Notification requested"
        );
        NotificationResult::Sent
    }
}

/// Records notification requests for tests.
#[derive(Debug, Default)]
pub struct MockNotifier {
    /// Whether to simulate delivery failures.
    pub simulate_failure: bool,
    delivered: tokio::sync::Mutex<Vec<NotificationRequest>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            delivered: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Requests recorded so far.
    pub async fn delivered(&self) -> Vec<NotificationRequest> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn deliver(&self, request: NotificationRequest) -> NotificationResult {
        if self.simulate_failure {
            tracing::warn!(kind = %request.kind, to = %request.to, "Mock notifier simulating failure");
            return NotificationResult::Failed("Simulated failure".to_string());
        }
        self.delivered.lock().await.push(request);
        NotificationResult::Sent
    }
}
