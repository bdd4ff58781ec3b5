//! Domain services for Visitor Gate.
//!
//! Services contain business logic that operates on domain models.

pub mod admission;
pub mod notification;

pub use admission::{evaluate, AdmissionInput, AdmissionVerdict, DenialReason};

pub use notification::{
    ConsoleNotifier, MockNotifier, NotificationKind, NotificationRequest, NotificationResult,
    Notifier,
};
