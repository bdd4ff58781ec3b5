//! Domain models for Visitor Gate.

pub mod acceptance;
pub mod discount;
pub mod guest;
pub mod host;
pub mod invitation;
pub mod location;
pub mod override_log;
pub mod policy;
pub mod visit;

pub use acceptance::Acceptance;
pub use discount::Discount;
pub use guest::{Guest, GuestResponse, RegisterGuestRequest};
pub use host::Host;
pub use invitation::{
    generate_qr_token, CreateInvitationRequest, Invitation, InvitationResponse, InvitationStatus,
    ListInvitationsQuery, ListInvitationsResponse, QR_TOKEN_LEN,
};
pub use location::Location;
pub use override_log::OverrideLog;
pub use policy::{Policy, PolicyLimits};
pub use visit::{CheckInRequest, CheckInResponse, OverrideCheckInRequest, Visit, VisitResponse};
