//! Repository implementations for database operations.

pub mod acceptance;
pub mod check_in;
pub mod guest;
pub mod host;
pub mod invitation;
pub mod location;
pub mod override_log;
pub mod policy;
pub mod visit;

pub use acceptance::AcceptanceRepository;
pub use check_in::{CheckInRepository, CheckInSnapshot};
pub use guest::GuestRepository;
pub use host::HostRepository;
pub use invitation::InvitationRepository;
pub use location::LocationRepository;
pub use override_log::OverrideLogRepository;
pub use policy::PolicyRepository;
pub use visit::VisitRepository;
