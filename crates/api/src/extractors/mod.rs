//! Custom Axum extractors.

pub mod caller;

#[allow(unused_imports)] // Re-exports for downstream use
pub use caller::{CallerIdentity, CALLER_ID_HEADER};
