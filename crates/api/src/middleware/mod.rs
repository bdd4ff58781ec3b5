//! HTTP middleware components.

pub mod logging;
pub mod metrics;

#[allow(unused_imports)] // Re-exports for downstream use
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
