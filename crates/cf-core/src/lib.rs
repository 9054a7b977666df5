//! cf-core: stable foundation for chargeflow.
//!
//! Contains:
//! - numeric (Real + tolerances + thresholds shared by the dynamics core)
//! - ids (compact node/link IDs and station identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CfError, CfResult};
pub use ids::*;
pub use numeric::*;
