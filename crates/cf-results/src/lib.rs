//! cf-results: trajectories, stability diagnostics and station metrics.

pub mod metrics;
pub mod stability;
pub mod types;

pub use metrics::{
    EquilibriumSummary, StationMetrics, equilibrium, ev_charging_share, station_metrics,
    station_metrics_window, trapezoid,
};
pub use stability::{
    GrowingQueue, OscillatingLink, StabilityChecker, StabilityReport, StabilityThresholds,
};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResultsError {
    #[error("Malformed trajectory: {what}")]
    Shape { what: String },

    #[error("No samples in window [{t0}, {t1}]")]
    EmptyWindow { t0: f64, t1: f64 },
}
