//! cf-dynamics: the coupled traffic and charging-competition vector field.
//!
//! Provides:
//! - Demand targets per OD pair and vehicle class
//! - Station parameter providers (fixed, piecewise schedules)
//! - Pluggable outflow, latency and service models
//! - State layout, routing matrix, replicator route choice, price law
//! - `DynamicsEngine`: the right-hand side consumed by the integrator

pub mod cost;
pub mod demand;
pub mod engine;
pub mod error;
pub mod flows;
pub mod layout;
pub mod link_models;
pub mod pricing;
pub mod routing;
pub mod stations;

pub use cost::{CostModel, path_cost};
pub use demand::{DemandConfig, DemandModel, OdDemand, OriginDemand};
pub use engine::{DynamicsConfig, DynamicsEngine, Snapshot};
pub use error::{DynamicsError, DynamicsResult};
pub use flows::{renormalize, replicator_rates};
pub use layout::StateLayout;
pub use link_models::{LatencyModel, LinkModels, OutflowModel, ServiceCurve};
pub use pricing::{PricingMode, floor_price, price_rate};
pub use routing::RoutingMatrixBuilder;
pub use stations::{FixedStations, PiecewiseSchedule, StationParameterProvider, StationParams};
