//! Application service layer for chargeflow.
//!
//! Compiles scenario files into dynamics engines, runs them through the
//! integrator and post-processes the trajectories. Sweeps run independent
//! scenario variants in parallel.

pub mod compile;
pub mod error;
pub mod run;
pub mod sweep;

pub use compile::{ScenarioRuntime, compile_scenario};
pub use error::{AppError, AppResult};
pub use run::{RunReport, ScenarioModel, build_trajectory, run_scenario};
pub use sweep::{price_sweep, set_station_price, sweep};
