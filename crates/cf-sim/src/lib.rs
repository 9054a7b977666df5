//! cf-sim: transient simulation of flat-state dynamic systems.
//!
//! Provides:
//! - `TransientModel` trait
//! - Fixed-step RK4 and forward Euler, adaptive Rosenbrock23 for stiff systems
//! - Finite-difference Jacobians
//! - `run_sim` with evaluation grids, breakpoints and partial solutions

pub mod error;
pub mod integrator;
pub mod jacobian;
pub mod model;
pub mod sim;

pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, RK4, Rosenbrock23, RosenbrockAttempt};
pub use jacobian::{FD_EPSILON, finite_difference_jacobian, finite_difference_jacobian_at};
pub use model::TransientModel;
pub use sim::{EvalTimes, IntegratorType, SimOptions, SimStats, Solution, run_sim};
