//! TransientModel trait for pluggable dynamic systems.

use nalgebra::DVector;

use crate::error::SimResult;

/// Trait for transient (dynamic) system models with a flat real state.
///
/// A TransientModel must implement:
/// - Initial state
/// - RHS (right-hand side) computation: x_dot = f(t, x)
///
/// The RHS must be a pure function of `(t, x)`: implicit integrators call it
/// at trial points, repeatedly and out of order.
pub trait TransientModel {
    /// Return the initial state.
    fn initial_state(&self) -> DVector<f64>;

    /// Compute state derivative dxdt = f(t, x).
    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>>;

    /// Times at which the model changes discontinuously.
    ///
    /// Integration restarts at each breakpoint and never steps across one.
    fn breakpoints(&self) -> Vec<f64> {
        Vec::new()
    }
}
