//! Time integrators.
//!
//! - Fixed-step explicit methods (RK4, forward Euler) behind `Integrator`
//! - `Rosenbrock23`: linearly implicit, adaptive, for stiff systems

use nalgebra::{DMatrix, DVector};

use crate::error::SimResult;
use crate::jacobian::{FD_EPSILON, finite_difference_jacobian_at};
use crate::model::TransientModel;

/// Trait for fixed-step time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>>;

    /// RHS evaluations per step.
    fn evals_per_step(&self) -> usize;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>> {
        let k1 = model.rhs(t, x)?;
        let k2 = model.rhs(t + 0.5 * dt, &(x + &k1 * (0.5 * dt)))?;
        let k3 = model.rhs(t + 0.5 * dt, &(x + &k2 * (0.5 * dt)))?;
        let k4 = model.rhs(t + dt, &(x + &k3 * dt))?;

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = k1 + k2 * 2.0 + k3 * 2.0 + k4;
        Ok(x + k_sum * (dt / 6.0))
    }

    fn evals_per_step(&self) -> usize {
        4
    }
}

/// Forward Euler (explicit, 1st order, fast for testing).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &DVector<f64>,
        dt: f64,
    ) -> SimResult<DVector<f64>> {
        let xdot = model.rhs(t, x)?;
        Ok(x + xdot * dt)
    }

    fn evals_per_step(&self) -> usize {
        1
    }
}

/// Outcome of one Rosenbrock step attempt.
#[derive(Clone, Debug)]
pub enum RosenbrockAttempt {
    /// The step was computed; accept it when `error_norm <= 1`.
    Computed {
        y_new: DVector<f64>,
        /// Derivative at the new point, reusable as the next step's `f0`.
        f_new: DVector<f64>,
        error_norm: f64,
    },
    /// The iteration matrix was singular or the step produced non-finite values.
    Failed { reason: &'static str },
}

/// Rosenbrock method of order 2 with an embedded order-3 error estimate
/// (the `ode23s` scheme), for stiff systems.
///
/// The time derivative of the vector field is taken as zero; models with time
/// dependence report it through breakpoints.
#[derive(Clone, Debug)]
pub struct Rosenbrock23 {
    pub rtol: f64,
    pub atol: f64,
}

impl Rosenbrock23 {
    const D: f64 = 1.0 / (2.0 + std::f64::consts::SQRT_2);
    const E32: f64 = 6.0 + std::f64::consts::SQRT_2;

    /// Jacobian of the model at `(t, y)` with `f0 = f(t, y)`.
    pub fn jacobian<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        y: &DVector<f64>,
        f0: &DVector<f64>,
    ) -> SimResult<DMatrix<f64>> {
        finite_difference_jacobian_at(y, f0, |v| model.rhs(t, v), FD_EPSILON)
    }

    /// Attempt one step of size `h` from `(t, y)`.
    pub fn attempt<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        y: &DVector<f64>,
        f0: &DVector<f64>,
        jac: &DMatrix<f64>,
        h: f64,
    ) -> SimResult<RosenbrockAttempt> {
        let n = y.len();
        let w = DMatrix::<f64>::identity(n, n) - jac * (h * Self::D);
        let lu = w.lu();

        let Some(k1) = lu.solve(f0) else {
            return Ok(RosenbrockAttempt::Failed {
                reason: "singular iteration matrix",
            });
        };

        let f1 = model.rhs(t + 0.5 * h, &(y + &k1 * (0.5 * h)))?;
        let Some(k2) = lu.solve(&(&f1 - &k1)).map(|v| v + &k1) else {
            return Ok(RosenbrockAttempt::Failed {
                reason: "singular iteration matrix",
            });
        };

        let y_new = y + &k2 * h;
        if !y_new.iter().all(|v| v.is_finite()) {
            return Ok(RosenbrockAttempt::Failed {
                reason: "non-finite step",
            });
        }
        let f2 = model.rhs(t + h, &y_new)?;

        let rhs3 = &f2 - (&k2 - &f1) * Self::E32 - (&k1 - f0) * 2.0;
        let Some(k3) = lu.solve(&rhs3) else {
            return Ok(RosenbrockAttempt::Failed {
                reason: "singular iteration matrix",
            });
        };

        let err = (&k1 - &k2 * 2.0 + &k3) * (h / 6.0);
        let error_norm = self.error_norm(&err, y, &y_new);
        if !error_norm.is_finite() {
            return Ok(RosenbrockAttempt::Failed {
                reason: "non-finite error estimate",
            });
        }

        Ok(RosenbrockAttempt::Computed {
            y_new,
            f_new: f2,
            error_norm,
        })
    }

    /// Max norm of the error scaled by `atol + rtol * max(|y|, |y_new|)`.
    pub fn error_norm(&self, err: &DVector<f64>, y: &DVector<f64>, y_new: &DVector<f64>) -> f64 {
        err.iter()
            .zip(y.iter().zip(y_new.iter()))
            .map(|(e, (a, b))| e.abs() / (self.atol + self.rtol * a.abs().max(b.abs())))
            .fold(0.0, f64::max)
    }

    /// Step-size factor after an attempt with the given error norm.
    pub fn step_factor(error_norm: f64) -> f64 {
        if error_norm <= 0.0 {
            return 5.0;
        }
        (0.8 * error_norm.powf(-1.0 / 3.0)).clamp(0.1, 5.0)
    }
}
