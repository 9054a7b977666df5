//! Simulation runner and result recording.

use nalgebra::DVector;
use tracing::{debug, trace, warn};

use crate::error::{SimError, SimResult};
use crate::integrator::{ForwardEuler, Integrator, RK4, Rosenbrock23, RosenbrockAttempt};
use crate::model::TransientModel;

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Adaptive linearly implicit Rosenbrock (default, for stiff systems).
    #[default]
    Rosenbrock23,
    /// 4th-order Runge-Kutta with fixed step `fixed_dt`.
    RK4,
    /// Forward Euler with fixed step `fixed_dt`.
    ForwardEuler,
}

/// Times at which the solution is sampled.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalTimes {
    /// `n` evenly spaced times from `t_start` to `t_end` inclusive.
    Linspace(usize),
    /// Explicit, strictly increasing times within `[t_start, t_end]`.
    Explicit(Vec<f64>),
}

/// Options for simulation runs.
#[derive(Clone, Debug, PartialEq)]
pub struct SimOptions {
    pub t_start: f64,
    pub t_end: f64,
    pub eval: EvalTimes,
    /// Relative tolerance (adaptive integrator)
    pub rtol: f64,
    /// Absolute tolerance (adaptive integrator)
    pub atol: f64,
    /// Largest step the adaptive integrator may take
    pub max_step: f64,
    /// Step size below which integration is declared failed
    pub min_step: f64,
    /// Initial step; derived from the span when unset
    pub first_step: Option<f64>,
    /// Step of the fixed-step integrators
    pub fixed_dt: f64,
    /// Maximum number of step attempts (safety limit)
    pub max_steps: usize,
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_start: 0.0,
            t_end: 1.0,
            eval: EvalTimes::Linspace(101),
            rtol: 1e-3,
            atol: 1e-6,
            max_step: f64::INFINITY,
            min_step: 1e-12,
            first_step: None,
            fixed_dt: 1e-3,
            max_steps: 1_000_000,
            integrator: IntegratorType::default(),
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |what| Err(SimError::InvalidArg { what });
        if !(self.t_start.is_finite() && self.t_end.is_finite()) {
            return invalid("time span must be finite");
        }
        if self.t_end <= self.t_start {
            return invalid("t_end must be greater than t_start");
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return invalid("tolerances must be positive");
        }
        if !(self.max_step > 0.0) {
            return invalid("max_step must be positive");
        }
        if !(self.min_step > 0.0 && self.min_step <= self.max_step) {
            return invalid("min_step must be positive and not above max_step");
        }
        if let Some(h) = self.first_step {
            if !(h.is_finite() && h > 0.0) {
                return invalid("first_step must be positive");
            }
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be positive");
        }
        if self.integrator != IntegratorType::Rosenbrock23
            && !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0)
        {
            return invalid("fixed_dt must be positive");
        }
        Ok(())
    }

    /// Resolve the sample times.
    pub fn eval_times(&self) -> SimResult<Vec<f64>> {
        match &self.eval {
            EvalTimes::Linspace(n) if *n < 2 => Err(SimError::InvalidArg {
                what: "linspace needs at least two points",
            }),
            EvalTimes::Linspace(n) => {
                let span = self.t_end - self.t_start;
                let last = n - 1;
                Ok((0..*n)
                    .map(|i| {
                        if i == last {
                            self.t_end
                        } else {
                            self.t_start + span * i as f64 / last as f64
                        }
                    })
                    .collect())
            }
            EvalTimes::Explicit(times) => {
                if times.is_empty() {
                    return Err(SimError::InvalidArg {
                        what: "no evaluation times",
                    });
                }
                if times.iter().any(|t| !(*t >= self.t_start && *t <= self.t_end)) {
                    return Err(SimError::InvalidArg {
                        what: "evaluation times must lie within the span",
                    });
                }
                if times.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(SimError::InvalidArg {
                        what: "evaluation times must be strictly increasing",
                    });
                }
                Ok(times.clone())
            }
        }
    }
}

/// Work counters of one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimStats {
    pub rhs_evals: usize,
    pub jacobian_evals: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
}

/// Sampled solution of a run.
///
/// On integration failure `success` is false and the samples produced before
/// the failure are kept.
#[derive(Clone, Debug)]
pub struct Solution {
    /// Sample times
    pub t: Vec<f64>,
    /// State at each sample time
    pub x: Vec<DVector<f64>>,
    pub success: bool,
    pub message: String,
    pub stats: SimStats,
}

impl Solution {
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn final_state(&self) -> Option<&DVector<f64>> {
        self.x.last()
    }
}

enum Segment {
    Reached,
    Failed(String),
}

/// Run a transient simulation.
///
/// Steps land exactly on evaluation times and never cross a model breakpoint.
pub fn run_sim<M: TransientModel>(model: &M, opts: &SimOptions) -> SimResult<Solution> {
    opts.validate()?;
    let eval = opts.eval_times()?;

    let mut breaks: Vec<f64> = model
        .breakpoints()
        .into_iter()
        .filter(|b| b.is_finite() && *b > opts.t_start && *b < opts.t_end)
        .collect();
    breaks.sort_by(|a, b| a.total_cmp(b));
    breaks.dedup();

    debug!(
        integrator = ?opts.integrator,
        t_start = opts.t_start,
        t_end = opts.t_end,
        samples = eval.len(),
        breakpoints = breaks.len(),
        "starting integration"
    );

    let mut runner = Runner {
        model,
        opts,
        eval: &eval,
        next_eval: 0,
        t: opts.t_start,
        y: model.initial_state(),
        h: opts
            .first_step
            .unwrap_or(((opts.t_end - opts.t_start) * 1e-3).min(opts.max_step))
            .max(opts.min_step),
        steps: 0,
        solution: Solution {
            t: Vec::with_capacity(eval.len()),
            x: Vec::with_capacity(eval.len()),
            success: false,
            message: String::new(),
            stats: SimStats::default(),
        },
    };
    runner.record();

    for seg_end in breaks.into_iter().chain(std::iter::once(opts.t_end)) {
        let outcome = match opts.integrator {
            IntegratorType::Rosenbrock23 => runner.rosenbrock_segment(seg_end)?,
            IntegratorType::RK4 => runner.fixed_segment(&RK4, seg_end)?,
            IntegratorType::ForwardEuler => runner.fixed_segment(&ForwardEuler, seg_end)?,
        };
        if let Segment::Failed(message) = outcome {
            warn!(%message, samples = runner.solution.len(), "integration failed");
            runner.solution.message = message;
            return Ok(runner.solution);
        }
    }

    runner.solution.success = true;
    runner.solution.message = "integration reached the end of the span".to_string();
    debug!(stats = ?runner.solution.stats, "integration finished");
    Ok(runner.solution)
}

struct Runner<'a, M: TransientModel> {
    model: &'a M,
    opts: &'a SimOptions,
    eval: &'a [f64],
    next_eval: usize,
    t: f64,
    y: DVector<f64>,
    /// Proposed step for the adaptive integrator
    h: f64,
    steps: usize,
    solution: Solution,
}

impl<M: TransientModel> Runner<'_, M> {
    /// Record every pending evaluation time reached by `t`.
    fn record(&mut self) {
        while self.next_eval < self.eval.len() && self.eval[self.next_eval] <= self.t {
            self.solution.t.push(self.eval[self.next_eval]);
            self.solution.x.push(self.y.clone());
            self.next_eval += 1;
        }
    }

    /// Next point a step must land on: an evaluation time or the segment end.
    fn next_stop(&self, seg_end: f64) -> f64 {
        self.eval
            .get(self.next_eval)
            .copied()
            .filter(|&e| e < seg_end)
            .unwrap_or(seg_end)
    }

    fn budget_exhausted(&mut self) -> Option<Segment> {
        if self.steps >= self.opts.max_steps {
            return Some(Segment::Failed(format!(
                "step budget of {} exhausted at t = {:.6}",
                self.opts.max_steps, self.t
            )));
        }
        self.steps += 1;
        None
    }

    fn fixed_segment<I: Integrator>(&mut self, integrator: &I, seg_end: f64) -> SimResult<Segment> {
        while self.t < seg_end {
            if let Some(failed) = self.budget_exhausted() {
                return Ok(failed);
            }
            let target = self.next_stop(seg_end);
            let remaining = target - self.t;
            let lands = self.opts.fixed_dt >= remaining;
            let dt = if lands { remaining } else { self.opts.fixed_dt };

            let y_new = integrator.step(self.model, self.t, &self.y, dt)?;
            self.solution.stats.rhs_evals += integrator.evals_per_step();
            if !y_new.iter().all(|v| v.is_finite()) {
                return Ok(Segment::Failed(format!("non-finite state at t = {:.6}", self.t)));
            }
            self.solution.stats.accepted_steps += 1;
            self.y = y_new;
            self.t = if lands { target } else { self.t + dt };
            self.record();
        }
        Ok(Segment::Reached)
    }

    fn rosenbrock_segment(&mut self, seg_end: f64) -> SimResult<Segment> {
        let rb = Rosenbrock23 {
            rtol: self.opts.rtol,
            atol: self.opts.atol,
        };
        let n = self.y.len();

        let mut f0 = self.model.rhs(self.t, &self.y)?;
        if f0.len() != n {
            return Err(SimError::Dimension {
                expected: n,
                got: f0.len(),
            });
        }
        let mut jac = rb.jacobian(self.model, self.t, &self.y, &f0)?;
        self.solution.stats.rhs_evals += 1 + n;
        self.solution.stats.jacobian_evals += 1;

        while self.t < seg_end {
            if let Some(failed) = self.budget_exhausted() {
                return Ok(failed);
            }
            let target = self.next_stop(seg_end);
            let remaining = target - self.t;
            let lands = self.h >= remaining;
            let h_try = if lands { remaining } else { self.h };

            let attempt = rb.attempt(self.model, self.t, &self.y, &f0, &jac, h_try)?;
            match attempt {
                RosenbrockAttempt::Computed {
                    y_new,
                    f_new,
                    error_norm,
                } if error_norm <= 1.0 => {
                    self.solution.stats.rhs_evals += 2;
                    self.solution.stats.accepted_steps += 1;
                    self.t = if lands { target } else { self.t + h_try };
                    self.y = y_new;
                    f0 = f_new;
                    self.record();

                    let grown = h_try * Rosenbrock23::step_factor(error_norm);
                    // A step shortened to land on a stop does not shrink the proposal
                    self.h = (if lands { grown.max(self.h) } else { grown }).min(self.opts.max_step);

                    if self.t < seg_end {
                        jac = rb.jacobian(self.model, self.t, &self.y, &f0)?;
                        self.solution.stats.rhs_evals += n;
                        self.solution.stats.jacobian_evals += 1;
                    }
                }
                RosenbrockAttempt::Computed { error_norm, .. } => {
                    self.solution.stats.rhs_evals += 2;
                    self.solution.stats.rejected_steps += 1;
                    self.h = h_try * Rosenbrock23::step_factor(error_norm).min(0.9);
                    trace!(t = self.t, h_try, error_norm, "rejected step");
                }
                RosenbrockAttempt::Failed { reason } => {
                    self.solution.stats.rejected_steps += 1;
                    self.h = h_try * 0.5;
                    trace!(t = self.t, h_try, reason, "rejected step");
                }
            }

            if self.h < self.opts.min_step {
                return Ok(Segment::Failed(format!(
                    "step size {:.3e} fell below the minimum at t = {:.6}",
                    self.h, self.t
                )));
            }
        }
        Ok(Segment::Reached)
    }
}
