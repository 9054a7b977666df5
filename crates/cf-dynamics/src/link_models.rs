//! Pluggable congestion, latency and station service models.

use cf_core::numeric::thresholds::{RATED_SERVICE_MIN, SERVICE_MIN};
use cf_core::{Real, ensure_non_negative, ensure_positive};

use crate::error::DynamicsResult;

/// Outflow of a mixed or destination link as a function of its density.
///
/// Every variant is monotone non-decreasing, zero at zero density and bounded
/// by its capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutflowModel {
    /// `min(slope * x, capacity)`.
    LinearSaturating { slope: Real, capacity: Real },
    /// `capacity * (1 - exp(-steepness * x))`.
    ExponentialSaturating { capacity: Real, steepness: Real },
}

impl Default for OutflowModel {
    fn default() -> Self {
        OutflowModel::ExponentialSaturating {
            capacity: 0.5,
            steepness: 1.0,
        }
    }
}

impl OutflowModel {
    /// Shared capacity of the model.
    pub fn capacity(&self) -> Real {
        match *self {
            OutflowModel::LinearSaturating { capacity, .. }
            | OutflowModel::ExponentialSaturating { capacity, .. } => capacity,
        }
    }

    /// Outflow at density `x`, with an optional per-link capacity override.
    pub fn outflow(&self, x: Real, capacity_override: Option<Real>) -> Real {
        let x = x.max(0.0);
        let cap = capacity_override.unwrap_or_else(|| self.capacity());
        match *self {
            OutflowModel::LinearSaturating { slope, .. } => (slope * x).min(cap),
            OutflowModel::ExponentialSaturating { steepness, .. } => {
                cap * (1.0 - (-steepness * x).exp())
            }
        }
    }

    pub fn validate(&self) -> DynamicsResult<()> {
        let capacity = match *self {
            OutflowModel::LinearSaturating { slope, capacity } => {
                ensure_positive(slope, "outflow slope")?;
                capacity
            }
            OutflowModel::ExponentialSaturating {
                capacity,
                steepness,
            } => {
                ensure_positive(steepness, "outflow steepness")?;
                capacity
            }
        };
        ensure_positive(capacity, "outflow capacity")?;
        Ok(())
    }
}

/// Travel latency of a mixed or destination link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LatencyModel {
    /// `steepness * x`.
    Linear { steepness: Real },
    /// `free_flow + factor * (outflow(x) / capacity)^4`.
    Quartic { free_flow: Real, factor: Real },
}

impl Default for LatencyModel {
    fn default() -> Self {
        LatencyModel::Quartic {
            free_flow: 1.0,
            factor: 2.0,
        }
    }
}

impl LatencyModel {
    /// Latency at density `x`; the quartic form reads the link's outflow.
    pub fn latency(&self, x: Real, outflow: &OutflowModel, capacity_override: Option<Real>) -> Real {
        let x = x.max(0.0);
        match *self {
            LatencyModel::Linear { steepness } => steepness * x,
            LatencyModel::Quartic { free_flow, factor } => {
                let cap = capacity_override.unwrap_or_else(|| outflow.capacity());
                let ratio = outflow.outflow(x, capacity_override) / cap;
                free_flow + factor * ratio.powi(4)
            }
        }
    }

    pub fn validate(&self) -> DynamicsResult<()> {
        match *self {
            LatencyModel::Linear { steepness } => {
                ensure_non_negative(steepness, "latency steepness")?;
            }
            LatencyModel::Quartic { free_flow, factor } => {
                ensure_non_negative(free_flow, "free-flow latency")?;
                ensure_non_negative(factor, "congestion factor")?;
            }
        }
        Ok(())
    }
}

/// Service process of a charging station on its access link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceCurve {
    /// `min(mu, nu * x)`; waiting `x / mu`.
    Ramp,
    /// `mu * (1 - exp(-(nu / mu) * x))`; waiting `x / service`.
    #[default]
    Exponential,
}

impl ServiceCurve {
    /// Service rate (outflow of the access link) at queue density `x`.
    pub fn service(&self, x: Real, mu: Real, nu: Real) -> Real {
        let x = x.max(0.0);
        match self {
            ServiceCurve::Ramp => mu.min(nu * x),
            ServiceCurve::Exponential => {
                if mu < RATED_SERVICE_MIN {
                    0.0
                } else {
                    mu * (1.0 - (-(nu / mu) * x).exp())
                }
            }
        }
    }

    /// Expected waiting time (Little's-law proxy) at queue density `x`.
    pub fn waiting(&self, x: Real, mu: Real, nu: Real) -> Real {
        let x = x.max(0.0);
        match self {
            ServiceCurve::Ramp if mu >= RATED_SERVICE_MIN => x / mu,
            ServiceCurve::Ramp => 1.0 / nu,
            ServiceCurve::Exponential => {
                let service = self.service(x, mu, nu);
                if service > SERVICE_MIN {
                    x / service
                } else {
                    1.0 / nu
                }
            }
        }
    }
}

/// The model bundle applied to every link of a network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkModels {
    pub outflow: OutflowModel,
    pub latency: LatencyModel,
    pub service: ServiceCurve,
    /// Constant base latency of an EV-only link for EVs.
    pub access_latency: Real,
}

impl Default for LinkModels {
    fn default() -> Self {
        Self {
            outflow: OutflowModel::default(),
            latency: LatencyModel::default(),
            service: ServiceCurve::default(),
            access_latency: 0.1,
        }
    }
}

impl LinkModels {
    pub fn validate(&self) -> DynamicsResult<()> {
        self.outflow.validate()?;
        self.latency.validate()?;
        ensure_non_negative(self.access_latency, "access latency")?;
        Ok(())
    }
}
