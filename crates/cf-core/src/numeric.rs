use crate::CfError;

/// Floating point type used throughout system
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CfError::NonFinite { what, value: v })
    }
}

/// Require a finite, strictly positive value.
pub fn ensure_positive(v: Real, what: &'static str) -> Result<Real, CfError> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(CfError::InvalidArg { what })
    }
}

/// Require a finite, non-negative value.
pub fn ensure_non_negative(v: Real, what: &'static str) -> Result<Real, CfError> {
    let v = ensure_finite(v, what)?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err(CfError::InvalidArg { what })
    }
}

pub fn all_finite(values: &[Real]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Thresholds used by the dynamics core when guarding degenerate quantities.
pub mod thresholds {
    use super::Real;

    /// Raw path flows are floored here before renormalization.
    pub const FLOW_FLOOR: Real = 1e-10;
    /// Below this raw OD sum the renormalization falls back to a uniform split.
    pub const FLOW_SUM_MIN: Real = 1e-9;
    /// Target demand at or below this is degenerate (no replicator update).
    pub const DEMAND_MIN: Real = 1e-9;
    /// Routing denominators at or below this leave the row empty.
    pub const ROUTING_MIN: Real = 1e-9;
    /// Prices never drop below this floor.
    pub const PRICE_FLOOR: Real = 0.01;
    /// Service rates at or below this use the ramp-limited waiting time.
    pub const SERVICE_MIN: Real = 1e-6;
    /// Rated service rates below this mean the station is closed.
    pub const RATED_SERVICE_MIN: Real = 1e-9;
}
