//! Charging-station parameters, fixed or time-indexed.

use std::collections::BTreeMap;

use cf_core::{
    CfError, CfResult, Real, StationId, ensure_finite, ensure_non_negative, ensure_positive,
};

use crate::error::{DynamicsError, DynamicsResult};

/// Parameter record of one charging station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationParams {
    /// Rated service rate (mu).
    pub service_rate: Real,
    /// Ramp coefficient (nu): service grows with queue density at this rate.
    pub ramp: Real,
    /// Operating cost per unit served.
    pub operating_cost: Real,
    /// Price (fixed, scheduled, or initial price under adaptive pricing).
    pub price: Real,
    /// Price-adjustment speed (kappa). Zero freezes the price.
    pub price_speed: Real,
}

impl Default for StationParams {
    fn default() -> Self {
        Self {
            service_rate: 1.5,
            ramp: 10.0,
            operating_cost: 0.1,
            price: 0.5,
            price_speed: 0.05,
        }
    }
}

impl StationParams {
    pub fn validate(&self, station: &StationId) -> DynamicsResult<()> {
        self.check().map_err(|reason| DynamicsError::InvalidStation {
            station: station.clone(),
            reason,
        })
    }

    fn check(&self) -> CfResult<()> {
        ensure_non_negative(self.service_rate, "service rate")?;
        // Waiting time falls back to 1 / ramp when service vanishes.
        ensure_positive(self.ramp, "ramp coefficient")?;
        ensure_finite(self.operating_cost, "operating cost")?;
        ensure_non_negative(self.price, "price")?;
        ensure_non_negative(self.price_speed, "price speed")?;
        Ok(())
    }
}

/// Source of station parameters as a pure function of time.
pub trait StationParameterProvider: Send + Sync {
    /// Parameters of `station` in effect at time `t`.
    fn params(&self, t: Real, station: &StationId) -> StationParams;

    /// Times at which parameters jump. Integration never steps across them.
    fn breakpoints(&self) -> Vec<Real> {
        Vec::new()
    }
}

/// Label reported when a fallback record fails validation.
const FALLBACK: &str = "<fallback>";

/// Constant parameters per station with a fallback record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixedStations {
    stations: BTreeMap<StationId, StationParams>,
    fallback: StationParams,
}

impl FixedStations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters of every station without its own entry.
    pub fn with_fallback(mut self, fallback: StationParams) -> DynamicsResult<Self> {
        fallback.validate(&StationId::from(FALLBACK))?;
        self.fallback = fallback;
        Ok(self)
    }

    pub fn with_station(
        mut self,
        station: impl Into<StationId>,
        params: StationParams,
    ) -> DynamicsResult<Self> {
        let station = station.into();
        params.validate(&station)?;
        self.stations.insert(station, params);
        Ok(self)
    }
}

impl StationParameterProvider for FixedStations {
    fn params(&self, _t: Real, station: &StationId) -> StationParams {
        self.stations.get(station).copied().unwrap_or(self.fallback)
    }
}

/// Piecewise-constant schedule: per station, segments `(start_time, params)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PiecewiseSchedule {
    segments: BTreeMap<StationId, Vec<(Real, StationParams)>>,
    fallback: StationParams,
}

impl PiecewiseSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters of every station without its own entry.
    pub fn with_fallback(mut self, fallback: StationParams) -> DynamicsResult<Self> {
        fallback.validate(&StationId::from(FALLBACK))?;
        self.fallback = fallback;
        Ok(self)
    }

    /// Add the segments of one station. Segments are sorted by start time.
    pub fn with_station(
        mut self,
        station: impl Into<StationId>,
        mut segments: Vec<(Real, StationParams)>,
    ) -> DynamicsResult<Self> {
        let station = station.into();
        if segments.is_empty() {
            return Err(DynamicsError::InvalidStation {
                station,
                reason: CfError::InvalidArg {
                    what: "schedule needs at least one segment",
                },
            });
        }
        for (start, params) in &segments {
            if let Err(reason) = ensure_finite(*start, "segment start") {
                return Err(DynamicsError::InvalidStation { station, reason });
            }
            params.validate(&station)?;
        }
        segments.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.segments.insert(station, segments);
        Ok(self)
    }
}

impl StationParameterProvider for PiecewiseSchedule {
    fn params(&self, t: Real, station: &StationId) -> StationParams {
        let Some(segments) = self.segments.get(station) else {
            return self.fallback;
        };
        // Last segment starting at or before t; the first one before any start.
        let after = segments.partition_point(|(start, _)| *start <= t);
        let idx = after.saturating_sub(1);
        segments.get(idx).map_or(self.fallback, |(_, p)| *p)
    }

    fn breakpoints(&self) -> Vec<Real> {
        let mut points: Vec<Real> = self
            .segments
            .values()
            .flat_map(|segs| segs.iter().map(|(start, _)| *start))
            .filter(|start| *start > 0.0)
            .collect();
        points.sort_by(|a, b| a.total_cmp(b));
        points.dedup();
        points
    }
}
