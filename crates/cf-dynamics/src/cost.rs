//! Perceived link and path costs.

use cf_core::Real;
use cf_network::{Link, LinkKind, Path};

use crate::link_models::LinkModels;
use crate::stations::StationParams;

/// Weights that turn latency, price and waiting into a single cost.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub models: LinkModels,
    /// Weight of expected waiting time at a station.
    pub alpha: Real,
    /// Conversion of price into time units.
    pub price_weight: Real,
}

impl CostModel {
    /// Cost of traversing one link at density `x`.
    ///
    /// `station` holds the station parameters and effective price for an
    /// EV-only link. Origin links cost nothing.
    pub fn link_cost(&self, link: &Link, x: Real, station: Option<(&StationParams, Real)>) -> Real {
        match (&link.kind, station) {
            (LinkKind::Origin { .. }, _) => 0.0,
            (LinkKind::EvOnly { .. }, Some((params, price))) => {
                let waiting = self
                    .models
                    .service
                    .waiting(x, params.service_rate, params.ramp);
                self.models.access_latency + self.price_weight * price + self.alpha * waiting
            }
            (LinkKind::EvOnly { .. }, None) => self.models.access_latency,
            (LinkKind::Mixed { .. } | LinkKind::Destination { .. }, _) => {
                self.models
                    .latency
                    .latency(x, &self.models.outflow, link.capacity_override())
            }
        }
    }
}

/// Sum of per-link costs along a path.
pub fn path_cost(path: &Path, link_costs: &[Real]) -> Real {
    path.links()
        .iter()
        .map(|l| link_costs.get(l.slot()).copied().unwrap_or(0.0))
        .sum()
}
