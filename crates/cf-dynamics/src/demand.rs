//! Travel demand per OD pair and vehicle class.

use std::collections::BTreeMap;

use cf_core::{CfError, CfResult, LinkId, Real, ensure_non_negative};
use cf_network::{Network, PathSet, VehicleClass};
use tracing::warn;

use crate::error::{DynamicsError, DynamicsResult};

/// Demand configuration of a single origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginDemand {
    /// Total inflow rate.
    pub total: Real,
    /// Fraction of the total that is electric, in [0, 1].
    pub ev_share: Real,
    /// Destination identifier -> fraction of the total.
    pub splits: BTreeMap<String, Real>,
}

impl OriginDemand {
    pub fn new(total: Real, ev_share: Real) -> Self {
        Self {
            total,
            ev_share,
            splits: BTreeMap::new(),
        }
    }

    pub fn with_split(mut self, destination: impl Into<String>, fraction: Real) -> Self {
        self.splits.insert(destination.into(), fraction);
        self
    }

    fn validate(&self, origin: &str) -> DynamicsResult<()> {
        self.check().map_err(|reason| DynamicsError::InvalidDemand {
            origin: origin.to_string(),
            reason,
        })
    }

    fn check(&self) -> CfResult<()> {
        ensure_non_negative(self.total, "total rate")?;
        if ensure_non_negative(self.ev_share, "EV share")? > 1.0 {
            return Err(CfError::InvalidArg {
                what: "EV share must lie in [0, 1]",
            });
        }
        for fraction in self.splits.values() {
            ensure_non_negative(*fraction, "split fraction")?;
        }
        Ok(())
    }
}

/// Demand configuration keyed by origin identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemandConfig {
    origins: BTreeMap<String, OriginDemand>,
}

impl DemandConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(mut self, origin: impl Into<String>, demand: OriginDemand) -> Self {
        self.insert(origin, demand);
        self
    }

    pub fn insert(&mut self, origin: impl Into<String>, demand: OriginDemand) {
        self.origins.insert(origin.into(), demand);
    }

    pub fn get(&self, origin: &str) -> Option<&OriginDemand> {
        self.origins.get(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OriginDemand)> {
        self.origins.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Target rates of one OD pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OdDemand {
    pub ev: Real,
    pub nev: Real,
}

impl OdDemand {
    pub fn class(&self, class: VehicleClass) -> Real {
        match class {
            VehicleClass::Ev => self.ev,
            VehicleClass::Nev => self.nev,
        }
    }

    pub fn total(&self) -> Real {
        self.ev + self.nev
    }
}

/// Target demand aligned with the active OD pairs of a path set.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandModel {
    per_od: Vec<OdDemand>,
    /// Outflow rate of every origin link, indexed by link slot.
    origin_rates: Vec<Real>,
}

impl DemandModel {
    /// Resolve the configuration against the network and active OD pairs.
    ///
    /// Origins absent from the configuration carry zero demand. A destination
    /// identifier unknown to the network is an error.
    pub fn new(network: &Network, paths: &PathSet, config: &DemandConfig) -> DynamicsResult<Self> {
        for (origin, demand) in config.iter() {
            demand.validate(origin)?;
            if network.find_origin(origin).is_none() {
                warn!(origin, "demand configured for an origin the network does not have");
            }
            for destination in demand.splits.keys() {
                if network.find_destination(destination).is_none() {
                    return Err(DynamicsError::UnknownDestination {
                        origin: origin.to_string(),
                        destination: destination.clone(),
                    });
                }
            }
            let split_sum: Real = demand.splits.values().sum();
            if (split_sum - 1.0).abs() > 1e-6 {
                warn!(origin, split_sum, "destination split fractions do not sum to 1");
            }
        }

        let mut per_od = Vec::with_capacity(paths.len());
        let mut origin_rates = vec![0.0; network.link_count()];

        for od_paths in paths.pairs() {
            let od = od_paths.od;
            let origin = network.origin_name(od.origin);
            let destination = network.destination_name(od.destination);

            let rates = match (origin.and_then(|o| config.get(o)), destination) {
                (Some(demand), Some(dest)) => {
                    let split = demand.splits.get(dest).copied().unwrap_or(0.0);
                    let pair_total = demand.total * split;
                    OdDemand {
                        ev: pair_total * demand.ev_share,
                        nev: pair_total * (1.0 - demand.ev_share),
                    }
                }
                _ => OdDemand::default(),
            };

            origin_rates[od.origin.slot()] += rates.total();
            per_od.push(rates);
        }

        Ok(Self {
            per_od,
            origin_rates,
        })
    }

    /// Target demand of an active OD pair for one class.
    pub fn target(&self, od: usize, class: VehicleClass) -> Real {
        self.per_od.get(od).map_or(0.0, |d| d.class(class))
    }

    pub fn od(&self, od: usize) -> Option<OdDemand> {
        self.per_od.get(od).copied()
    }

    /// Outflow rate of an origin link (zero for any other link).
    pub fn origin_rate(&self, link: LinkId) -> Real {
        self.origin_rates.get(link.slot()).copied().unwrap_or(0.0)
    }

    /// Total demand over all active OD pairs.
    pub fn total(&self) -> Real {
        self.per_od.iter().map(OdDemand::total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::nearly_equal;
    use cf_core::Tolerances;
    use cf_network::{NetworkBuilder, PathEnumerator};

    fn two_destinations() -> Network {
        let mut b = NetworkBuilder::new();
        let o = b.add_node("O", [0.0, 0.0]);
        let d1 = b.add_node("D1", [1.0, 0.0]);
        let d2 = b.add_node("D2", [1.0, 1.0]);
        b.add_origin(o, "O1");
        b.add_mixed(o, d1);
        b.add_mixed(o, d2);
        b.add_destination(d1, "D1");
        b.add_destination(d2, "D2");
        b.build().unwrap()
    }

    #[test]
    fn splits_and_shares() {
        let net = two_destinations();
        let paths = PathEnumerator::new(&net).enumerate_all().unwrap();
        let config = DemandConfig::new().with_origin(
            "O1",
            OriginDemand::new(2.0, 0.25)
                .with_split("D1", 0.5)
                .with_split("D2", 0.5),
        );
        let demand = DemandModel::new(&net, &paths, &config).unwrap();
        let tol = Tolerances::default();

        assert!(nearly_equal(demand.target(0, VehicleClass::Ev), 0.25, tol));
        assert!(nearly_equal(demand.target(0, VehicleClass::Nev), 0.75, tol));
        assert!(nearly_equal(demand.target(1, VehicleClass::Ev), 0.25, tol));
        assert!(nearly_equal(demand.total(), 2.0, tol));

        let origin = net.find_origin("O1").unwrap();
        assert!(nearly_equal(demand.origin_rate(origin), 2.0, tol));
    }

    #[test]
    fn origin_rate_counts_active_pairs_only() {
        let net = two_destinations();
        let paths = PathEnumerator::new(&net).enumerate_all().unwrap();
        let config = DemandConfig::new()
            .with_origin("O1", OriginDemand::new(1.0, 0.5).with_split("D1", 0.4));
        let demand = DemandModel::new(&net, &paths, &config).unwrap();
        let origin = net.find_origin("O1").unwrap();
        assert!(nearly_equal(
            demand.origin_rate(origin),
            0.4,
            Tolerances::default()
        ));
        assert_eq!(demand.target(1, VehicleClass::Ev), 0.0);
    }

    #[test]
    fn missing_origin_has_zero_demand() {
        let net = two_destinations();
        let paths = PathEnumerator::new(&net).enumerate_all().unwrap();
        let demand = DemandModel::new(&net, &paths, &DemandConfig::new()).unwrap();
        assert_eq!(demand.total(), 0.0);
        assert_eq!(demand.target(0, VehicleClass::Nev), 0.0);
    }

    #[test]
    fn unknown_destination_rejected() {
        let net = two_destinations();
        let paths = PathEnumerator::new(&net).enumerate_all().unwrap();
        let config = DemandConfig::new()
            .with_origin("O1", OriginDemand::new(1.0, 0.5).with_split("D9", 1.0));
        let err = DemandModel::new(&net, &paths, &config).unwrap_err();
        assert!(matches!(err, DynamicsError::UnknownDestination { .. }));
    }

    #[test]
    fn invalid_share_rejected() {
        let net = two_destinations();
        let paths = PathEnumerator::new(&net).enumerate_all().unwrap();
        let config = DemandConfig::new()
            .with_origin("O1", OriginDemand::new(1.0, 1.5).with_split("D1", 1.0));
        let err = DemandModel::new(&net, &paths, &config).unwrap_err();
        assert!(matches!(
            err,
            DynamicsError::InvalidDemand {
                reason: CfError::InvalidArg { .. },
                ..
            }
        ));
    }
}
