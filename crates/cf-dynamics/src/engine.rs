//! The coupled traffic, route-choice and pricing vector field.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use cf_core::{Real, all_finite, ensure_finite, ensure_non_negative};
use cf_network::{LinkKind, Network, PathSet, StationIndex, VehicleClass};

use crate::cost::{CostModel, path_cost};
use crate::demand::DemandModel;
use crate::error::{DynamicsError, DynamicsResult};
use crate::flows::{renormalize, replicator_rates};
use crate::layout::StateLayout;
use crate::link_models::LinkModels;
use crate::pricing::{PricingMode, floor_price, price_rate};
use crate::routing::RoutingMatrixBuilder;
use crate::stations::{StationParameterProvider, StationParams};

/// Behavioral parameters of the dynamics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsConfig {
    /// Imitation rate of EV users.
    pub eta_ev: Real,
    /// Imitation rate of non-EV users.
    pub eta_nev: Real,
    /// Weight of waiting time in the EV charging cost.
    pub alpha: Real,
    /// Conversion of price into time units.
    pub price_weight: Real,
    pub models: LinkModels,
    pub pricing: PricingMode,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            eta_ev: 0.05,
            eta_nev: 0.05,
            alpha: 0.3,
            price_weight: 1.0,
            models: LinkModels::default(),
            pricing: PricingMode::default(),
        }
    }
}

impl DynamicsConfig {
    pub fn eta(&self, class: VehicleClass) -> Real {
        match class {
            VehicleClass::Ev => self.eta_ev,
            VehicleClass::Nev => self.eta_nev,
        }
    }

    pub fn validate(&self) -> DynamicsResult<()> {
        ensure_non_negative(self.eta_ev, "EV imitation rate")?;
        ensure_non_negative(self.eta_nev, "non-EV imitation rate")?;
        ensure_non_negative(self.alpha, "waiting weight")?;
        ensure_finite(self.price_weight, "price weight")?;
        self.models.validate()
    }

    fn cost_model(&self) -> CostModel {
        CostModel {
            models: self.models,
            alpha: self.alpha,
            price_weight: self.price_weight,
        }
    }
}

/// Every intermediate quantity of one derivative evaluation.
#[derive(Debug, Clone)]
pub struct Snapshot<'a> {
    layout: &'a StateLayout,
    pub t: Real,
    /// The state as the derivative sees it: clamped densities, renormalized
    /// flows and floored prices.
    pub effective: Vec<Real>,
    /// Effective price per station, in station-index order.
    pub prices: Vec<Real>,
    /// Station parameters at `t`, in station-index order.
    pub station_params: Vec<StationParams>,
    /// Outflow rate of every link.
    pub outflows: Vec<Real>,
    pub routing: DMatrix<Real>,
    /// Per-link cost (EV-only links priced for EVs).
    pub link_costs: Vec<Real>,
    /// Path costs, laid out like the flow blocks of the state.
    pub path_costs: Vec<Real>,
}

impl Snapshot<'_> {
    pub fn densities(&self) -> &[Real] {
        self.layout.densities(&self.effective)
    }

    pub fn flows(&self, od: usize, class: VehicleClass) -> &[Real] {
        self.layout.flows(&self.effective, od, class)
    }

    pub fn path_costs(&self, od: usize, class: VehicleClass) -> &[Real] {
        &self.path_costs[self.layout.od_range(od, class)]
    }
}

/// Right-hand side of the coupled system.
///
/// Built once per scenario from immutable network, path, demand and station
/// data; evaluation is a pure function of `(t, state)`.
pub struct DynamicsEngine {
    network: Network,
    paths: PathSet,
    demand: DemandModel,
    stations: Box<dyn StationParameterProvider>,
    station_index: StationIndex,
    /// Station position served by each link, if EV-only.
    link_station: Vec<Option<usize>>,
    layout: StateLayout,
    config: DynamicsConfig,
}

impl DynamicsEngine {
    pub fn new(
        network: Network,
        paths: PathSet,
        demand: DemandModel,
        stations: Box<dyn StationParameterProvider>,
        config: DynamicsConfig,
    ) -> DynamicsResult<Self> {
        config.validate()?;

        let station_index = StationIndex::from_network(&network);
        let link_station = network
            .links()
            .iter()
            .map(|l| station_index.position_of_link(l.id))
            .collect();
        let n_prices = if config.pricing.has_price_state() {
            station_index.len()
        } else {
            0
        };
        let layout = StateLayout::new(network.link_count(), &paths, n_prices);

        debug!(
            links = layout.link_count(),
            od_pairs = layout.od_count(),
            stations = station_index.len(),
            state_len = layout.len(),
            pricing = ?config.pricing,
            "assembled dynamics"
        );

        Ok(Self {
            network,
            paths,
            demand,
            stations,
            station_index,
            link_station,
            layout,
            config,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn paths(&self) -> &PathSet {
        &self.paths
    }

    pub fn demand(&self) -> &DemandModel {
        &self.demand
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    pub fn station_index(&self) -> &StationIndex {
        &self.station_index
    }

    pub fn config(&self) -> &DynamicsConfig {
        &self.config
    }

    pub fn stations(&self) -> &dyn StationParameterProvider {
        self.stations.as_ref()
    }

    /// Times at which station parameters jump.
    pub fn breakpoints(&self) -> Vec<Real> {
        self.stations.breakpoints()
    }

    /// Initial condition: given (or zero) densities, demand split uniformly
    /// over each OD pair's paths, and the stations' initial prices.
    pub fn initial_state(&self, densities: Option<&[Real]>) -> DynamicsResult<Vec<Real>> {
        let n = self.layout.link_count();
        let densities = match densities {
            Some(d) if d.len() != n => {
                return Err(DynamicsError::StateLength {
                    expected: n,
                    got: d.len(),
                });
            }
            Some(d) => d.to_vec(),
            None => vec![0.0; n],
        };

        let mut flows = [Vec::new(), Vec::new()];
        for (slot, class) in VehicleClass::ALL.into_iter().enumerate() {
            for (od, od_paths) in self.paths.pairs().iter().enumerate() {
                let count = od_paths.paths(class).len();
                let share = self.demand.target(od, class) / count.max(1) as Real;
                flows[slot].extend(std::iter::repeat_n(share, count));
            }
        }

        let prices: Vec<Real> = if self.config.pricing.has_price_state() {
            self.station_index
                .stations()
                .iter()
                .map(|s| self.stations.params(0.0, s).price)
                .collect()
        } else {
            Vec::new()
        };

        self.layout.pack(&densities, &flows[0], &flows[1], &prices)
    }

    /// Evaluate every intermediate quantity at `(t, state)`.
    pub fn snapshot(&self, t: Real, state: &[Real]) -> DynamicsResult<Snapshot<'_>> {
        self.layout.check(state)?;
        if !all_finite(state) {
            return Err(DynamicsError::NonFiniteState);
        }
        Ok(self.evaluate(t, state))
    }

    /// Derivative of the state at `(t, state)`.
    ///
    /// A state with any non-finite component yields an all-zero derivative.
    pub fn rhs(&self, t: Real, state: &[Real]) -> DynamicsResult<Vec<Real>> {
        self.layout.check(state)?;
        let mut out = vec![0.0; state.len()];
        if !all_finite(state) {
            return Ok(out);
        }
        let snap = self.evaluate(t, state);
        self.derivative_into(&snap, &mut out);
        Ok(out)
    }

    fn evaluate(&self, t: Real, state: &[Real]) -> Snapshot<'_> {
        let layout = &self.layout;
        let n = layout.link_count();
        let mut effective = vec![0.0; state.len()];

        for (e, x) in effective[..n].iter_mut().zip(layout.densities(state)) {
            *e = x.max(0.0);
        }

        for class in VehicleClass::ALL {
            for od in 0..layout.od_count() {
                let range = layout.od_range(od, class);
                renormalize(
                    &state[range.clone()],
                    self.demand.target(od, class),
                    &mut effective[range],
                );
            }
        }

        let station_params: Vec<StationParams> = self
            .station_index
            .stations()
            .iter()
            .map(|s| self.stations.params(t, s))
            .collect();

        let prices: Vec<Real> = match self.config.pricing {
            PricingMode::Adaptive => layout.prices(state).iter().map(|&p| floor_price(p)).collect(),
            PricingMode::Scheduled => station_params.iter().map(|p| floor_price(p.price)).collect(),
        };
        let price_range = layout.price_range();
        let price_len = price_range.len();
        effective[price_range].copy_from_slice(&prices[..price_len]);

        let models = &self.config.models;
        let outflows: Vec<Real> = self
            .network
            .links()
            .iter()
            .map(|link| {
                let x = effective[link.id.slot()];
                match &link.kind {
                    LinkKind::Origin { .. } => self.demand.origin_rate(link.id),
                    LinkKind::EvOnly { .. } => self.link_station[link.id.slot()]
                        .and_then(|pos| station_params.get(pos))
                        .map_or(0.0, |p| models.service.service(x, p.service_rate, p.ramp)),
                    LinkKind::Mixed { .. } | LinkKind::Destination { .. } => {
                        models.outflow.outflow(x, link.capacity_override())
                    }
                }
            })
            .collect();

        let routing = RoutingMatrixBuilder::new(layout, &self.paths).build(&effective);

        let cost_model = self.config.cost_model();
        let link_costs: Vec<Real> = self
            .network
            .links()
            .iter()
            .map(|link| {
                let slot = link.id.slot();
                let station = self.link_station[slot]
                    .and_then(|pos| Some((station_params.get(pos)?, *prices.get(pos)?)));
                cost_model.link_cost(link, effective[slot], station)
            })
            .collect();

        let mut path_costs = vec![0.0; state.len()];
        for class in VehicleClass::ALL {
            for (od, od_paths) in self.paths.pairs().iter().enumerate() {
                let start = layout.od_range(od, class).start;
                for (k, path) in od_paths.paths(class).iter().enumerate() {
                    path_costs[start + k] = path_cost(path, &link_costs);
                }
            }
        }

        Snapshot {
            layout,
            t,
            effective,
            prices,
            station_params,
            outflows,
            routing,
            link_costs,
            path_costs,
        }
    }

    fn derivative_into(&self, snap: &Snapshot<'_>, out: &mut [Real]) {
        let layout = &self.layout;

        // Densities: inflow routed from upstream links minus own outflow
        let f = DVector::from_column_slice(&snap.outflows);
        let inflow = snap.routing.tr_mul(&f);
        for link in self.network.links() {
            let i = link.id.slot();
            out[i] = if link.is_origin() {
                0.0
            } else {
                inflow[i] - f[i]
            };
        }

        for class in VehicleClass::ALL {
            let eta = self.config.eta(class);
            for od in 0..layout.od_count() {
                let range = layout.od_range(od, class);
                replicator_rates(
                    &snap.effective[range.clone()],
                    &snap.path_costs[range.clone()],
                    self.demand.target(od, class),
                    eta,
                    &mut out[range],
                );
            }
        }

        if self.config.pricing.has_price_state() {
            let start = layout.price_range().start;
            for (pos, (_, access)) in self.station_index.iter().enumerate() {
                let queue = snap.effective[access.slot()];
                out[start + pos] =
                    price_rate(&snap.station_params[pos], snap.prices[pos], queue);
            }
        }
    }
}
