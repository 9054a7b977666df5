//! Run execution: integrate a compiled scenario and post-process it.

use nalgebra::DVector;
use tracing::{info, warn};

use cf_dynamics::{DynamicsEngine, Snapshot};
use cf_network::VehicleClass;
use cf_results::{
    EquilibriumSummary, FlowClass, LinkSeries, PathFlowSeries, RunOutcome, StabilityChecker,
    StabilityReport, StationMetrics, StationSeries, Trajectory, equilibrium, station_metrics,
};
use cf_sim::{SimError, SimResult, SimStats, Solution, TransientModel, run_sim};

use crate::compile::ScenarioRuntime;
use crate::error::AppResult;

/// Fraction of the samples averaged into the equilibrium summary.
const EQUILIBRIUM_TAIL: f64 = 0.1;

/// Adapter exposing a dynamics engine to the integrator.
pub struct ScenarioModel<'a> {
    engine: &'a DynamicsEngine,
    initial: &'a [f64],
}

impl<'a> ScenarioModel<'a> {
    pub fn new(engine: &'a DynamicsEngine, initial: &'a [f64]) -> Self {
        Self { engine, initial }
    }
}

impl TransientModel for ScenarioModel<'_> {
    fn initial_state(&self) -> DVector<f64> {
        DVector::from_column_slice(self.initial)
    }

    fn rhs(&self, t: f64, x: &DVector<f64>) -> SimResult<DVector<f64>> {
        let dx = self.engine.rhs(t, x.as_slice()).map_err(|e| SimError::Model {
            message: e.to_string(),
        })?;
        Ok(DVector::from_vec(dx))
    }

    fn breakpoints(&self) -> Vec<f64> {
        self.engine.breakpoints()
    }
}

/// Output of one scenario run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub name: String,
    pub trajectory: Trajectory,
    pub stability: StabilityReport,
    pub metrics: Vec<StationMetrics>,
    pub equilibrium: Vec<EquilibriumSummary>,
    pub stats: SimStats,
}

/// Integrate a compiled scenario over its horizon.
///
/// An integration failure is not an error: the report carries the samples
/// produced before it and `trajectory.outcome.success` is false.
pub fn run_scenario(runtime: &ScenarioRuntime) -> AppResult<RunReport> {
    let engine = &runtime.engine;
    info!(
        scenario = %runtime.name,
        state_len = runtime.initial_state.len(),
        t_end = runtime.sim_options.t_end,
        "starting run"
    );

    let model = ScenarioModel::new(engine, &runtime.initial_state);
    let solution = run_sim(&model, &runtime.sim_options)?;
    if !solution.success {
        warn!(scenario = %runtime.name, message = %solution.message, "run ended early");
    }

    let trajectory = build_trajectory(engine, &solution)?;
    let stability = StabilityChecker::default().check(&trajectory);
    let metrics = station_metrics(&trajectory);
    let equilibrium = equilibrium(&trajectory, EQUILIBRIUM_TAIL);

    info!(
        scenario = %runtime.name,
        success = solution.success,
        samples = trajectory.len(),
        stable = stability.stable,
        "run finished"
    );

    Ok(RunReport {
        name: runtime.name.clone(),
        trajectory,
        stability,
        metrics,
        equilibrium,
        stats: solution.stats,
    })
}

fn flow_class(class: VehicleClass) -> FlowClass {
    match class {
        VehicleClass::Ev => FlowClass::Ev,
        VehicleClass::Nev => FlowClass::Nev,
    }
}

/// Re-evaluate the engine at every sample and collect the series.
pub fn build_trajectory(engine: &DynamicsEngine, solution: &Solution) -> AppResult<Trajectory> {
    let network = engine.network();
    let snapshots: Vec<Snapshot<'_>> = solution
        .t
        .iter()
        .zip(&solution.x)
        .map(|(&t, x)| engine.snapshot(t, x.as_slice()))
        .collect::<Result<_, _>>()?;

    let links = network
        .links()
        .iter()
        .map(|link| {
            let i = link.id.slot();
            LinkSeries {
                link: i,
                kind: link.kind.label().to_string(),
                density: snapshots.iter().map(|s| s.densities()[i]).collect(),
                outflow: snapshots.iter().map(|s| s.outflows[i]).collect(),
            }
        })
        .collect();

    let mut paths = Vec::new();
    for class in VehicleClass::ALL {
        for (od, od_paths) in engine.paths().pairs().iter().enumerate() {
            let origin = network.origin_name(od_paths.od.origin).unwrap_or_default();
            let destination = network
                .destination_name(od_paths.od.destination)
                .unwrap_or_default();
            for (k, path) in od_paths.paths(class).iter().enumerate() {
                let station = path
                    .links()
                    .iter()
                    .find_map(|l| network.link(*l).and_then(|link| link.station()))
                    .map(|s| s.as_str().to_string());
                paths.push(PathFlowSeries {
                    od,
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    class: flow_class(class),
                    links: path.links().iter().map(|l| l.slot()).collect(),
                    station,
                    flow: snapshots.iter().map(|s| s.flows(od, class)[k]).collect(),
                    cost: snapshots.iter().map(|s| s.path_costs(od, class)[k]).collect(),
                });
            }
        }
    }

    let stations = engine
        .station_index()
        .iter()
        .enumerate()
        .map(|(pos, (station, access))| {
            let i = access.slot();
            StationSeries {
                station: station.as_str().to_string(),
                link: i,
                queue: snapshots.iter().map(|s| s.densities()[i]).collect(),
                throughput: snapshots.iter().map(|s| s.outflows[i]).collect(),
                price: snapshots.iter().map(|s| s.prices[pos]).collect(),
                operating_cost: snapshots
                    .iter()
                    .map(|s| s.station_params[pos].operating_cost)
                    .collect(),
            }
        })
        .collect();

    let trajectory = Trajectory {
        times: solution.t.clone(),
        links,
        paths,
        stations,
        outcome: RunOutcome {
            success: solution.success,
            message: solution.message.clone(),
        },
    };
    trajectory.validate()?;
    Ok(trajectory)
}
