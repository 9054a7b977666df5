//! Compilation of a scenario file into an executable runtime.

use std::collections::HashMap;

use cf_dynamics::{
    DemandConfig, DemandModel, DynamicsConfig, DynamicsEngine, FixedStations, LatencyModel,
    LinkModels, OriginDemand, OutflowModel, PiecewiseSchedule, PricingMode, ServiceCurve,
    StationParameterProvider, StationParams,
};
use cf_network::{EvPathPolicy, Network, NetworkBuilder, PathEnumerator};
use cf_project::schema::{
    DynamicsDef, EvPathPolicyDef, InitialDensitiesDef, LatencyDef, LinkKindDef, MethodDef,
    OutflowDef, PricingModeDef, ScenarioFile, ServiceDef, SolverDef, StationDef,
    StationParamsDef, StationsDef,
};
use cf_sim::{EvalTimes, IntegratorType, SimOptions};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Everything needed to run one scenario.
pub struct ScenarioRuntime {
    pub name: String,
    pub engine: DynamicsEngine,
    pub initial_state: Vec<f64>,
    pub sim_options: SimOptions,
}

/// Compile a scenario definition into runtime structures.
pub fn compile_scenario(scenario: &ScenarioFile) -> AppResult<ScenarioRuntime> {
    cf_project::validate_scenario(scenario)?;

    let network = build_network(scenario)?;
    let paths = PathEnumerator::new(&network)
        .with_policy(ev_path_policy(scenario.dynamics.ev_paths))
        .enumerate_all()?;

    let mut demand = DemandConfig::new();
    for d in &scenario.demand {
        let origin = d
            .splits
            .iter()
            .fold(OriginDemand::new(d.total, d.ev_share), |o, (dest, frac)| {
                o.with_split(dest.clone(), *frac)
            });
        demand.insert(d.origin.clone(), origin);
    }
    let demand = DemandModel::new(&network, &paths, &demand)?;

    let stations = build_stations(&scenario.stations)?;
    let config = dynamics_config(&scenario.dynamics);

    let n_links = network.link_count();
    let densities = match &scenario.initial.densities {
        InitialDensitiesDef::Zero => None,
        InitialDensitiesDef::Uniform { value } => Some(vec![*value; n_links]),
        InitialDensitiesDef::PerLink { values } => Some(values.clone()),
    };

    let engine = DynamicsEngine::new(network, paths, demand, stations, config)?;
    let initial_state = engine.initial_state(densities.as_deref())?;

    debug!(
        scenario = %scenario.name,
        state_len = initial_state.len(),
        "compiled scenario"
    );

    Ok(ScenarioRuntime {
        name: scenario.name.clone(),
        engine,
        initial_state,
        sim_options: sim_options(&scenario.solver),
    })
}

fn build_network(scenario: &ScenarioFile) -> AppResult<Network> {
    let mut builder = NetworkBuilder::new();
    let mut node_map = HashMap::new();

    for node in &scenario.network.nodes {
        let id = builder.add_node(node.id.clone(), node.position);
        node_map.insert(node.id.as_str(), id);
    }

    for link in &scenario.network.links {
        let from = *node_map
            .get(link.from.as_str())
            .ok_or_else(|| AppError::Compile(format!("Node not found: {}", link.from)))?;
        let to = *node_map
            .get(link.to.as_str())
            .ok_or_else(|| AppError::Compile(format!("Node not found: {}", link.to)))?;
        match &link.kind {
            LinkKindDef::Origin { name } => builder.add_origin(from, name.clone()),
            LinkKindDef::Destination { name } => builder.add_destination(from, name.clone()),
            LinkKindDef::Mixed { capacity: None } => builder.add_mixed(from, to),
            LinkKindDef::Mixed {
                capacity: Some(capacity),
            } => builder.add_mixed_with_capacity(from, to, *capacity),
            LinkKindDef::EvOnly { station } => builder.add_ev_only(from, to, station.as_str()),
        };
    }

    Ok(builder.build()?)
}

fn station_params(def: &StationParamsDef) -> StationParams {
    StationParams {
        service_rate: def.service_rate,
        ramp: def.ramp,
        operating_cost: def.operating_cost,
        price: def.price,
        price_speed: def.price_speed,
    }
}

/// A fixed provider unless any station follows a schedule.
fn build_stations(def: &StationsDef) -> AppResult<Box<dyn StationParameterProvider>> {
    let fallback = def
        .default
        .as_ref()
        .map(station_params)
        .unwrap_or_default();

    let scheduled = def
        .entries
        .iter()
        .any(|e| matches!(e, StationDef::Piecewise { .. }));

    if !scheduled {
        let mut fixed = FixedStations::new().with_fallback(fallback)?;
        for entry in &def.entries {
            if let StationDef::Fixed { id, params } = entry {
                fixed = fixed.with_station(id.as_str(), station_params(params))?;
            }
        }
        return Ok(Box::new(fixed));
    }

    let mut schedule = PiecewiseSchedule::new().with_fallback(fallback)?;
    for entry in &def.entries {
        let segments = match entry {
            StationDef::Fixed { params, .. } => vec![(0.0, station_params(params))],
            StationDef::Piecewise { segments, .. } => segments
                .iter()
                .map(|s| (s.start, station_params(&s.params)))
                .collect(),
        };
        schedule = schedule.with_station(entry.id(), segments)?;
    }
    Ok(Box::new(schedule))
}

fn ev_path_policy(def: EvPathPolicyDef) -> EvPathPolicy {
    match def {
        EvPathPolicyDef::PreferCharging => EvPathPolicy::PreferChargingPathsElseShared,
        EvPathPolicyDef::SharedPlusCharging => EvPathPolicy::SharedPlusCharging,
    }
}

fn dynamics_config(def: &DynamicsDef) -> DynamicsConfig {
    let outflow = match def.outflow {
        OutflowDef::LinearSaturating { slope, capacity } => {
            OutflowModel::LinearSaturating { slope, capacity }
        }
        OutflowDef::ExponentialSaturating {
            capacity,
            steepness,
        } => OutflowModel::ExponentialSaturating {
            capacity,
            steepness,
        },
    };
    let latency = match def.latency {
        LatencyDef::Linear { steepness } => LatencyModel::Linear { steepness },
        LatencyDef::Quartic { free_flow, factor } => LatencyModel::Quartic { free_flow, factor },
    };
    let service = match def.service {
        ServiceDef::Ramp => ServiceCurve::Ramp,
        ServiceDef::Exponential => ServiceCurve::Exponential,
    };
    let pricing = match def.pricing {
        PricingModeDef::Adaptive => PricingMode::Adaptive,
        PricingModeDef::Scheduled => PricingMode::Scheduled,
    };

    DynamicsConfig {
        eta_ev: def.eta_ev,
        eta_nev: def.eta_nev,
        alpha: def.alpha,
        price_weight: def.price_weight,
        models: LinkModels {
            outflow,
            latency,
            service,
            access_latency: def.access_latency,
        },
        pricing,
    }
}

fn sim_options(def: &SolverDef) -> SimOptions {
    let integrator = match def.method {
        MethodDef::Rosenbrock23 => IntegratorType::Rosenbrock23,
        MethodDef::Rk4 => IntegratorType::RK4,
        MethodDef::ForwardEuler => IntegratorType::ForwardEuler,
    };
    SimOptions {
        t_start: 0.0,
        t_end: def.t_final,
        eval: EvalTimes::Linspace(def.n_points),
        rtol: def.rtol,
        atol: def.atol,
        max_step: def.max_step,
        fixed_dt: def.fixed_dt,
        integrator,
        ..SimOptions::default()
    }
}
