//! Scenario file schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioFile {
    pub version: u32,
    pub name: String,
    pub network: NetworkDef,
    #[serde(default)]
    pub demand: Vec<OriginDemandDef>,
    #[serde(default)]
    pub stations: StationsDef,
    #[serde(default)]
    pub dynamics: DynamicsDef,
    #[serde(default)]
    pub solver: SolverDef,
    #[serde(default)]
    pub initial: InitialDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    pub nodes: Vec<NodeDef>,
    pub links: Vec<LinkDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    #[serde(default)]
    pub position: [f64; 2],
}

/// A directed link. Links are indexed in file order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkDef {
    pub from: String,
    pub to: String,
    pub kind: LinkKindDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkKindDef {
    /// Demand injection self-loop.
    Origin { name: String },
    /// Demand collection self-loop.
    Destination { name: String },
    Mixed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capacity: Option<f64>,
    },
    /// Access link of a charging station.
    EvOnly { station: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OriginDemandDef {
    pub origin: String,
    pub total: f64,
    pub ev_share: f64,
    /// Destination name to fraction of the origin's demand.
    #[serde(default)]
    pub splits: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StationsDef {
    /// Parameters of stations without an entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<StationParamsDef>,
    #[serde(default)]
    pub entries: Vec<StationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StationDef {
    Fixed {
        id: String,
        #[serde(default)]
        params: StationParamsDef,
    },
    /// Piecewise-constant parameters; each segment holds from its start.
    Piecewise { id: String, segments: Vec<SegmentDef> },
}

impl StationDef {
    pub fn id(&self) -> &str {
        match self {
            StationDef::Fixed { id, .. } | StationDef::Piecewise { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub start: f64,
    #[serde(flatten)]
    pub params: StationParamsDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StationParamsDef {
    #[serde(default = "default_service_rate")]
    pub service_rate: f64,
    #[serde(default = "default_ramp")]
    pub ramp: f64,
    #[serde(default = "default_operating_cost")]
    pub operating_cost: f64,
    #[serde(default = "default_price")]
    pub price: f64,
    #[serde(default = "default_price_speed")]
    pub price_speed: f64,
}

impl Default for StationParamsDef {
    fn default() -> Self {
        Self {
            service_rate: default_service_rate(),
            ramp: default_ramp(),
            operating_cost: default_operating_cost(),
            price: default_price(),
            price_speed: default_price_speed(),
        }
    }
}

fn default_service_rate() -> f64 {
    1.5
}

fn default_ramp() -> f64 {
    10.0
}

fn default_operating_cost() -> f64 {
    0.1
}

fn default_price() -> f64 {
    0.5
}

fn default_price_speed() -> f64 {
    0.05
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EvPathPolicyDef {
    #[default]
    PreferCharging,
    SharedPlusCharging,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingModeDef {
    #[default]
    Adaptive,
    Scheduled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutflowDef {
    LinearSaturating { slope: f64, capacity: f64 },
    ExponentialSaturating { capacity: f64, steepness: f64 },
}

impl Default for OutflowDef {
    fn default() -> Self {
        OutflowDef::ExponentialSaturating {
            capacity: 0.5,
            steepness: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LatencyDef {
    Linear { steepness: f64 },
    Quartic { free_flow: f64, factor: f64 },
}

impl Default for LatencyDef {
    fn default() -> Self {
        LatencyDef::Quartic {
            free_flow: 1.0,
            factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServiceDef {
    Ramp,
    #[default]
    Exponential,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DynamicsDef {
    #[serde(default = "default_eta")]
    pub eta_ev: f64,
    #[serde(default = "default_eta")]
    pub eta_nev: f64,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_price_weight")]
    pub price_weight: f64,
    #[serde(default)]
    pub ev_paths: EvPathPolicyDef,
    #[serde(default)]
    pub pricing: PricingModeDef,
    #[serde(default)]
    pub outflow: OutflowDef,
    #[serde(default)]
    pub latency: LatencyDef,
    #[serde(default)]
    pub service: ServiceDef,
    #[serde(default = "default_access_latency")]
    pub access_latency: f64,
}

impl Default for DynamicsDef {
    fn default() -> Self {
        Self {
            eta_ev: default_eta(),
            eta_nev: default_eta(),
            alpha: default_alpha(),
            price_weight: default_price_weight(),
            ev_paths: EvPathPolicyDef::default(),
            pricing: PricingModeDef::default(),
            outflow: OutflowDef::default(),
            latency: LatencyDef::default(),
            service: ServiceDef::default(),
            access_latency: default_access_latency(),
        }
    }
}

fn default_eta() -> f64 {
    0.05
}

fn default_alpha() -> f64 {
    0.3
}

fn default_price_weight() -> f64 {
    1.0
}

fn default_access_latency() -> f64 {
    0.1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MethodDef {
    #[default]
    Rosenbrock23,
    Rk4,
    ForwardEuler,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SolverDef {
    #[serde(default = "default_t_final")]
    pub t_final: f64,
    #[serde(default = "default_n_points")]
    pub n_points: usize,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
    #[serde(default = "default_max_step")]
    pub max_step: f64,
    #[serde(default)]
    pub method: MethodDef,
    /// Step of the fixed-step methods.
    #[serde(default = "default_fixed_dt")]
    pub fixed_dt: f64,
}

impl Default for SolverDef {
    fn default() -> Self {
        Self {
            t_final: default_t_final(),
            n_points: default_n_points(),
            rtol: default_rtol(),
            atol: default_atol(),
            max_step: default_max_step(),
            method: MethodDef::default(),
            fixed_dt: default_fixed_dt(),
        }
    }
}

fn default_t_final() -> f64 {
    100.0
}

fn default_n_points() -> usize {
    800
}

fn default_rtol() -> f64 {
    1e-3
}

fn default_atol() -> f64 {
    1e-5
}

fn default_max_step() -> f64 {
    1.0
}

fn default_fixed_dt() -> f64 {
    0.01
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct InitialDef {
    #[serde(default)]
    pub densities: InitialDensitiesDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialDensitiesDef {
    #[default]
    Zero,
    Uniform {
        value: f64,
    },
    /// One value per link, in link order.
    PerLink {
        values: Vec<f64>,
    },
}
