//! Qualitative behavior of the coupled dynamics on small networks.

use cf_app::{compile_scenario, price_sweep, run_scenario, sweep};
use cf_project::{LinkKindDef, ScenarioFile, from_yaml_str};
use cf_results::ev_charging_share;

/// One mixed road and one charging road from O to D.
///
/// Linear latency and unsaturated linear outflow make the equilibrium
/// charging flow `(0.3 - p) / 1.02` for prices between 0.147 and 0.3.
const CHOICE: &str = r#"
version: 1
name: route-choice
network:
  nodes: [{ id: O }, { id: D }]
  links:
    - { from: O, to: O, kind: { type: origin, name: O1 } }
    - { from: O, to: D, kind: { type: mixed } }
    - { from: O, to: D, kind: { type: ev_only, station: S1 } }
    - { from: D, to: D, kind: { type: destination, name: D1 } }
demand:
  - { origin: O1, total: 0.3, ev_share: 0.5, splits: { D1: 1.0 } }
stations:
  entries:
    - type: fixed
      id: S1
      params: { service_rate: 1.5, ramp: 10.0, operating_cost: 0.1, price: 0.2, price_speed: 0.0 }
dynamics:
  eta_ev: 5.0
  eta_nev: 5.0
  alpha: 0.3
  ev_paths: shared_plus_charging
  pricing: scheduled
  outflow: { type: linear_saturating, slope: 1.0, capacity: 1000.0 }
  latency: { type: linear, steepness: 1.0 }
  service: ramp
  access_latency: 0.0
solver:
  t_final: 200.0
  n_points: 201
  rtol: 1.0e-5
  atol: 1.0e-8
  max_step: 1.0
"#;

fn choice() -> ScenarioFile {
    from_yaml_str(CHOICE).unwrap()
}

#[test]
fn higher_price_lowers_charging_share() {
    let prices = [0.18, 0.22, 0.26];
    let reports = price_sweep(&choice(), "S1", &prices);

    let shares: Vec<f64> = reports
        .iter()
        .map(|r| {
            let traj = &r.as_ref().unwrap().trajectory;
            assert!(traj.outcome.success, "{}", traj.outcome.message);
            ev_charging_share(traj, 0, traj.len() - 1).unwrap()
        })
        .collect();

    for (price, share) in prices.iter().zip(&shares) {
        let expected = (0.3 - price) / 1.02 / 0.15;
        assert!(
            (share - expected).abs() < 0.02,
            "price {price}: share {share}, expected {expected}"
        );
    }
    assert!(shares[0] > shares[1] && shares[1] > shares[2]);
}

#[test]
fn zero_price_speed_freezes_adaptive_price() {
    let mut scenario = choice();
    scenario.dynamics.pricing = cf_project::PricingModeDef::Adaptive;
    scenario.solver.t_final = 50.0;
    scenario.solver.n_points = 51;

    let report = run_scenario(&compile_scenario(&scenario).unwrap()).unwrap();
    let s1 = report.trajectory.station("S1").unwrap();
    assert!(report.trajectory.outcome.success);
    assert!(s1.price.iter().all(|p| (p - 0.2).abs() < 1e-9));
}

#[test]
fn doubling_capacity_does_not_lower_throughput() {
    let yaml = r#"
version: 1
name: bottleneck
network:
  nodes: [{ id: O }, { id: D }]
  links:
    - { from: O, to: O, kind: { type: origin, name: O1 } }
    - { from: O, to: D, kind: { type: mixed, capacity: 0.2 } }
    - { from: D, to: D, kind: { type: destination, name: D1 } }
demand:
  - { origin: O1, total: 0.3, ev_share: 0.0, splits: { D1: 1.0 } }
dynamics:
  outflow: { type: exponential_saturating, capacity: 5.0, steepness: 1.0 }
solver:
  t_final: 60.0
  n_points: 61
"#;
    let base = from_yaml_str(yaml).unwrap();
    let reports = sweep(&base, &[0.2, 0.4], |s, cap| {
        s.network.links[1].kind = LinkKindDef::Mixed {
            capacity: Some(*cap),
        };
    });

    let throughput: Vec<f64> = reports
        .iter()
        .map(|r| {
            let traj = &r.as_ref().unwrap().trajectory;
            assert!(traj.outcome.success, "{}", traj.outcome.message);
            *traj.link(1).unwrap().outflow.last().unwrap()
        })
        .collect();

    assert!(throughput[1] >= throughput[0] - 1e-6);
    assert!(throughput[0] <= 0.2 + 1e-12);
    assert!((throughput[1] - 0.3).abs() < 0.01);
}

#[test]
fn parallel_sweep_matches_sequential_runs() {
    let prices = [0.2, 0.25];
    let mut base = choice();
    base.solver.t_final = 30.0;
    base.solver.n_points = 31;

    let parallel = price_sweep(&base, "S1", &prices);
    for (price, report) in prices.iter().zip(parallel) {
        let mut scenario = base.clone();
        cf_app::set_station_price(&mut scenario, "S1", *price);
        let sequential = run_scenario(&compile_scenario(&scenario).unwrap()).unwrap();
        assert_eq!(report.unwrap().trajectory, sequential.trajectory);
    }
}
