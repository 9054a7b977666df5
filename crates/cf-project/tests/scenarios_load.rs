use std::path::{Path, PathBuf};

use cf_project::{
    DynamicsDef, InitialDensitiesDef, LinkKindDef, PricingModeDef, ProjectError, SolverDef,
    StationDef, from_yaml_str, load_yaml,
};

fn scenarios_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenarios")
}

#[test]
fn bundled_scenarios_load_and_validate() {
    let names = [
        "diamond_phased_pricing.yaml",
        "diamond_fixed_prices.yaml",
        "two_origin_adaptive.yaml",
    ];
    for name in names {
        let path = scenarios_dir().join(name);
        load_yaml(&path).unwrap_or_else(|e| panic!("Failed to load {name}: {e}"));
    }
}

#[test]
fn phased_pricing_reads_schedules() {
    let scenario = load_yaml(&scenarios_dir().join("diamond_phased_pricing.yaml")).unwrap();
    assert_eq!(scenario.network.links.len(), 9);
    assert_eq!(scenario.dynamics.pricing, PricingModeDef::Scheduled);
    assert!(matches!(
        scenario.network.links[2].kind,
        LinkKindDef::EvOnly { ref station } if station == "S1"
    ));
    let StationDef::Piecewise { segments, .. } = &scenario.stations.entries[1] else {
        panic!("S2 should be piecewise");
    };
    assert_eq!(segments.len(), 4);
    assert_eq!(segments[1].start, 100.0);
    assert_eq!(segments[1].params.price, 0.25);
    // unspecified fields fall back to defaults
    assert_eq!(segments[1].params.price_speed, 0.05);
}

#[test]
fn omitted_sections_use_defaults() {
    let yaml = r#"
version: 1
name: bare
network:
  nodes: [{ id: O }, { id: D }]
  links:
    - { from: O, to: O, kind: { type: origin, name: O1 } }
    - { from: O, to: D, kind: { type: mixed, capacity: 0.8 } }
    - { from: D, to: D, kind: { type: destination, name: D1 } }
"#;
    let scenario = from_yaml_str(yaml).unwrap();
    assert_eq!(scenario.dynamics, DynamicsDef::default());
    assert_eq!(scenario.dynamics.eta_ev, 0.05);
    assert_eq!(scenario.dynamics.alpha, 0.3);
    assert_eq!(scenario.solver, SolverDef::default());
    assert_eq!(scenario.solver.rtol, 1e-3);
    assert_eq!(scenario.solver.max_step, 1.0);
    assert_eq!(scenario.initial.densities, InitialDensitiesDef::Zero);
    assert!(scenario.demand.is_empty());
}

#[test]
fn invalid_scenario_is_rejected() {
    let yaml = r#"
version: 1
name: broken
network:
  nodes: [{ id: O }]
  links:
    - { from: O, to: Q, kind: { type: mixed } }
"#;
    assert!(matches!(from_yaml_str(yaml), Err(ProjectError::Validation(_))));
    assert!(matches!(from_yaml_str("version: ["), Err(ProjectError::Yaml(_))));
}

#[test]
fn yaml_roundtrip_preserves_scenario() {
    let scenario = load_yaml(&scenarios_dir().join("two_origin_adaptive.yaml")).unwrap();
    let dir = std::env::temp_dir().join(format!("cf-project-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("roundtrip.yaml");
    cf_project::save_yaml(&path, &scenario).unwrap();
    let back = load_yaml(&path).unwrap();
    assert_eq!(back, scenario);
    std::fs::remove_dir_all(&dir).ok();
}
