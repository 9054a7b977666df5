//! Scenario validation logic.

use std::collections::{HashMap, HashSet};

use crate::schema::{
    DynamicsDef, InitialDensitiesDef, LinkKindDef, OutflowDef, LatencyDef, ScenarioFile,
    SolverDef, StationDef, StationParamsDef,
};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite and non-negative"))
    }
}

fn positive(field: &str, v: f64) -> Result<(), ValidationError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, v, "must be finite and positive"))
    }
}

pub fn validate_scenario(scenario: &ScenarioFile) -> Result<(), ValidationError> {
    if scenario.version == 0 || scenario.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: scenario.version,
        });
    }

    let names = validate_network(scenario)?;
    validate_demand(scenario, &names)?;
    validate_stations(scenario, &names)?;
    validate_dynamics(&scenario.dynamics)?;
    validate_solver(&scenario.solver)?;

    if let InitialDensitiesDef::PerLink { values } = &scenario.initial.densities {
        if values.len() != scenario.network.links.len() {
            return Err(invalid(
                "initial.densities.values",
                values.len(),
                "needs one value per link",
            ));
        }
        for v in values {
            non_negative("initial.densities.values", *v)?;
        }
    }
    if let InitialDensitiesDef::Uniform { value } = scenario.initial.densities {
        non_negative("initial.densities.value", value)?;
    }
    Ok(())
}

/// Origin, destination and station names declared by the network.
struct TerminalNames<'a> {
    origins: HashSet<&'a str>,
    destinations: HashSet<&'a str>,
    stations: HashSet<&'a str>,
}

fn validate_network(scenario: &ScenarioFile) -> Result<TerminalNames<'_>, ValidationError> {
    let network = &scenario.network;

    let mut node_ids = HashSet::new();
    for node in &network.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: "network nodes".to_string(),
            });
        }
    }

    let mut names = TerminalNames {
        origins: HashSet::new(),
        destinations: HashSet::new(),
        stations: HashSet::new(),
    };

    for (i, link) in network.links.iter().enumerate() {
        for end in [&link.from, &link.to] {
            if !node_ids.contains(end.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: end.clone(),
                    context: format!("link {i} endpoint"),
                });
            }
        }

        let (set, name, context) = match &link.kind {
            LinkKindDef::Origin { name } => (&mut names.origins, name, "origins"),
            LinkKindDef::Destination { name } => (&mut names.destinations, name, "destinations"),
            LinkKindDef::EvOnly { station } => (&mut names.stations, station, "stations"),
            LinkKindDef::Mixed { capacity } => {
                if let Some(c) = capacity {
                    positive(&format!("links[{i}].capacity"), *c)?;
                }
                continue;
            }
        };
        if !set.insert(name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: name.clone(),
                context: context.to_string(),
            });
        }
        let terminal = matches!(
            link.kind,
            LinkKindDef::Origin { .. } | LinkKindDef::Destination { .. }
        );
        if terminal && link.from != link.to {
            return Err(invalid(
                format!("links[{i}]"),
                format!("{} -> {}", link.from, link.to),
                "origin and destination links must be self-loops",
            ));
        }
    }
    Ok(names)
}

fn validate_demand(scenario: &ScenarioFile, names: &TerminalNames<'_>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for d in &scenario.demand {
        if !seen.insert(d.origin.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: d.origin.clone(),
                context: "demand".to_string(),
            });
        }
        if !names.origins.contains(d.origin.as_str()) {
            return Err(ValidationError::MissingReference {
                id: d.origin.clone(),
                context: "demand origin".to_string(),
            });
        }
        non_negative(&format!("demand[{}].total", d.origin), d.total)?;
        if !(0.0..=1.0).contains(&d.ev_share) {
            return Err(invalid(
                format!("demand[{}].ev_share", d.origin),
                d.ev_share,
                "must lie in [0, 1]",
            ));
        }
        for (dest, fraction) in &d.splits {
            if !names.destinations.contains(dest.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: dest.clone(),
                    context: format!("demand splits of {}", d.origin),
                });
            }
            non_negative(&format!("demand[{}].splits.{dest}", d.origin), *fraction)?;
        }
    }
    Ok(())
}

fn validate_params(field: &str, p: &StationParamsDef) -> Result<(), ValidationError> {
    non_negative(&format!("{field}.service_rate"), p.service_rate)?;
    positive(&format!("{field}.ramp"), p.ramp)?;
    if !p.operating_cost.is_finite() {
        return Err(invalid(format!("{field}.operating_cost"), p.operating_cost, "must be finite"));
    }
    non_negative(&format!("{field}.price"), p.price)?;
    non_negative(&format!("{field}.price_speed"), p.price_speed)
}

fn validate_stations(scenario: &ScenarioFile, names: &TerminalNames<'_>) -> Result<(), ValidationError> {
    if let Some(default) = &scenario.stations.default {
        validate_params("stations.default", default)?;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, entry) in scenario.stations.entries.iter().enumerate() {
        let id = entry.id();
        if seen.insert(id, i).is_some() {
            return Err(ValidationError::DuplicateId {
                id: id.to_string(),
                context: "stations".to_string(),
            });
        }
        if !names.stations.contains(id) {
            return Err(ValidationError::MissingReference {
                id: id.to_string(),
                context: "station entries".to_string(),
            });
        }
        match entry {
            StationDef::Fixed { params, .. } => validate_params(&format!("stations.{id}"), params)?,
            StationDef::Piecewise { segments, .. } => {
                if segments.is_empty() {
                    return Err(invalid(format!("stations.{id}.segments"), 0, "needs at least one segment"));
                }
                for (k, seg) in segments.iter().enumerate() {
                    if !seg.start.is_finite() {
                        return Err(invalid(format!("stations.{id}.segments[{k}].start"), seg.start, "must be finite"));
                    }
                    validate_params(&format!("stations.{id}.segments[{k}]"), &seg.params)?;
                }
                if segments.windows(2).any(|w| w[1].start <= w[0].start) {
                    return Err(invalid(
                        format!("stations.{id}.segments"),
                        segments.len(),
                        "segment starts must be strictly increasing",
                    ));
                }
            }
        }
    }
    Ok(())
}

fn validate_dynamics(d: &DynamicsDef) -> Result<(), ValidationError> {
    non_negative("dynamics.eta_ev", d.eta_ev)?;
    non_negative("dynamics.eta_nev", d.eta_nev)?;
    non_negative("dynamics.alpha", d.alpha)?;
    if !d.price_weight.is_finite() {
        return Err(invalid("dynamics.price_weight", d.price_weight, "must be finite"));
    }
    non_negative("dynamics.access_latency", d.access_latency)?;
    match d.outflow {
        OutflowDef::LinearSaturating { slope, capacity } => {
            positive("dynamics.outflow.slope", slope)?;
            positive("dynamics.outflow.capacity", capacity)?;
        }
        OutflowDef::ExponentialSaturating {
            capacity,
            steepness,
        } => {
            positive("dynamics.outflow.capacity", capacity)?;
            positive("dynamics.outflow.steepness", steepness)?;
        }
    }
    match d.latency {
        LatencyDef::Linear { steepness } => non_negative("dynamics.latency.steepness", steepness),
        LatencyDef::Quartic { free_flow, factor } => {
            non_negative("dynamics.latency.free_flow", free_flow)?;
            non_negative("dynamics.latency.factor", factor)
        }
    }
}

fn validate_solver(s: &SolverDef) -> Result<(), ValidationError> {
    positive("solver.t_final", s.t_final)?;
    if s.n_points < 2 {
        return Err(invalid("solver.n_points", s.n_points, "needs at least two points"));
    }
    positive("solver.rtol", s.rtol)?;
    positive("solver.atol", s.atol)?;
    positive("solver.max_step", s.max_step)?;
    positive("solver.fixed_dt", s.fixed_dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn minimal() -> ScenarioFile {
        let node = |id: &str| NodeDef {
            id: id.to_string(),
            position: [0.0, 0.0],
        };
        let link = |from: &str, to: &str, kind| LinkDef {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        };
        ScenarioFile {
            version: 1,
            name: "minimal".to_string(),
            network: NetworkDef {
                nodes: vec![node("O"), node("D")],
                links: vec![
                    link("O", "O", LinkKindDef::Origin { name: "O1".into() }),
                    link("O", "D", LinkKindDef::Mixed { capacity: None }),
                    link("O", "D", LinkKindDef::EvOnly { station: "S1".into() }),
                    link("D", "D", LinkKindDef::Destination { name: "D1".into() }),
                ],
            },
            demand: vec![OriginDemandDef {
                origin: "O1".to_string(),
                total: 1.0,
                ev_share: 0.5,
                splits: [("D1".to_string(), 1.0)].into_iter().collect(),
            }],
            stations: StationsDef::default(),
            dynamics: DynamicsDef::default(),
            solver: SolverDef::default(),
            initial: InitialDef::default(),
        }
    }

    #[test]
    fn minimal_is_valid() {
        validate_scenario(&minimal()).unwrap();
    }

    #[test]
    fn rejects_future_version() {
        let mut s = minimal();
        s.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_dangling_endpoint() {
        let mut s = minimal();
        s.network.links[1].to = "X".to_string();
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_station() {
        let mut s = minimal();
        s.network.links.push(LinkDef {
            from: "O".into(),
            to: "D".into(),
            kind: LinkKindDef::EvOnly { station: "S1".into() },
        });
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn rejects_non_loop_origin() {
        let mut s = minimal();
        s.network.links[0].to = "D".to_string();
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rejects_unknown_split_destination() {
        let mut s = minimal();
        s.demand[0].splits.insert("D9".to_string(), 0.5);
        assert!(matches!(
            validate_scenario(&s),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn rejects_bad_ev_share_and_unsorted_segments() {
        let mut s = minimal();
        s.demand[0].ev_share = 1.5;
        assert!(validate_scenario(&s).is_err());

        let mut s = minimal();
        let seg = |start| SegmentDef {
            start,
            params: StationParamsDef::default(),
        };
        s.stations.entries.push(StationDef::Piecewise {
            id: "S1".into(),
            segments: vec![seg(0.0), seg(100.0), seg(50.0)],
        });
        assert!(validate_scenario(&s).is_err());
    }

    #[test]
    fn rejects_wrong_density_count() {
        let mut s = minimal();
        s.initial.densities = InitialDensitiesDef::PerLink {
            values: vec![0.1; 3],
        };
        assert!(validate_scenario(&s).is_err());
    }
}
