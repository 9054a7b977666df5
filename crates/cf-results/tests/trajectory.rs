use cf_results::{
    FlowClass, LinkSeries, PathFlowSeries, RunOutcome, StabilityChecker, StationSeries,
    Trajectory, station_metrics,
};

fn build(n: usize) -> Trajectory {
    let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
    Trajectory {
        links: vec![LinkSeries {
            link: 0,
            kind: "mixed".to_string(),
            density: vec![0.2; n],
            outflow: vec![0.1; n],
        }],
        paths: vec![PathFlowSeries {
            od: 0,
            origin: "O1".to_string(),
            destination: "D1".to_string(),
            class: FlowClass::Nev,
            links: vec![0],
            station: None,
            flow: vec![0.4; n],
            cost: vec![1.2; n],
        }],
        stations: vec![StationSeries {
            station: "S1".to_string(),
            link: 1,
            queue: vec![0.3; n],
            throughput: vec![0.2; n],
            price: vec![0.5; n],
            operating_cost: vec![0.1; n],
        }],
        times,
        outcome: RunOutcome {
            success: true,
            message: "ok".to_string(),
        },
    }
}

#[test]
fn trajectory_serializes_with_snake_case_class() {
    let traj = build(3);
    let json = serde_json::to_value(&traj).unwrap();
    assert_eq!(json["paths"][0]["class"], "nev");
    assert!(json["paths"][0].get("station").is_none());
    assert_eq!(json["stations"][0]["station"], "S1");

    let back: Trajectory = serde_json::from_value(json).unwrap();
    assert_eq!(back, traj);
}

#[test]
fn validate_catches_ragged_series() {
    let mut traj = build(4);
    assert!(traj.validate().is_ok());
    traj.stations[0].price.pop();
    assert!(traj.validate().is_err());

    let mut traj = build(4);
    traj.times.swap(0, 3);
    assert!(traj.validate().is_err());
}

#[test]
fn constant_run_is_stable_and_sole_station_owns_market() {
    let traj = build(50);
    let report = StabilityChecker::default().check(&traj);
    assert!(report.stable);
    assert_eq!(report.tail_samples, 5);

    let metrics = station_metrics(&traj);
    assert_eq!(metrics.len(), 1);
    assert!((metrics[0].market_share - 1.0).abs() < 1e-12);
    // horizon 24.5, throughput 0.2
    assert!((metrics[0].served - 4.9).abs() < 1e-9);
    assert!((metrics[0].profit - 0.4 * 4.9).abs() < 1e-9);
}

mod props {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn market_shares_sum_to_one(
            rates in proptest::collection::vec(0.01f64..5.0, 1..6),
            n in 2usize..30,
        ) {
            let mut traj = build(n);
            traj.stations = rates
                .iter()
                .enumerate()
                .map(|(i, &q)| StationSeries {
                    station: format!("S{i}"),
                    link: i,
                    queue: vec![0.1; n],
                    throughput: vec![q; n],
                    price: vec![0.5; n],
                    operating_cost: vec![0.1; n],
                })
                .collect();

            let metrics = station_metrics(&traj);
            let total: f64 = metrics.iter().map(|m| m.market_share).sum();
            prop_assert!((total - 1.0).abs() < 1e-9);
            for (m, q) in metrics.iter().zip(&rates) {
                let span = traj.times[n - 1];
                prop_assert!((m.served - q * span).abs() < 1e-9 * (1.0 + q * span));
                prop_assert!(m.profit <= m.revenue);
            }
        }
    }
}
