//! Station economics derived from a trajectory.

use serde::{Deserialize, Serialize};

use crate::types::{FlowClass, StationSeries, Trajectory};
use crate::{ResultsError, ResultsResult};

/// Trapezoidal integral of `values` over `times`.
pub fn trapezoid(times: &[f64], values: &[f64]) -> f64 {
    times
        .windows(2)
        .zip(values.windows(2))
        .map(|(t, v)| 0.5 * (t[1] - t[0]) * (v[0] + v[1]))
        .sum()
}

/// Integrated station figures over a time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationMetrics {
    pub station: String,
    /// Integral of throughput.
    pub served: f64,
    /// Integral of price times throughput.
    pub revenue: f64,
    /// Integral of (price - operating cost) times throughput.
    pub profit: f64,
    /// Share of the total served volume over all stations.
    pub market_share: f64,
    pub mean_price: f64,
    pub mean_queue: f64,
}

fn window_metrics(times: &[f64], station: &StationSeries, range: std::ops::Range<usize>) -> StationMetrics {
    let t = &times[range.clone()];
    let q = &station.throughput[range.clone()];
    let price = &station.price[range.clone()];
    let cost = &station.operating_cost[range.clone()];
    let queue = &station.queue[range];

    let pq: Vec<f64> = price.iter().zip(q).map(|(p, q)| p * q).collect();
    let margin: Vec<f64> = price
        .iter()
        .zip(cost)
        .zip(q)
        .map(|((p, c), q)| (p - c) * q)
        .collect();

    StationMetrics {
        station: station.station.clone(),
        served: trapezoid(t, q),
        revenue: trapezoid(t, &pq),
        profit: trapezoid(t, &margin),
        market_share: 0.0,
        mean_price: mean(price),
        mean_queue: mean(queue),
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn with_shares(mut metrics: Vec<StationMetrics>) -> Vec<StationMetrics> {
    let total: f64 = metrics.iter().map(|m| m.served).sum();
    for m in &mut metrics {
        m.market_share = if total > 1e-9 { m.served / total } else { 0.0 };
    }
    metrics
}

/// Station metrics over the whole horizon.
pub fn station_metrics(trajectory: &Trajectory) -> Vec<StationMetrics> {
    let n = trajectory.len();
    with_shares(
        trajectory
            .stations
            .iter()
            .map(|s| window_metrics(&trajectory.times, s, 0..n))
            .collect(),
    )
}

/// Station metrics over the samples within `[t0, t1]` (a pricing phase).
pub fn station_metrics_window(
    trajectory: &Trajectory,
    t0: f64,
    t1: f64,
) -> ResultsResult<Vec<StationMetrics>> {
    let start = trajectory.times.partition_point(|&t| t < t0);
    let end = trajectory.times.partition_point(|&t| t <= t1);
    if end <= start {
        return Err(ResultsError::EmptyWindow { t0, t1 });
    }
    Ok(with_shares(
        trajectory
            .stations
            .iter()
            .map(|s| window_metrics(&trajectory.times, s, start..end))
            .collect(),
    ))
}

/// Tail-averaged station figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquilibriumSummary {
    pub station: String,
    pub mean_queue: f64,
    pub mean_price: f64,
    pub mean_throughput: f64,
    /// Mean price times mean throughput.
    pub revenue_rate: f64,
    pub traffic_share: f64,
    pub revenue_share: f64,
}

/// Average every station over the last `tail_fraction` of the samples.
pub fn equilibrium(trajectory: &Trajectory, tail_fraction: f64) -> Vec<EquilibriumSummary> {
    let n = trajectory.len();
    let start = ((n as f64) * (1.0 - tail_fraction.clamp(0.0, 1.0))) as usize;
    let start = start.min(n.saturating_sub(1));

    let mut out: Vec<EquilibriumSummary> = trajectory
        .stations
        .iter()
        .map(|s| {
            let mean_price = mean(s.price.get(start..).unwrap_or_default());
            let mean_throughput = mean(s.throughput.get(start..).unwrap_or_default());
            EquilibriumSummary {
                station: s.station.clone(),
                mean_queue: mean(s.queue.get(start..).unwrap_or_default()),
                mean_price,
                mean_throughput,
                revenue_rate: mean_price * mean_throughput,
                traffic_share: 0.0,
                revenue_share: 0.0,
            }
        })
        .collect();

    let traffic: f64 = out.iter().map(|e| e.mean_throughput).sum();
    let revenue: f64 = out.iter().map(|e| e.revenue_rate).sum();
    for e in &mut out {
        e.traffic_share = if traffic > 1e-9 { e.mean_throughput / traffic } else { 0.0 };
        e.revenue_share = if revenue > 1e-9 { e.revenue_rate / revenue } else { 0.0 };
    }
    out
}

/// Fraction of an OD pair's EV flow using a charging path at one sample.
pub fn ev_charging_share(trajectory: &Trajectory, od: usize, sample: usize) -> Option<f64> {
    let mut charging = 0.0;
    let mut total = 0.0;
    for p in trajectory.od_paths(od, FlowClass::Ev) {
        let y = *p.flow.get(sample)?;
        total += y;
        if p.station.is_some() {
            charging += y;
        }
    }
    (total > 1e-12).then(|| charging / total)
}
