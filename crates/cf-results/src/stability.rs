//! Post-hoc convergence diagnostics over a completed trajectory.
//!
//! Advisory only: a report never fails a run.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::Trajectory;

/// Thresholds of the stability checks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityThresholds {
    /// Fraction of samples forming the tail.
    pub tail_fraction: f64,
    /// Minimum tail length in samples.
    pub min_tail: usize,
    /// Largest tolerated density standard deviation over the tail.
    pub density_std: f64,
    /// Queue growth rate above which a queue counts as growing.
    pub queue_slope: f64,
    /// Queue level above which growth is flagged.
    pub queue_level: f64,
}

impl Default for StabilityThresholds {
    fn default() -> Self {
        Self {
            tail_fraction: 0.1,
            min_tail: 2,
            density_std: 5e-3,
            queue_slope: 0.01,
            queue_level: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscillatingLink {
    pub link: usize,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowingQueue {
    pub station: String,
    pub slope: f64,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityReport {
    pub stable: bool,
    pub tail_samples: usize,
    pub max_density_std: f64,
    pub oscillating: Vec<OscillatingLink>,
    pub growing_queues: Vec<GrowingQueue>,
    /// Human-readable summary, one finding per line.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityChecker {
    pub thresholds: StabilityThresholds,
}

impl StabilityChecker {
    pub fn new(thresholds: StabilityThresholds) -> Self {
        Self { thresholds }
    }

    /// Number of tail samples for a series of `n` samples.
    pub fn tail_len(&self, n: usize) -> usize {
        let k = (n as f64 * self.thresholds.tail_fraction) as usize;
        k.max(self.thresholds.min_tail).min(n)
    }

    pub fn check(&self, trajectory: &Trajectory) -> StabilityReport {
        let densities: Vec<(usize, &[f64])> = trajectory
            .links
            .iter()
            .map(|l| (l.link, l.density.as_slice()))
            .collect();
        let queues: Vec<(&str, &[f64])> = trajectory
            .stations
            .iter()
            .map(|s| (s.station.as_str(), s.queue.as_slice()))
            .collect();
        self.check_series(&trajectory.times, &densities, &queues)
    }

    /// Check raw series: `(link, density)` and `(station, queue)` pairs.
    pub fn check_series(
        &self,
        times: &[f64],
        densities: &[(usize, &[f64])],
        queues: &[(&str, &[f64])],
    ) -> StabilityReport {
        let th = &self.thresholds;
        let n = times.len();
        let k = self.tail_len(n);

        let mut report = StabilityReport {
            stable: true,
            tail_samples: k,
            max_density_std: 0.0,
            oscillating: Vec::new(),
            growing_queues: Vec::new(),
            lines: Vec::new(),
        };

        if k < 2 {
            report
                .lines
                .push(format!("too few samples ({n}) to judge convergence"));
            warn!(samples = n, "stability check skipped");
            return report;
        }

        for &(link, series) in densities {
            let Some(tail) = series.get(series.len().saturating_sub(k)..) else {
                continue;
            };
            let sd = std_dev(tail);
            report.max_density_std = report.max_density_std.max(sd);
            if sd > th.density_std {
                report.oscillating.push(OscillatingLink { link, std_dev: sd });
            }
        }
        if report.oscillating.is_empty() {
            report.lines.push(format!(
                "link densities converged (max std {:.5})",
                report.max_density_std
            ));
        } else {
            report.stable = false;
            report.lines.push(format!(
                "link densities oscillating on {} link(s) (max std {:.5})",
                report.oscillating.len(),
                report.max_density_std
            ));
        }

        let t_tail = &times[n - k..];
        let span = t_tail[k - 1] - t_tail[0];
        for &(station, series) in queues {
            if series.len() < k || span <= 0.0 {
                continue;
            }
            let tail = &series[series.len() - k..];
            let level = tail[k - 1];
            let slope = (level - tail[0]) / span;
            if slope > th.queue_slope && level > th.queue_level {
                report.stable = false;
                report.lines.push(format!(
                    "queue at station {station} growing (slope {slope:.4}, level {level:.3})"
                ));
                report.growing_queues.push(GrowingQueue {
                    station: station.to_string(),
                    slope,
                    level,
                });
            } else {
                report.lines.push(format!("queue at station {station} bounded"));
            }
        }

        if report.stable {
            info!(max_density_std = report.max_density_std, "equilibrium reached");
        } else {
            for line in &report.lines {
                warn!("{line}");
            }
        }
        report
    }
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn converged_series_are_stable() {
        let t = times(100);
        let flat = vec![0.3; 100];
        let report = StabilityChecker::default().check_series(&t, &[(0, &flat)], &[("S1", &flat)]);
        assert!(report.stable);
        assert_eq!(report.tail_samples, 10);
        assert_eq!(report.max_density_std, 0.0);
    }

    #[test]
    fn oscillation_flagged() {
        let t = times(100);
        let wave: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 0.0 } else { 0.1 }).collect();
        let report = StabilityChecker::default().check_series(&t, &[(3, &wave)], &[]);
        assert!(!report.stable);
        assert_eq!(report.oscillating.len(), 1);
        assert_eq!(report.oscillating[0].link, 3);
        assert!((report.oscillating[0].std_dev - 0.05).abs() < 1e-12);
    }

    #[test]
    fn growing_queue_flagged_only_above_level() {
        let t = times(100);
        let growing: Vec<f64> = (0..100).map(|i| 1.0 + 0.05 * i as f64).collect();
        let small: Vec<f64> = (0..100).map(|i| 0.001 * i as f64).collect();
        let checker = StabilityChecker::default();

        let report = checker.check_series(&t, &[], &[("S1", &growing)]);
        assert!(!report.stable);
        assert_eq!(report.growing_queues[0].station, "S1");
        assert!((report.growing_queues[0].slope - 0.05).abs() < 1e-9);

        let report = checker.check_series(&t, &[], &[("S2", &small)]);
        assert!(report.stable);
    }

    #[test]
    fn short_series_use_minimum_tail() {
        let checker = StabilityChecker::default();
        assert_eq!(checker.tail_len(5), 2);
        assert_eq!(checker.tail_len(1), 1);
        let report = checker.check_series(&[0.0], &[], &[]);
        assert!(report.stable);
        assert_eq!(report.lines.len(), 1);
    }
}
