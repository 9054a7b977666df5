//! Result data types.

use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

/// Vehicle class of a path-flow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowClass {
    Ev,
    Nev,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSeries {
    pub link: usize,
    /// "origin", "destination", "mixed" or "ev-only"
    pub kind: String,
    pub density: Vec<f64>,
    pub outflow: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFlowSeries {
    /// Position of the OD pair in the active set.
    pub od: usize,
    pub origin: String,
    pub destination: String,
    pub class: FlowClass,
    pub links: Vec<usize>,
    /// Station on the path, if it is a charging path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    /// Effective (renormalized) flow.
    pub flow: Vec<f64>,
    pub cost: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationSeries {
    pub station: String,
    pub link: usize,
    /// Density on the access link.
    pub queue: Vec<f64>,
    /// Service rate (outflow of the access link).
    pub throughput: Vec<f64>,
    pub price: Vec<f64>,
    pub operating_cost: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    pub message: String,
}

/// Full sampled trajectory of a scenario run, indexed by the fixed link,
/// path and station order of the scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub links: Vec<LinkSeries>,
    pub paths: Vec<PathFlowSeries>,
    pub stations: Vec<StationSeries>,
    pub outcome: RunOutcome,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn station(&self, id: &str) -> Option<&StationSeries> {
        self.stations.iter().find(|s| s.station == id)
    }

    pub fn link(&self, index: usize) -> Option<&LinkSeries> {
        self.links.iter().find(|l| l.link == index)
    }

    /// Paths of one OD pair and class, in enumeration order.
    pub fn od_paths(&self, od: usize, class: FlowClass) -> impl Iterator<Item = &PathFlowSeries> {
        self.paths
            .iter()
            .filter(move |p| p.od == od && p.class == class)
    }

    /// Check that every series has one value per sample time.
    pub fn validate(&self) -> ResultsResult<()> {
        let n = self.times.len();
        let shape = |what: String| Err(ResultsError::Shape { what });

        if self.times.windows(2).any(|w| w[1] < w[0]) {
            return shape("sample times are not sorted".to_string());
        }
        for l in &self.links {
            if l.density.len() != n || l.outflow.len() != n {
                return shape(format!("link {} series length differs from {n}", l.link));
            }
        }
        for p in &self.paths {
            if p.flow.len() != n || p.cost.len() != n {
                return shape(format!("path series of OD {} length differs from {n}", p.od));
            }
        }
        for s in &self.stations {
            let lens = [
                s.queue.len(),
                s.throughput.len(),
                s.price.len(),
                s.operating_cost.len(),
            ];
            if lens.iter().any(|&len| len != n) {
                return shape(format!("station {} series length differs from {n}", s.station));
            }
        }
        Ok(())
    }
}
