//! Link-to-link routing fractions derived from path flows.

use nalgebra::DMatrix;

use cf_core::numeric::thresholds::ROUTING_MIN;
use cf_core::Real;
use cf_network::{PathSet, VehicleClass};

use crate::layout::StateLayout;

/// Builds the routing matrix `R`, where `R[u, v]` is the fraction of the flow
/// leaving link `u` that proceeds to link `v`.
///
/// Rebuilt from the current path flows on every evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RoutingMatrixBuilder<'a> {
    layout: &'a StateLayout,
    paths: &'a PathSet,
}

impl<'a> RoutingMatrixBuilder<'a> {
    pub fn new(layout: &'a StateLayout, paths: &'a PathSet) -> Self {
        Self { layout, paths }
    }

    /// Build `R` from a state whose flow blocks hold the (renormalized) path flows.
    ///
    /// Rows of links that carry no path flow are all zero.
    pub fn build(&self, flows: &[Real]) -> DMatrix<Real> {
        let n = self.layout.link_count();
        let mut matrix = DMatrix::zeros(n, n);
        let mut leaving = vec![0.0; n];

        for class in VehicleClass::ALL {
            for (od, od_paths) in self.paths.pairs().iter().enumerate() {
                let y = self.layout.flows(flows, od, class);
                for (path, &flow) in od_paths.paths(class).iter().zip(y) {
                    for (u, v) in path.transitions() {
                        matrix[(u.slot(), v.slot())] += flow;
                        leaving[u.slot()] += flow;
                    }
                }
            }
        }

        for (u, &den) in leaving.iter().enumerate() {
            if den > ROUTING_MIN {
                for r in matrix.row_mut(u).iter_mut() {
                    *r /= den;
                }
            } else {
                matrix.row_mut(u).fill(0.0);
            }
        }

        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::Id;
    use cf_network::{OdPair, OdPaths, Path};

    fn p(links: &[u32]) -> Path {
        Path::new(links.iter().map(|&i| Id::from_index(i)).collect())
    }

    /// Links: 0 origin, 1 and 2 parallel, 3 destination.
    fn fork() -> PathSet {
        PathSet::new(vec![OdPaths {
            od: OdPair {
                origin: Id::from_index(0),
                destination: Id::from_index(3),
            },
            nev: vec![p(&[0, 1, 3])],
            ev: vec![p(&[0, 1, 3]), p(&[0, 2, 3])],
        }])
    }

    #[test]
    fn fractions_follow_flows() {
        let paths = fork();
        let layout = StateLayout::new(4, &paths, 0);
        let state = layout
            .pack(&[0.0; 4], &[0.2], &[0.2, 0.6], &[])
            .unwrap();
        let r = RoutingMatrixBuilder::new(&layout, &paths).build(&state);

        assert!((r[(0, 1)] - 0.4).abs() < 1e-12);
        assert!((r[(0, 2)] - 0.6).abs() < 1e-12);
        assert!((r[(1, 3)] - 1.0).abs() < 1e-12);
        assert!((r[(2, 3)] - 1.0).abs() < 1e-12);
        // Destination row carries no onward flow
        assert_eq!(r.row(3).sum(), 0.0);
    }

    #[test]
    fn unused_link_has_zero_row() {
        let paths = fork();
        let layout = StateLayout::new(4, &paths, 0);
        let state = layout
            .pack(&[0.0; 4], &[0.5], &[0.5, 0.0], &[])
            .unwrap();
        let r = RoutingMatrixBuilder::new(&layout, &paths).build(&state);
        assert_eq!(r.row(2).sum(), 0.0);
        assert!((r.row(0).sum() - 1.0).abs() < 1e-12);
    }
}
