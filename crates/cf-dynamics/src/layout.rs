//! Layout of the flat dynamics state vector.
//!
//! `[densities | NEV path flows | EV path flows | prices]`. Flow blocks are laid
//! out OD pair by OD pair in active-OD order, paths in enumeration order.

use std::ops::Range;

use cf_core::Real;
use cf_network::{PathSet, VehicleClass};

use crate::error::{DynamicsError, DynamicsResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    n_links: usize,
    /// Offsets of each OD pair's NEV block (absolute), length n_od + 1.
    nev_offsets: Vec<usize>,
    /// Offsets of each OD pair's EV block (absolute), length n_od + 1.
    ev_offsets: Vec<usize>,
    n_prices: usize,
}

impl StateLayout {
    pub fn new(n_links: usize, paths: &PathSet, n_prices: usize) -> Self {
        let mut nev_offsets = Vec::with_capacity(paths.len() + 1);
        let mut at = n_links;
        nev_offsets.push(at);
        for od in paths.pairs() {
            at += od.nev.len();
            nev_offsets.push(at);
        }

        let mut ev_offsets = Vec::with_capacity(paths.len() + 1);
        ev_offsets.push(at);
        for od in paths.pairs() {
            at += od.ev.len();
            ev_offsets.push(at);
        }

        Self {
            n_links,
            nev_offsets,
            ev_offsets,
            n_prices,
        }
    }

    fn offsets(&self, class: VehicleClass) -> &[usize] {
        match class {
            VehicleClass::Nev => &self.nev_offsets,
            VehicleClass::Ev => &self.ev_offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.price_range().end
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn link_count(&self) -> usize {
        self.n_links
    }

    pub fn od_count(&self) -> usize {
        self.nev_offsets.len() - 1
    }

    pub fn price_count(&self) -> usize {
        self.n_prices
    }

    pub fn density_range(&self) -> Range<usize> {
        0..self.n_links
    }

    /// Range of a whole class block.
    pub fn class_range(&self, class: VehicleClass) -> Range<usize> {
        let offsets = self.offsets(class);
        offsets[0]..offsets[offsets.len() - 1]
    }

    /// Range of the path flows of one OD pair and class.
    ///
    /// An out-of-range OD index yields an empty range at the block end.
    pub fn od_range(&self, od: usize, class: VehicleClass) -> Range<usize> {
        let offsets = self.offsets(class);
        match (offsets.get(od), offsets.get(od + 1)) {
            (Some(&start), Some(&end)) => start..end,
            _ => {
                let end = offsets[offsets.len() - 1];
                end..end
            }
        }
    }

    pub fn price_range(&self) -> Range<usize> {
        let start = self.ev_offsets[self.ev_offsets.len() - 1];
        start..start + self.n_prices
    }

    pub fn densities<'a>(&self, state: &'a [Real]) -> &'a [Real] {
        &state[self.density_range()]
    }

    pub fn flows<'a>(&self, state: &'a [Real], od: usize, class: VehicleClass) -> &'a [Real] {
        &state[self.od_range(od, class)]
    }

    pub fn prices<'a>(&self, state: &'a [Real]) -> &'a [Real] {
        &state[self.price_range()]
    }

    /// Fail unless `state` has exactly the layout length.
    pub fn check(&self, state: &[Real]) -> DynamicsResult<()> {
        if state.len() != self.len() {
            return Err(DynamicsError::StateLength {
                expected: self.len(),
                got: state.len(),
            });
        }
        Ok(())
    }

    /// Concatenate the blocks into a state vector.
    pub fn pack(
        &self,
        densities: &[Real],
        nev: &[Real],
        ev: &[Real],
        prices: &[Real],
    ) -> DynamicsResult<Vec<Real>> {
        let expect = |range: Range<usize>, got: usize| {
            if range.len() == got {
                Ok(())
            } else {
                Err(DynamicsError::StateLength {
                    expected: range.len(),
                    got,
                })
            }
        };
        expect(self.density_range(), densities.len())?;
        expect(self.class_range(VehicleClass::Nev), nev.len())?;
        expect(self.class_range(VehicleClass::Ev), ev.len())?;
        expect(self.price_range(), prices.len())?;

        let mut state = Vec::with_capacity(self.len());
        state.extend_from_slice(densities);
        state.extend_from_slice(nev);
        state.extend_from_slice(ev);
        state.extend_from_slice(prices);
        Ok(state)
    }
}
