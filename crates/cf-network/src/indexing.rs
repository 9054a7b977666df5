//! Station index: a stable mapping between stations and their access links.

use cf_core::{LinkId, StationId};

use crate::graph::Network;

/// Stations sorted by identifier, each with its EV-only access link.
///
/// The position of a station in this index is its position in the price
/// block of the state vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationIndex {
    stations: Vec<StationId>,
    links: Vec<LinkId>,
}

impl StationIndex {
    pub fn from_network(network: &Network) -> Self {
        let (stations, links) = network.station_links().into_iter().unzip();
        Self { stations, links }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn stations(&self) -> &[StationId] {
        &self.stations
    }

    /// Position of the station served by an EV-only link.
    pub fn position_of_link(&self, link: LinkId) -> Option<usize> {
        self.links.iter().position(|&l| l == link)
    }

    /// Iterate over (station, access link) pairs in station order.
    pub fn iter(&self) -> impl Iterator<Item = (&StationId, LinkId)> {
        self.stations.iter().zip(self.links.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::NetworkBuilder;

    #[test]
    fn stations_sorted_by_id() {
        let mut b = NetworkBuilder::new();
        let a = b.add_node("A", [0.0, 0.0]);
        let c = b.add_node("C", [1.0, 0.0]);
        let l_s2 = b.add_ev_only(a, c, "S2");
        let l_s1 = b.add_ev_only(c, a, "S1");
        let net = b.build().unwrap();

        let idx = StationIndex::from_network(&net);
        assert_eq!(idx.len(), 2);
        let pairs: Vec<_> = idx.iter().map(|(s, l)| (s.as_str(), l)).collect();
        assert_eq!(pairs, vec![("S1", l_s1), ("S2", l_s2)]);
        assert_eq!(idx.position_of_link(l_s1), Some(0));
        assert_eq!(idx.position_of_link(l_s2), Some(1));
    }
}
