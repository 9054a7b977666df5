//! Path enumeration and classification.
//!
//! Paths are enumerated per (origin link, destination link) pair as simple
//! edge paths between the injection node (start of the origin link) and the
//! collection node (start of the destination link). Each candidate is wrapped
//! with its terminal links and classified by how many EV-only links it uses.

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use cf_core::{LinkId, NodeId};

use crate::error::NetworkError;
use crate::graph::Network;

/// An ordered sequence of link indices from an origin link to a destination link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    links: Vec<LinkId>,
}

impl Path {
    pub fn new(links: Vec<LinkId>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Consecutive (upstream, downstream) link pairs along the path.
    pub fn transitions(&self) -> impl Iterator<Item = (LinkId, LinkId)> + '_ {
        self.links.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Result of classifying a path by its EV-only link count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    /// No EV-only link; usable by every vehicle.
    Shared,
    /// Exactly one EV-only link; usable by EVs only.
    Charging { link: LinkId },
}

/// Vehicle class of a path-flow block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleClass {
    Nev,
    Ev,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 2] = [VehicleClass::Nev, VehicleClass::Ev];

    pub fn label(self) -> &'static str {
        match self {
            VehicleClass::Nev => "NEV",
            VehicleClass::Ev => "EV",
        }
    }
}

/// Classify a candidate path.
///
/// The path must start at an origin link, end at a destination link, and
/// contain no terminal link elsewhere. More than one EV-only link is rejected.
pub fn classify(network: &Network, links: &[LinkId]) -> Result<PathClass, NetworkError> {
    let (first, last) = match (links.first(), links.last()) {
        (Some(&f), Some(&l)) if links.len() >= 2 => (f, l),
        _ => {
            return Err(NetworkError::MalformedPath {
                what: "path must hold an origin and a destination link",
            });
        }
    };

    let lookup = |id: LinkId| network.link(id).ok_or(NetworkError::UnknownLink { link: id });

    if !lookup(first)?.is_origin() {
        return Err(NetworkError::MalformedPath {
            what: "path does not start at an origin link",
        });
    }
    if !lookup(last)?.is_destination() {
        return Err(NetworkError::MalformedPath {
            what: "path does not end at a destination link",
        });
    }

    let mut charging = Vec::new();
    for &id in &links[1..links.len() - 1] {
        let link = lookup(id)?;
        if link.is_terminal() {
            return Err(NetworkError::MalformedPath {
                what: "terminal link used as an interior hop",
            });
        }
        if link.is_ev_only() {
            charging.push(id);
        }
    }

    match charging.as_slice() {
        [] => Ok(PathClass::Shared),
        [link] => Ok(PathClass::Charging { link: *link }),
        _ => Err(NetworkError::TooManyChargingLinks {
            count: charging.len(),
        }),
    }
}

/// Which paths electric vehicles may choose between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvPathPolicy {
    /// Charging paths if any exist for the OD pair, otherwise the shared paths.
    #[default]
    PreferChargingPathsElseShared,
    /// Shared paths followed by charging paths.
    SharedPlusCharging,
}

/// An (origin link, destination link) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OdPair {
    pub origin: LinkId,
    pub destination: LinkId,
}

/// The path lists of one active OD pair.
#[derive(Debug, Clone, PartialEq)]
pub struct OdPaths {
    pub od: OdPair,
    pub nev: Vec<Path>,
    pub ev: Vec<Path>,
}

impl OdPaths {
    pub fn paths(&self, class: VehicleClass) -> &[Path] {
        match class {
            VehicleClass::Nev => &self.nev,
            VehicleClass::Ev => &self.ev,
        }
    }
}

/// Path lists for all active OD pairs, in (origin order x destination order).
///
/// Within an OD pair, paths are listed in lexicographic order of their link
/// indices. Parallel links are never grouped by downstream node, so the
/// order depends only on link insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSet {
    pairs: Vec<OdPaths>,
}

impl PathSet {
    pub fn new(pairs: Vec<OdPaths>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[OdPaths] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, od: usize) -> Option<&OdPaths> {
        self.pairs.get(od)
    }

    /// Total number of paths of a vehicle class over all OD pairs.
    pub fn path_count(&self, class: VehicleClass) -> usize {
        self.pairs.iter().map(|p| p.paths(class).len()).sum()
    }
}

/// Enumerates and classifies the paths of a network.
pub struct PathEnumerator<'a> {
    network: &'a Network,
    graph: DiGraph<NodeId, LinkId>,
    policy: EvPathPolicy,
}

impl<'a> PathEnumerator<'a> {
    pub fn new(network: &'a Network) -> Self {
        let mut graph = DiGraph::with_capacity(network.nodes().len(), network.link_count());
        for node in network.nodes() {
            graph.add_node(node.id);
        }
        for link in network.links() {
            if !link.is_self_loop() {
                graph.add_edge(
                    NodeIndex::new(link.from.slot()),
                    NodeIndex::new(link.to.slot()),
                    link.id,
                );
            }
        }
        Self {
            network,
            graph,
            policy: EvPathPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EvPathPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enumerate over all origin and destination links of the network.
    pub fn enumerate_all(&self) -> Result<PathSet, NetworkError> {
        self.enumerate(
            &self.network.origin_links(),
            &self.network.destination_links(),
        )
    }

    /// Enumerate paths for every (origin, destination) pair.
    ///
    /// OD pairs with no usable path are left out of the result.
    pub fn enumerate(
        &self,
        origins: &[LinkId],
        destinations: &[LinkId],
    ) -> Result<PathSet, NetworkError> {
        let mut pairs = Vec::new();

        for &origin in origins {
            let origin_link = self
                .network
                .link(origin)
                .ok_or(NetworkError::UnknownLink { link: origin })?;
            if !origin_link.is_origin() {
                return Err(NetworkError::NotATerminal {
                    link: origin,
                    expected: "an origin",
                });
            }

            for &destination in destinations {
                let dest_link = self
                    .network
                    .link(destination)
                    .ok_or(NetworkError::UnknownLink { link: destination })?;
                if !dest_link.is_destination() {
                    return Err(NetworkError::NotATerminal {
                        link: destination,
                        expected: "a destination",
                    });
                }

                let od = OdPair {
                    origin,
                    destination,
                };
                let (shared, charging) =
                    self.classified_paths(origin, origin_link.from, destination, dest_link.from)?;

                let ev = match self.policy {
                    EvPathPolicy::PreferChargingPathsElseShared => {
                        if charging.is_empty() {
                            shared.clone()
                        } else {
                            charging
                        }
                    }
                    EvPathPolicy::SharedPlusCharging => {
                        shared.iter().cloned().chain(charging).collect()
                    }
                };

                if shared.is_empty() && ev.is_empty() {
                    debug!(%origin, %destination, "OD pair has no usable paths");
                    continue;
                }

                pairs.push(OdPaths {
                    od,
                    nev: shared,
                    ev,
                });
            }
        }

        let set = PathSet::new(pairs);
        debug!(
            od_pairs = set.len(),
            nev_paths = set.path_count(VehicleClass::Nev),
            ev_paths = set.path_count(VehicleClass::Ev),
            policy = ?self.policy,
            "enumerated paths"
        );
        Ok(set)
    }

    /// Shared and charging paths between two terminal links, in discovery order.
    fn classified_paths(
        &self,
        origin: LinkId,
        injection: NodeId,
        destination: LinkId,
        collection: NodeId,
    ) -> Result<(Vec<Path>, Vec<Path>), NetworkError> {
        let mut shared = Vec::new();
        let mut charging = Vec::new();

        if injection == collection {
            return Ok((shared, charging));
        }
        let reachable = has_path_connecting(
            &self.graph,
            NodeIndex::new(injection.slot()),
            NodeIndex::new(collection.slot()),
            None,
        );
        if !reachable {
            return Ok((shared, charging));
        }

        for hops in self.simple_edge_paths(injection, collection) {
            let mut links = Vec::with_capacity(hops.len() + 2);
            links.push(origin);
            links.extend(hops);
            links.push(destination);

            match classify(self.network, &links) {
                Ok(PathClass::Shared) => shared.push(Path::new(links)),
                Ok(PathClass::Charging { .. }) => charging.push(Path::new(links)),
                Err(
                    NetworkError::TooManyChargingLinks { .. } | NetworkError::MalformedPath { .. },
                ) => {}
                Err(e) => return Err(e),
            }
        }

        Ok((shared, charging))
    }

    /// All simple edge paths (no repeated node) from `source` to `target`,
    /// found by depth-first search over out-links in link-index order.
    ///
    /// Discovery order is the canonical path order: a path whose first
    /// differing link has the lower index always comes first.
    fn simple_edge_paths(&self, source: NodeId, target: NodeId) -> Vec<Vec<LinkId>> {
        let mut found = Vec::new();
        let mut visited = vec![false; self.network.nodes().len()];
        let mut hops = Vec::new();
        visited[source.slot()] = true;
        self.dfs(source, target, &mut visited, &mut hops, &mut found);
        found
    }

    fn dfs(
        &self,
        at: NodeId,
        target: NodeId,
        visited: &mut [bool],
        hops: &mut Vec<LinkId>,
        found: &mut Vec<Vec<LinkId>>,
    ) {
        for &link_id in self.network.out_links(at) {
            let Some(link) = self.network.link(link_id) else {
                continue;
            };
            if link.is_terminal() || visited[link.to.slot()] {
                continue;
            }
            hops.push(link_id);
            if link.to == target {
                found.push(hops.clone());
            } else {
                visited[link.to.slot()] = true;
                self.dfs(link.to, target, visited, hops, found);
                visited[link.to.slot()] = false;
            }
            hops.pop();
        }
    }
}
