//! Core network data structures.

use std::collections::BTreeMap;

use cf_core::{LinkId, NodeId, Real, StationId};

/// A node in the road network (an intersection or a terminal location).
///
/// Nodes carry no traffic state; the position is display metadata only.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub position: [Real; 2],
}

/// Kind of a link, with the attributes that only make sense for that kind.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkKind {
    /// Self-loop demand source.
    Origin { origin: String },
    /// Self-loop demand sink.
    Destination { destination: String },
    /// Road shared by all vehicles. `capacity` overrides the shared outflow capacity.
    Mixed { capacity: Option<Real> },
    /// Charging-access link usable only by electric vehicles.
    EvOnly { station: StationId },
}

impl LinkKind {
    /// Short lowercase label, used in logs and result series.
    pub fn label(&self) -> &'static str {
        match self {
            LinkKind::Origin { .. } => "origin",
            LinkKind::Destination { .. } => "destination",
            LinkKind::Mixed { .. } => "mixed",
            LinkKind::EvOnly { .. } => "ev-only",
        }
    }
}

/// A directed link between two nodes (possibly a self-loop).
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: LinkKind,
}

impl Link {
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    pub fn is_origin(&self) -> bool {
        matches!(self.kind, LinkKind::Origin { .. })
    }

    pub fn is_destination(&self) -> bool {
        matches!(self.kind, LinkKind::Destination { .. })
    }

    /// Origin or destination link.
    pub fn is_terminal(&self) -> bool {
        self.is_origin() || self.is_destination()
    }

    pub fn is_ev_only(&self) -> bool {
        matches!(self.kind, LinkKind::EvOnly { .. })
    }

    /// Station served by this link, if it is an EV-only link.
    pub fn station(&self) -> Option<&StationId> {
        match &self.kind {
            LinkKind::EvOnly { station } => Some(station),
            _ => None,
        }
    }

    /// Per-link capacity override, if any.
    pub fn capacity_override(&self) -> Option<Real> {
        match self.kind {
            LinkKind::Mixed { capacity } => capacity,
            _ => None,
        }
    }
}

/// The network: a validated, immutable collection of nodes and links.
///
/// Link indices are zero-based and contiguous in insertion order; they are the
/// coordinate system of the density block of the dynamics state.
#[derive(Debug, Clone)]
pub struct Network {
    pub(crate) nodes: Vec<Node>,
    pub(crate) links: Vec<Link>,

    /// Offsets for node->out-link adjacency: node i's links are in
    /// out_links[out_offsets[i]..out_offsets[i+1]].
    pub(crate) out_offsets: Vec<usize>,

    /// Flat list of out-links, sorted by node ID then link ID for determinism.
    pub(crate) out_links: Vec<LinkId>,
}

impl Network {
    /// Return all nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return all links in index order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Get a node by ID (returns None if ID out of bounds).
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot())
    }

    /// Get a link by ID (returns None if ID out of bounds).
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(id.slot())
    }

    /// Links leaving a node, in link-index order.
    pub fn out_links(&self, node_id: NodeId) -> &[LinkId] {
        let idx = node_id.slot();
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.out_offsets[idx];
        let end = self.out_offsets[idx + 1];
        &self.out_links[start..end]
    }

    /// All origin links in index order.
    pub fn origin_links(&self) -> Vec<LinkId> {
        self.links
            .iter()
            .filter(|l| l.is_origin())
            .map(|l| l.id)
            .collect()
    }

    /// All destination links in index order.
    pub fn destination_links(&self) -> Vec<LinkId> {
        self.links
            .iter()
            .filter(|l| l.is_destination())
            .map(|l| l.id)
            .collect()
    }

    /// Station -> access link, sorted by station ID.
    pub fn station_links(&self) -> BTreeMap<StationId, LinkId> {
        self.links
            .iter()
            .filter_map(|l| l.station().map(|s| (s.clone(), l.id)))
            .collect()
    }

    /// Find the origin link carrying a given origin identifier.
    pub fn find_origin(&self, name: &str) -> Option<LinkId> {
        self.links.iter().find_map(|l| match &l.kind {
            LinkKind::Origin { origin } if origin == name => Some(l.id),
            _ => None,
        })
    }

    /// Find the destination link carrying a given destination identifier.
    pub fn find_destination(&self, name: &str) -> Option<LinkId> {
        self.links.iter().find_map(|l| match &l.kind {
            LinkKind::Destination { destination } if destination == name => Some(l.id),
            _ => None,
        })
    }

    /// Origin identifier of an origin link.
    pub fn origin_name(&self, link: LinkId) -> Option<&str> {
        match &self.link(link)?.kind {
            LinkKind::Origin { origin } => Some(origin),
            _ => None,
        }
    }

    /// Destination identifier of a destination link.
    pub fn destination_name(&self, link: LinkId) -> Option<&str> {
        match &self.link(link)?.kind {
            LinkKind::Destination { destination } => Some(destination),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::Id;

    #[test]
    fn link_kind_labels() {
        assert_eq!(LinkKind::Mixed { capacity: None }.label(), "mixed");
        assert_eq!(
            LinkKind::EvOnly {
                station: StationId::from("S1")
            }
            .label(),
            "ev-only"
        );
    }

    #[test]
    fn link_accessors() {
        let link = Link {
            id: Id::from_index(3),
            from: Id::from_index(1),
            to: Id::from_index(2),
            kind: LinkKind::EvOnly {
                station: StationId::from("S2"),
            },
        };
        assert!(link.is_ev_only());
        assert!(!link.is_terminal());
        assert!(!link.is_self_loop());
        assert_eq!(link.station().map(|s| s.as_str()), Some("S2"));
        assert_eq!(link.capacity_override(), None);

        let origin = Link {
            id: Id::from_index(0),
            from: Id::from_index(0),
            to: Id::from_index(0),
            kind: LinkKind::Origin {
                origin: "O1".into(),
            },
        };
        assert!(origin.is_terminal());
        assert!(origin.is_self_loop());
    }
}
