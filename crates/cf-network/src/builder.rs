//! Incremental network builder.

use cf_core::{LinkId, NodeId, Real, StationId};

use crate::error::NetworkError;
use crate::graph::{Link, LinkKind, Network, Node};
use crate::validate;

/// Builder for constructing a network incrementally.
///
/// Use `add_node` and the `add_*` link methods to build up the network,
/// then call `build()` to validate and freeze it into an immutable `Network`.
/// Links receive contiguous indices in insertion order.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl NetworkBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with a display position and return its ID.
    pub fn add_node(&mut self, name: impl Into<String>, position: [Real; 2]) -> NodeId {
        let id = NodeId::from_index(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            name: name.into(),
            position,
        });
        id
    }

    /// Add a link of any kind and return its ID.
    pub fn add_link(&mut self, from: NodeId, to: NodeId, kind: LinkKind) -> LinkId {
        let id = LinkId::from_index(self.links.len() as u32);
        self.links.push(Link { id, from, to, kind });
        id
    }

    /// Add an origin self-loop at `node`.
    pub fn add_origin(&mut self, node: NodeId, origin: impl Into<String>) -> LinkId {
        self.add_link(
            node,
            node,
            LinkKind::Origin {
                origin: origin.into(),
            },
        )
    }

    /// Add a destination self-loop at `node`.
    pub fn add_destination(&mut self, node: NodeId, destination: impl Into<String>) -> LinkId {
        self.add_link(
            node,
            node,
            LinkKind::Destination {
                destination: destination.into(),
            },
        )
    }

    /// Add a mixed link using the shared congestion parameters.
    pub fn add_mixed(&mut self, from: NodeId, to: NodeId) -> LinkId {
        self.add_link(from, to, LinkKind::Mixed { capacity: None })
    }

    /// Add a mixed link with its own outflow capacity.
    pub fn add_mixed_with_capacity(&mut self, from: NodeId, to: NodeId, capacity: Real) -> LinkId {
        self.add_link(
            from,
            to,
            LinkKind::Mixed {
                capacity: Some(capacity),
            },
        )
    }

    /// Add an EV-only charging-access link served by `station`.
    pub fn add_ev_only(
        &mut self,
        from: NodeId,
        to: NodeId,
        station: impl Into<StationId>,
    ) -> LinkId {
        self.add_link(
            from,
            to,
            LinkKind::EvOnly {
                station: station.into(),
            },
        )
    }

    /// Build and validate the network, returning an immutable `Network`.
    ///
    /// This performs validation and constructs compact out-link adjacency.
    pub fn build(self) -> Result<Network, NetworkError> {
        validate::validate_structure(&self.nodes, &self.links)?;

        let (out_offsets, out_links) = Self::build_adjacency(&self.nodes, &self.links);

        validate::validate_adjacency(&self.nodes, &self.links, &out_offsets, &out_links)?;

        Ok(Network {
            nodes: self.nodes,
            links: self.links,
            out_offsets,
            out_links,
        })
    }

    /// Build compact adjacency lists: for each node, collect the links leaving it.
    fn build_adjacency(nodes: &[Node], links: &[Link]) -> (Vec<usize>, Vec<LinkId>) {
        let mut per_node: Vec<Vec<LinkId>> = vec![Vec::new(); nodes.len()];
        for link in links {
            per_node[link.from.slot()].push(link.id);
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat = Vec::with_capacity(links.len());
        offsets.push(0);
        for mut list in per_node {
            list.sort_by_key(|l| l.index());
            flat.extend_from_slice(&list);
            offsets.push(flat.len());
        }

        (offsets, flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_basic() {
        let mut builder = NetworkBuilder::new();
        let o = builder.add_node("O", [0.0, 0.0]);
        let d = builder.add_node("D", [1.0, 0.0]);
        let l0 = builder.add_origin(o, "O1");
        let l1 = builder.add_mixed(o, d);
        let l2 = builder.add_destination(d, "D1");

        assert_eq!(o.index(), 0);
        assert_eq!(d.index(), 1);
        assert_eq!([l0.index(), l1.index(), l2.index()], [0, 1, 2]);
        assert_eq!(builder.nodes.len(), 2);
        assert_eq!(builder.links.len(), 3);
    }

    #[test]
    fn builder_build_simple() {
        let mut builder = NetworkBuilder::new();
        let o = builder.add_node("O", [0.0, 0.0]);
        let a = builder.add_node("A", [1.0, 0.0]);
        builder.add_origin(o, "O1");
        let m = builder.add_mixed(o, a);
        let e = builder.add_ev_only(o, a, "S1");
        builder.add_destination(a, "D1");

        let net = builder.build().unwrap();
        assert_eq!(net.nodes().len(), 2);
        assert_eq!(net.link_count(), 4);

        // Self-loop origin, then both parallel links, in index order
        let out = net.out_links(o);
        assert_eq!(out.len(), 3);
        assert_eq!(&out[1..], &[m, e]);
        assert_eq!(net.out_links(a).len(), 1);
    }

    #[test]
    fn build_rejects_non_loop_origin() {
        let mut builder = NetworkBuilder::new();
        let o = builder.add_node("O", [0.0, 0.0]);
        let a = builder.add_node("A", [1.0, 0.0]);
        builder.add_link(
            o,
            a,
            LinkKind::Origin {
                origin: "O1".into(),
            },
        );
        let err = builder.build().unwrap_err();
        assert!(matches!(err, NetworkError::TerminalNotSelfLoop { .. }));
    }
}
