//! Network validation logic.

use std::collections::HashSet;

use cf_core::{LinkId, NodeId};

use crate::error::NetworkError;
use crate::graph::{Link, LinkKind, Node};

/// Validate the network structure: all references exist, terminal links are
/// self-loops, identifiers are unique, capacities are usable.
pub(crate) fn validate_structure(nodes: &[Node], links: &[Link]) -> Result<(), NetworkError> {
    let mut origins = HashSet::new();
    let mut destinations = HashSet::new();
    let mut stations = HashSet::new();

    for (i, link) in links.iter().enumerate() {
        // IDs are contiguous and match their position
        if link.id.slot() != i {
            return Err(NetworkError::UnknownLink { link: link.id });
        }

        for node in [link.from, link.to] {
            if node.slot() >= nodes.len() {
                return Err(NetworkError::InvalidNodeRef {
                    link: link.id,
                    node,
                });
            }
        }

        match &link.kind {
            LinkKind::Origin { origin } => {
                if !link.is_self_loop() {
                    return Err(NetworkError::TerminalNotSelfLoop { link: link.id });
                }
                if !origins.insert(origin.as_str()) {
                    return Err(NetworkError::DuplicateOrigin {
                        name: origin.clone(),
                    });
                }
            }
            LinkKind::Destination { destination } => {
                if !link.is_self_loop() {
                    return Err(NetworkError::TerminalNotSelfLoop { link: link.id });
                }
                if !destinations.insert(destination.as_str()) {
                    return Err(NetworkError::DuplicateDestination {
                        name: destination.clone(),
                    });
                }
            }
            LinkKind::EvOnly { station } => {
                if !stations.insert(station) {
                    return Err(NetworkError::DuplicateStation {
                        station: station.clone(),
                    });
                }
            }
            LinkKind::Mixed { capacity } => {
                if let Some(cap) = *capacity {
                    if !(cap.is_finite() && cap > 0.0) {
                        return Err(NetworkError::InvalidCapacity {
                            link: link.id,
                            value: cap,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

/// Validate out-link adjacency for consistency.
pub(crate) fn validate_adjacency(
    nodes: &[Node],
    links: &[Link],
    out_offsets: &[usize],
    out_links: &[LinkId],
) -> Result<(), NetworkError> {
    if out_offsets.len() != nodes.len() + 1 {
        return Err(NetworkError::InconsistentAdjacency {
            link: LinkId::from_index(0),
            node: nodes.first().map_or(NodeId::from_index(0), |n| n.id),
        });
    }

    for node in nodes {
        let idx = node.id.slot();
        let start = out_offsets[idx];
        let end = out_offsets[idx + 1];

        for &link_id in &out_links[start..end] {
            let link = links
                .get(link_id.slot())
                .ok_or(NetworkError::UnknownLink { link: link_id })?;
            if link.from != node.id {
                return Err(NetworkError::InconsistentAdjacency {
                    link: link_id,
                    node: node.id,
                });
            }
        }
    }

    // Every link appears exactly once
    let mut seen: HashSet<LinkId> = HashSet::new();
    for &link_id in out_links {
        if !seen.insert(link_id) {
            return Err(NetworkError::InconsistentAdjacency {
                link: link_id,
                node: links[link_id.slot()].from,
            });
        }
    }
    for link in links {
        if !seen.contains(&link.id) {
            return Err(NetworkError::InconsistentAdjacency {
                link: link.id,
                node: link.from,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_core::{Id, StationId};

    fn node(i: u32) -> Node {
        Node {
            id: Id::from_index(i),
            name: format!("N{i}"),
            position: [0.0, 0.0],
        }
    }

    fn link(i: u32, from: u32, to: u32, kind: LinkKind) -> Link {
        Link {
            id: Id::from_index(i),
            from: Id::from_index(from),
            to: Id::from_index(to),
            kind,
        }
    }

    #[test]
    fn validate_empty_network() {
        assert!(validate_structure(&[], &[]).is_ok());
    }

    #[test]
    fn validate_invalid_node_ref() {
        let nodes = vec![node(0)];
        let links = vec![link(0, 0, 99, LinkKind::Mixed { capacity: None })];
        let result = validate_structure(&nodes, &links);
        assert!(matches!(result, Err(NetworkError::InvalidNodeRef { .. })));
    }

    #[test]
    fn validate_duplicate_station() {
        let nodes = vec![node(0), node(1)];
        let s = || LinkKind::EvOnly {
            station: StationId::from("S1"),
        };
        let links = vec![link(0, 0, 1, s()), link(1, 1, 0, s())];
        let result = validate_structure(&nodes, &links);
        assert!(matches!(result, Err(NetworkError::DuplicateStation { .. })));
    }

    #[test]
    fn validate_duplicate_origin() {
        let nodes = vec![node(0), node(1)];
        let o = || LinkKind::Origin {
            origin: "O1".into(),
        };
        let links = vec![link(0, 0, 0, o()), link(1, 1, 1, o())];
        let result = validate_structure(&nodes, &links);
        assert!(matches!(result, Err(NetworkError::DuplicateOrigin { .. })));
    }

    #[test]
    fn validate_bad_capacity() {
        let nodes = vec![node(0), node(1)];
        let links = vec![link(
            0,
            0,
            1,
            LinkKind::Mixed {
                capacity: Some(0.0),
            },
        )];
        let result = validate_structure(&nodes, &links);
        assert!(matches!(result, Err(NetworkError::InvalidCapacity { .. })));
    }

    #[test]
    fn validate_adjacency_detects_wrong_start() {
        let nodes = vec![node(0), node(1)];
        let links = vec![link(0, 0, 1, LinkKind::Mixed { capacity: None })];
        // Link 0 listed under node 1
        let offsets = vec![0, 0, 1];
        let out = vec![Id::from_index(0)];
        let result = validate_adjacency(&nodes, &links, &offsets, &out);
        assert!(matches!(
            result,
            Err(NetworkError::InconsistentAdjacency { .. })
        ));
    }
}
