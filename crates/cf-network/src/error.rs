//! Network-specific error types.

use cf_core::{LinkId, NodeId, Real, StationId};

/// Network construction, validation and path classification errors.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// A link refers to a node that doesn't exist.
    InvalidNodeRef { link: LinkId, node: NodeId },

    /// An origin or destination link is not a self-loop.
    TerminalNotSelfLoop { link: LinkId },

    /// Two origin links share the same origin identifier.
    DuplicateOrigin { name: String },

    /// Two destination links share the same destination identifier.
    DuplicateDestination { name: String },

    /// A station is attached to more than one EV-only link.
    DuplicateStation { station: StationId },

    /// A capacity override is non-positive or non-finite.
    InvalidCapacity { link: LinkId, value: Real },

    /// Adjacency list is inconsistent (link in node's list but link doesn't start there).
    InconsistentAdjacency { link: LinkId, node: NodeId },

    /// Link ID is outside the network.
    UnknownLink { link: LinkId },

    /// A link was used where a terminal link of a given kind was expected.
    NotATerminal {
        link: LinkId,
        expected: &'static str,
    },

    /// A path traverses more than one EV-only link.
    TooManyChargingLinks { count: usize },

    /// A path does not start at an origin link or end at a destination link,
    /// or uses a terminal link in its interior.
    MalformedPath { what: &'static str },
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::InvalidNodeRef { link, node } => {
                write!(f, "Link {} refers to non-existent node {}", link, node)
            }
            NetworkError::TerminalNotSelfLoop { link } => {
                write!(f, "Origin/destination link {} must be a self-loop", link)
            }
            NetworkError::DuplicateOrigin { name } => {
                write!(f, "Origin '{}' is defined by more than one link", name)
            }
            NetworkError::DuplicateDestination { name } => {
                write!(f, "Destination '{}' is defined by more than one link", name)
            }
            NetworkError::DuplicateStation { station } => {
                write!(f, "Station {} is attached to more than one EV-only link", station)
            }
            NetworkError::InvalidCapacity { link, value } => {
                write!(f, "Link {} has invalid capacity {}", link, value)
            }
            NetworkError::InconsistentAdjacency { link, node } => {
                write!(
                    f,
                    "Link {} in node {}'s out-list but doesn't start at that node",
                    link, node
                )
            }
            NetworkError::UnknownLink { link } => {
                write!(f, "Link {} does not exist", link)
            }
            NetworkError::NotATerminal { link, expected } => {
                write!(f, "Link {} is not {} link", link, expected)
            }
            NetworkError::TooManyChargingLinks { count } => {
                write!(f, "Path uses {} EV-only links (at most 1 allowed)", count)
            }
            NetworkError::MalformedPath { what } => {
                write!(f, "Malformed path: {}", what)
            }
        }
    }
}

impl std::error::Error for NetworkError {}
