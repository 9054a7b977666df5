//! cf-network: road network model and path enumeration.
//!
//! Provides:
//! - Immutable network representation with typed links (origin, destination,
//!   mixed, EV-only)
//! - Builder pattern for construction
//! - Validation logic
//! - Path enumeration and classification by EV-only link count
//! - Station index for the price block of the dynamics state

pub mod builder;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod paths;
pub mod validate;

pub use builder::NetworkBuilder;
pub use error::NetworkError;
pub use graph::{Link, LinkKind, Network, Node};
pub use indexing::StationIndex;
pub use paths::{
    EvPathPolicy, OdPair, OdPaths, Path, PathClass, PathEnumerator, PathSet, VehicleClass,
    classify,
};
