//! Topology graph model.
//!
//! This module contains the mutable graph that topology control operates
//! on: nodes, directed links with distance, required transmission power and
//! state, and the reverse-link pairing of physical (undirected) links.

mod arena;
pub mod report;
pub mod topology;
pub mod types;

// Re-export key types for easier access
pub use report::format_edge_state_report;
pub use topology::Topology;
pub use types::{
    LifetimeOrder, Link, LinkHandle, LinkOrder, LinkState, LinkStateChange, Node, NodeHandle, TopologyError,
};
