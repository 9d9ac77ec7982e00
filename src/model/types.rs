//! Core types of the topology graph model.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Handle of a node stored in a [`Topology`](super::Topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}@{}", self.index, self.generation)
    }
}

/// Handle of a directed link stored in a [`Topology`](super::Topology)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Display for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}@{}", self.index, self.generation)
    }
}

/// Classification of a link in the control topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    /// Kept in the control topology
    Active,
    /// Removed from the control topology
    Inactive,
    /// Not decided yet
    Unclassified,
}

impl LinkState {
    /// All link states
    pub const ALL: [LinkState; 3] = [LinkState::Active, LinkState::Inactive, LinkState::Unclassified];

    /// Single-letter abbreviation used in edge state reports
    pub fn abbreviation(&self) -> char {
        match self {
            LinkState::Active => 'A',
            LinkState::Inactive => 'I',
            LinkState::Unclassified => 'U',
        }
    }
}

impl Default for LinkState {
    fn default() -> Self {
        LinkState::Unclassified
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Active => write!(f, "ACTIVE"),
            LinkState::Inactive => write!(f, "INACTIVE"),
            LinkState::Unclassified => write!(f, "UNCLASSIFIED"),
        }
    }
}

/// A radio in the topology
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: Arc<str>,
    pub(crate) remaining_energy: f64,
    pub(crate) outgoing: Vec<LinkHandle>,
    pub(crate) incoming: Vec<LinkHandle>,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remaining energy, `NaN` if unknown
    pub fn remaining_energy(&self) -> f64 {
        self.remaining_energy
    }

    pub fn outgoing(&self) -> &[LinkHandle] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[LinkHandle] {
        &self.incoming
    }

    /// Number of incident links in either direction
    pub fn degree(&self) -> usize {
        self.outgoing.len() + self.incoming.len()
    }
}

/// A directed potential link between two radios
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) id: Arc<str>,
    pub(crate) source: NodeHandle,
    pub(crate) target: NodeHandle,
    pub(crate) distance: f64,
    pub(crate) required_transmission_power: f64,
    pub(crate) state: LinkState,
    pub(crate) reverse: Option<LinkHandle>,
}

impl Link {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source(&self) -> NodeHandle {
        self.source
    }

    pub fn target(&self) -> NodeHandle {
        self.target
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn required_transmission_power(&self) -> f64 {
        self.required_transmission_power
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// The link representing the opposite direction, if paired
    pub fn reverse(&self) -> Option<LinkHandle> {
        self.reverse
    }
}

/// Position of a link in the total order used for the longest-link test.
///
/// Links compare by distance first (IEEE total order), then by the smaller
/// and larger endpoint IDs, then by link ID. Both directions of a physical
/// link therefore rank identically against every link they can share a
/// triangle with. IDs are shared with the topology, so building an order
/// never copies strings.
#[derive(Debug, Clone)]
pub struct LinkOrder {
    pub distance: f64,
    pub low_endpoint: Arc<str>,
    pub high_endpoint: Arc<str>,
    pub link_id: Arc<str>,
}

impl PartialEq for LinkOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LinkOrder {}

impl PartialOrd for LinkOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LinkOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_distance_keys(
            (self.distance, &*self.low_endpoint, &*self.high_endpoint, &*self.link_id),
            (other.distance, &*other.low_endpoint, &*other.high_endpoint, &*other.link_id),
        )
    }
}

/// Compare borrowed `(distance, low endpoint, high endpoint, link ID)` keys
/// in link order
pub(crate) fn compare_distance_keys(a: (f64, &str, &str, &str), b: (f64, &str, &str, &str)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.cmp(b.1))
        .then_with(|| a.2.cmp(b.2))
        .then_with(|| a.3.cmp(b.3))
}

/// Position of a link in the order used for the weakest-link test of
/// energy-aware kTC.
///
/// A link is weaker the shorter its estimated remaining lifetime. Links of
/// equal lifetime compare by link ID, the larger ID being weaker.
#[derive(Debug, Clone)]
pub struct LifetimeOrder {
    pub lifetime: f64,
    pub link_id: Arc<str>,
}

impl PartialEq for LifetimeOrder {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LifetimeOrder {}

impl PartialOrd for LifetimeOrder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LifetimeOrder {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_lifetime_keys((self.lifetime, &*self.link_id), (other.lifetime, &*other.link_id))
    }
}

/// Compare borrowed `(lifetime, link ID)` keys; the weaker link is greater
pub(crate) fn compare_lifetime_keys(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

/// An effective change of a link state recorded by the topology journal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkStateChange {
    pub link: LinkHandle,
    pub old: LinkState,
    pub new: LinkState,
}

/// Errors raised by topology mutations and lookups
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),

    #[error("Node ID already exists: {0}")]
    DuplicateNodeId(String),

    #[error("Link ID already exists: {0}")]
    DuplicateLinkId(String),

    #[error("Node '{node}' still has {count} incident links")]
    NodeHasIncidentLinks { node: String, count: usize },

    #[error("Links '{forward}' and '{backward}' cannot be paired: {reason}")]
    ReverseLinkMismatch {
        forward: String,
        backward: String,
        reason: String,
    },
}
