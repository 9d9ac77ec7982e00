//! Edge-state-based connectivity constraint.

use std::collections::{HashSet, VecDeque};

use super::{ConstraintViolation, ConstraintViolationReport, TopologyConstraint};
use crate::model::{LinkState, NodeHandle, Topology};

/// The subgraph induced by links in one of the allowed states must be
/// weakly connected.
///
/// One violation is reported per connected component beyond the component
/// that contains the first node of the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeStateBasedConnectivityConstraint {
    states: Vec<LinkState>,
}

impl EdgeStateBasedConnectivityConstraint {
    pub fn new(states: impl IntoIterator<Item = LinkState>) -> Self {
        let mut unique = Vec::new();
        for state in states {
            if !unique.contains(&state) {
                unique.push(state);
            }
        }
        Self { states: unique }
    }

    /// Connectivity of the physical topology (all states allowed)
    pub fn physical() -> Self {
        Self::new(LinkState::ALL)
    }

    /// Connectivity via ACTIVE and UNCLASSIFIED links
    pub fn weak() -> Self {
        Self::new([LinkState::Active, LinkState::Unclassified])
    }

    /// Connectivity via ACTIVE links only
    pub fn active_only() -> Self {
        Self::new([LinkState::Active])
    }

    pub fn states(&self) -> &[LinkState] {
        &self.states
    }

    /// Weakly connected components of the induced subgraph, starting with
    /// the component of the first node in arena order
    pub fn components(&self, topology: &Topology) -> Vec<Vec<NodeHandle>> {
        let mut visited: HashSet<NodeHandle> = HashSet::new();
        let mut components = Vec::new();

        for (start, _) in topology.nodes() {
            if !visited.insert(start) {
                continue;
            }

            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                let Some(node) = topology.node(current) else {
                    continue;
                };
                let neighbors = node
                    .outgoing()
                    .iter()
                    .chain(node.incoming())
                    .filter_map(|&l| topology.link(l))
                    .filter(|link| self.states.contains(&link.state()))
                    .map(|link| if link.source() == current { link.target() } else { link.source() });

                for neighbor in neighbors {
                    if visited.insert(neighbor) {
                        component.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
            components.push(component);
        }

        components
    }

    /// Whether the induced subgraph is weakly connected
    pub fn is_fulfilled(&self, topology: &Topology) -> bool {
        self.components(topology).len() <= 1
    }

    fn format_states(&self) -> String {
        self.states
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TopologyConstraint for EdgeStateBasedConnectivityConstraint {
    fn name(&self) -> &'static str {
        "EdgeStateBasedConnectivityConstraint"
    }

    fn check_on_topology(&self, topology: &Topology, report: &mut ConstraintViolationReport) {
        let components = self.components(topology);
        let Some((first, rest)) = components.split_first() else {
            return;
        };
        let anchor = first.first().map(|&n| topology.node_id(n)).unwrap_or("");

        for component in rest {
            let ids: Vec<&str> = component.iter().map(|&n| topology.node_id(n)).collect();
            report.add(ConstraintViolation {
                constraint: self.name(),
                affected_nodes: component.clone(),
                affected_links: Vec::new(),
                cause: format!(
                    "Nodes [{}] are not connected to '{}' via links in states [{}]",
                    ids.join(", "),
                    anchor,
                    self.format_states()
                ),
            });
        }
    }
}
