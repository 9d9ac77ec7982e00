//! No-unclassified-links constraint.

use super::{ConstraintViolation, ConstraintViolationReport, TopologyConstraint};
use crate::model::{LinkState, Topology};

/// Every link must be ACTIVE or INACTIVE. Used after a complete topology
/// control run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUnclassifiedLinksConstraint;

impl NoUnclassifiedLinksConstraint {
    pub fn new() -> Self {
        Self
    }
}

impl TopologyConstraint for NoUnclassifiedLinksConstraint {
    fn name(&self) -> &'static str {
        "NoUnclassifiedLinksConstraint"
    }

    fn check_on_topology(&self, topology: &Topology, report: &mut ConstraintViolationReport) {
        for (handle, link) in topology.links() {
            if link.state() == LinkState::Unclassified {
                report.add(ConstraintViolation {
                    constraint: self.name(),
                    affected_nodes: Vec::new(),
                    affected_links: vec![handle],
                    cause: format!("Link '{}' is still unclassified", link.id()),
                });
            }
        }
    }
}
