//! Constraint engine.
//!
//! Constraints are immutable predicates over a [`Topology`]. Checking a
//! constraint never mutates the topology; every breach is appended to a
//! [`ConstraintViolationReport`] as data rather than raised as an error.

pub mod connectivity;
pub mod distance_ktc;
pub mod energy_ktc;
pub mod ktc;
pub mod unclassified;

use std::collections::BTreeMap;
use std::fmt;

use crate::model::{LinkHandle, NodeHandle, Topology};

pub use connectivity::EdgeStateBasedConnectivityConstraint;
pub use distance_ktc::{ktc_predicate, DistanceKtcConstraint};
pub use energy_ktc::{energy_ktc_predicate, EnergyKtcConstraint};
pub use ktc::KtcPredicate;
pub use unclassified::NoUnclassifiedLinksConstraint;

/// A named predicate over a topology
pub trait TopologyConstraint: fmt::Debug {
    /// Name used in violation reports and histograms
    fn name(&self) -> &'static str;

    /// Append one violation per breach found in `topology` to `report`
    fn check_on_topology(&self, topology: &Topology, report: &mut ConstraintViolationReport);
}

/// A single detected breach of a constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    pub constraint: &'static str,
    pub affected_nodes: Vec<NodeHandle>,
    pub affected_links: Vec<LinkHandle>,
    pub cause: String,
}

/// Violations collected from one or more constraint checks
#[derive(Debug, Clone, Default)]
pub struct ConstraintViolationReport {
    violations: Vec<ConstraintViolation>,
}

impl ConstraintViolationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: ConstraintViolation) {
        self.violations.push(violation);
    }

    pub fn violations(&self) -> &[ConstraintViolation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of violations per constraint name
    pub fn histogram(&self) -> BTreeMap<&'static str, usize> {
        let mut histogram = BTreeMap::new();
        for violation in &self.violations {
            *histogram.entry(violation.constraint).or_insert(0) += 1;
        }
        histogram
    }

    /// Violations of one constraint
    pub fn violations_of(&self, constraint: &str) -> impl Iterator<Item = &ConstraintViolation> {
        let constraint = constraint.to_string();
        self.violations.iter().filter(move |v| v.constraint == constraint)
    }

    /// Format the violations grouped by constraint, listing the affected
    /// links and nodes of each violation
    pub fn format_summary(&self, topology: &Topology) -> String {
        let mut summary = String::from("[");
        for (constraint, count) in self.histogram() {
            summary.push_str(&format!("{} : {}\n", constraint, count));
            for violation in self.violations_of(constraint) {
                let mut elements: Vec<String> = violation
                    .affected_links
                    .iter()
                    .map(|&link| format_link(topology, link))
                    .collect();
                elements.extend(
                    violation
                        .affected_nodes
                        .iter()
                        .map(|&node| topology.node_id(node).to_string()),
                );
                summary.push_str(&format!("\n\t[{}] {}\n", elements.join(","), violation.cause));
            }
            summary.push('\n');
        }
        summary.push(']');
        summary
    }
}

fn format_link(topology: &Topology, link: LinkHandle) -> String {
    match topology.link(link) {
        Some(l) => format!(
            "{} (s={}, d={:.3}, p={:.3})",
            l.id(),
            l.state().abbreviation(),
            l.distance(),
            l.required_transmission_power()
        ),
        None => link.to_string(),
    }
}
