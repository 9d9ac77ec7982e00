//! Distance-kTC consistency constraint.
//!
//! For a link `e = (u -> v)` and a two-hop detour `e1 = (u -> w)`,
//! `e2 = (w -> v)`, the kTC predicate holds when `e` is the longest link of
//! the triangle (in link order) and
//!
//! ```text
//! distance(e) >= k * min(distance(e1), distance(e2))
//! ```
//!
//! A classification is consistent when every INACTIVE link has a detour of
//! two ACTIVE links for which the predicate holds, and no ACTIVE link has
//! one. The incremental kTC algorithm evaluates the same predicate, so this
//! constraint doubles as its conformance oracle.

use std::cmp::Ordering;

use super::ktc::{check_ktc_consistency, find_detour, KtcPredicate};
use super::{ConstraintViolationReport, TopologyConstraint};
use crate::model::{Link, LinkHandle, LinkOrder, LinkState, Topology};

/// Numeric part of the kTC predicate. `NaN` inputs never satisfy it.
pub fn ktc_predicate(k: f64, distance: f64, detour_distance_1: f64, detour_distance_2: f64) -> bool {
    if distance.is_nan() || detour_distance_1.is_nan() || detour_distance_2.is_nan() {
        return false;
    }
    distance >= k * detour_distance_1.min(detour_distance_2)
}

/// Checks that link states agree with distance-kTC for a fixed `k`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceKtcConstraint {
    k: f64,
}

impl DistanceKtcConstraint {
    pub fn new(k: f64) -> Self {
        Self { k }
    }

    /// Find a detour of two ACTIVE links that makes `link` redundant
    pub fn find_active_detour(&self, topology: &Topology, link: LinkHandle) -> Option<(LinkHandle, LinkHandle)> {
        find_detour(self, topology, link, |state| state == LinkState::Active)
    }
}

impl KtcPredicate for DistanceKtcConstraint {
    type Key = LinkOrder;

    fn with_k(k: f64) -> Self {
        Self::new(k)
    }

    fn k(&self) -> f64 {
        self.k
    }

    fn constraint_name(&self) -> &'static str {
        "DistanceKtcConstraint"
    }

    fn key(&self, topology: &Topology, link: &Link) -> LinkOrder {
        topology.order_of(link)
    }

    fn compare(&self, topology: &Topology, a: &Link, b: &Link) -> Ordering {
        topology.compare_link_values(a, b)
    }

    fn holds(&self, _topology: &Topology, e: &Link, e1: &Link, e2: &Link) -> bool {
        ktc_predicate(self.k, e.distance(), e1.distance(), e2.distance())
    }
}

impl TopologyConstraint for DistanceKtcConstraint {
    fn name(&self) -> &'static str {
        self.constraint_name()
    }

    fn check_on_topology(&self, topology: &Topology, report: &mut ConstraintViolationReport) {
        check_ktc_consistency(self, topology, report);
    }
}
