//! Pieces shared by the kTC variants.
//!
//! Every kTC variant ranks links in a total order where a greater link is a
//! worse one (longer for distance-kTC, shorter-lived for energy-aware kTC)
//! and evaluates a numeric predicate over triangles `u -> w -> v` closed by
//! `e = u -> v`. A link may only be made redundant by strictly better
//! links, which is what lets the algorithm classify in ascending order.

use std::cmp::Ordering;
use std::fmt;

use super::{ConstraintViolation, ConstraintViolationReport};
use crate::model::{Link, LinkHandle, LinkState, Topology};

/// Link order and triangle predicate of one kTC variant
pub trait KtcPredicate: fmt::Debug + Clone {
    /// Owned position of a link in the variant's order
    type Key: Ord + Clone + fmt::Debug;

    /// Create the predicate for stretch factor `k`
    fn with_k(k: f64) -> Self;

    fn k(&self) -> f64;

    /// Constraint name used in violation reports
    fn constraint_name(&self) -> &'static str;

    /// Owned order key of a link value
    fn key(&self, topology: &Topology, link: &Link) -> Self::Key;

    /// Compare two links in the variant's order without building keys
    fn compare(&self, topology: &Topology, a: &Link, b: &Link) -> Ordering;

    /// The numeric part of the predicate, for a link `e` and its detour
    /// links `e1`, `e2`
    fn holds(&self, topology: &Topology, e: &Link, e1: &Link, e2: &Link) -> bool;

    /// Whether `link` is made redundant by the detour `first`, `second`.
    ///
    /// The three links must form a triangle `u -> w -> v` for `link = u -> v`,
    /// and `link` must be strictly the greatest of the three.
    fn check_predicate(&self, topology: &Topology, link: LinkHandle, first: LinkHandle, second: LinkHandle) -> bool {
        let (Some(e), Some(e1), Some(e2)) = (topology.link(link), topology.link(first), topology.link(second)) else {
            return false;
        };
        if !is_triangle(e, e1, e2) {
            return false;
        }
        if self.compare(topology, e, e1) != Ordering::Greater || self.compare(topology, e, e2) != Ordering::Greater {
            return false;
        }
        self.holds(topology, e, e1, e2)
    }
}

/// `e1 = u -> w` and `e2 = w -> v` close a triangle with `e = u -> v`
pub fn is_triangle(e: &Link, e1: &Link, e2: &Link) -> bool {
    e1.source() == e.source()
        && e2.target() == e.target()
        && e1.target() == e2.source()
        && e1.target() != e.source()
        && e1.target() != e.target()
}

/// Find a detour of two links accepted by `admit` that makes `link`
/// redundant.
///
/// Detours are enumerated from the target side: every link entering the
/// target of `link` is combined with the links from the source of `link` to
/// its start.
pub fn find_detour<P: KtcPredicate>(
    predicate: &P,
    topology: &Topology,
    link: LinkHandle,
    admit: impl Fn(LinkState) -> bool,
) -> Option<(LinkHandle, LinkHandle)> {
    let e = topology.link(link)?;
    let incoming = topology.incoming_links(e.target()).ok()?;

    for &second in incoming {
        let Some(e2) = topology.link(second) else {
            continue;
        };
        if !admit(e2.state()) || e2.source() == e.source() {
            continue;
        }
        for first in topology.links_between(e.source(), e2.source()) {
            let admitted = topology.link(first).is_some_and(|l| admit(l.state()));
            if admitted && predicate.check_predicate(topology, link, first, second) {
                return Some((first, second));
            }
        }
    }
    None
}

/// Report every INACTIVE link without an ACTIVE detour satisfying the
/// predicate, and every ACTIVE link with one. UNCLASSIFIED links are
/// ignored.
pub fn check_ktc_consistency<P: KtcPredicate>(
    predicate: &P,
    topology: &Topology,
    report: &mut ConstraintViolationReport,
) {
    let is_active = |state: LinkState| state == LinkState::Active;
    for (handle, link) in topology.links() {
        match link.state() {
            LinkState::Inactive => {
                if find_detour(predicate, topology, handle, is_active).is_none() {
                    report.add(ConstraintViolation {
                        constraint: predicate.constraint_name(),
                        affected_nodes: Vec::new(),
                        affected_links: vec![handle],
                        cause: format!(
                            "Inactive link '{}' has no active detour satisfying kTC with k = {}",
                            link.id(),
                            predicate.k()
                        ),
                    });
                }
            }
            LinkState::Active => {
                if let Some((first, second)) = find_detour(predicate, topology, handle, is_active) {
                    report.add(ConstraintViolation {
                        constraint: predicate.constraint_name(),
                        affected_nodes: Vec::new(),
                        affected_links: vec![handle, first, second],
                        cause: format!("Active link '{}' is redundant under kTC with k = {}", link.id(), predicate.k()),
                    });
                }
            }
            LinkState::Unclassified => {}
        }
    }
}
