//! Energy-aware kTC consistency constraint.
//!
//! Links are weighted by their estimated remaining lifetime, the remaining
//! energy of the source divided by the required transmission power. The
//! weakest link of a triangle is redundant when
//!
//! ```text
//! k * lifetime(e) <= max(lifetime(e1), lifetime(e2))
//! ```
//!
//! which is distance-kTC applied to the inverse lifetimes. Of two links with
//! equal lifetime, the one with the larger ID is the weaker.

use std::cmp::Ordering;

use super::ktc::{check_ktc_consistency, KtcPredicate};
use super::{ConstraintViolationReport, TopologyConstraint};
use crate::model::{LifetimeOrder, Link, Topology};

/// Numeric part of the energy-aware kTC predicate. `NaN` inputs never
/// satisfy it.
pub fn energy_ktc_predicate(k: f64, lifetime: f64, detour_lifetime_1: f64, detour_lifetime_2: f64) -> bool {
    if lifetime.is_nan() || detour_lifetime_1.is_nan() || detour_lifetime_2.is_nan() {
        return false;
    }
    k * lifetime <= detour_lifetime_1.max(detour_lifetime_2)
}

/// Checks that link states agree with energy-aware kTC for a fixed `k`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyKtcConstraint {
    k: f64,
}

impl EnergyKtcConstraint {
    pub fn new(k: f64) -> Self {
        Self { k }
    }
}

impl KtcPredicate for EnergyKtcConstraint {
    type Key = LifetimeOrder;

    fn with_k(k: f64) -> Self {
        Self::new(k)
    }

    fn k(&self) -> f64 {
        self.k
    }

    fn constraint_name(&self) -> &'static str {
        "EnergyKtcConstraint"
    }

    fn key(&self, topology: &Topology, link: &Link) -> LifetimeOrder {
        topology.lifetime_order_of(link)
    }

    fn compare(&self, topology: &Topology, a: &Link, b: &Link) -> Ordering {
        topology.compare_lifetimes(a, b)
    }

    fn holds(&self, topology: &Topology, e: &Link, e1: &Link, e2: &Link) -> bool {
        energy_ktc_predicate(
            self.k,
            topology.estimated_lifetime(e),
            topology.estimated_lifetime(e1),
            topology.estimated_lifetime(e2),
        )
    }
}

impl TopologyConstraint for EnergyKtcConstraint {
    fn name(&self) -> &'static str {
        self.constraint_name()
    }

    fn check_on_topology(&self, topology: &Topology, report: &mut ConstraintViolationReport) {
        check_ktc_consistency(self, topology, report);
    }
}
