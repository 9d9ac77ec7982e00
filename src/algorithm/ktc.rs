//! Incremental kTC.
//!
//! Links are processed in ascending order of the kTC variant (shortest
//! first for distance-kTC, longest-lived first for energy-aware kTC). A link
//! becomes INACTIVE iff it closes a triangle with two smaller links that are
//! not INACTIVE and the variant's predicate holds for that triangle; every
//! other link becomes ACTIVE. Because a link only depends on strictly
//! smaller links, the result is unique and the incremental repair can
//! restrict itself to links that are larger than the one that changed.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use log::{debug, trace};

use super::{
    ensure_detached, AlgorithmError, AlgorithmId, AlgorithmParameters, AttributeKind, OperationMode,
    TopologyControlAlgorithm, KTC_PARAMETER_K,
};
use crate::constraints::{DistanceKtcConstraint, EnergyKtcConstraint, KtcPredicate, TopologyConstraint};
use crate::model::{Link, LinkHandle, LinkState, NodeHandle, Topology};

/// A kTC predicate that can drive [`IncrementalKtc`]
pub trait KtcVariant: KtcPredicate + TopologyConstraint + 'static {
    const ID: AlgorithmId;

    /// Attributes the link order and predicate are computed from
    const REQUIRED_ATTRIBUTES: &'static [AttributeKind];
}

impl KtcVariant for DistanceKtcConstraint {
    const ID: AlgorithmId = AlgorithmId::DistanceKtc;
    const REQUIRED_ATTRIBUTES: &'static [AttributeKind] = &[AttributeKind::Distance, AttributeKind::LinkState];
}

impl KtcVariant for EnergyKtcConstraint {
    const ID: AlgorithmId = AlgorithmId::EnergyKtc;
    const REQUIRED_ATTRIBUTES: &'static [AttributeKind] = &[
        AttributeKind::RemainingEnergy,
        AttributeKind::RequiredTransmissionPower,
        AttributeKind::LinkState,
    ];
}

/// kTC with batch and incremental entry points
#[derive(Debug, Clone)]
pub struct IncrementalKtc<P> {
    predicate: Option<P>,
    mode: OperationMode,
}

/// Distance-based kTC (`D_KTC`)
pub type IncrementalDistanceKtc = IncrementalKtc<DistanceKtcConstraint>;

/// Energy-aware kTC (`E_KTC`)
pub type IncrementalEnergyKtc = IncrementalKtc<EnergyKtcConstraint>;

impl<P: KtcVariant> IncrementalKtc<P> {
    pub fn new(mode: OperationMode) -> Self {
        Self { predicate: None, mode }
    }

    pub fn set_k(&mut self, k: f64) -> Result<(), AlgorithmError> {
        if !k.is_finite() || k < 1.0 {
            return Err(AlgorithmError::InvalidK(k));
        }
        self.predicate = Some(P::with_k(k));
        Ok(())
    }

    fn require_predicate(&self) -> Result<&P, AlgorithmError> {
        self.predicate
            .as_ref()
            .ok_or(AlgorithmError::MissingParameter(KTC_PARAMETER_K))
    }

    /// Classify all links from scratch with the given stretch factor
    pub fn run_with_k(&mut self, topology: &mut Topology, k: f64) -> Result<(), AlgorithmError> {
        self.set_k(k)?;
        self.run_on_topology(topology)
    }

    /// Find a detour of two admitted (not INACTIVE) links that makes `link`
    /// redundant. Detours are enumerated from the source side.
    fn find_admitted_detour(predicate: &P, topology: &Topology, link: LinkHandle) -> Option<(LinkHandle, LinkHandle)> {
        let e = topology.link(link)?;
        let outgoing = topology.outgoing_links(e.source()).ok()?;

        for &first in outgoing {
            let Some(e1) = topology.link(first) else {
                continue;
            };
            let w = e1.target();
            if first == link || w == e.target() || e1.state() == LinkState::Inactive {
                continue;
            }
            for second in topology.links_between(w, e.target()) {
                let admitted = topology.link(second).is_some_and(|l| l.state() != LinkState::Inactive);
                if admitted && predicate.check_predicate(topology, link, first, second) {
                    return Some((first, second));
                }
            }
        }
        None
    }

    fn classify(predicate: &P, topology: &Topology, link: LinkHandle) -> LinkState {
        match Self::find_admitted_detour(predicate, topology, link) {
            Some((first, second)) => {
                trace!(
                    "Link {} is redundant via {} and {}",
                    topology.link(link).map(Link::id).unwrap_or(""),
                    topology.link(first).map(Link::id).unwrap_or(""),
                    topology.link(second).map(Link::id).unwrap_or("")
                );
                LinkState::Inactive
            }
            None => LinkState::Active,
        }
    }

    /// Links whose classification may depend on `link`: those sharing its
    /// source as source or its target as target
    fn dependents(topology: &Topology, link: &Link) -> Vec<LinkHandle> {
        let mut dependents = Vec::new();
        if let Ok(outgoing) = topology.outgoing_links(link.source()) {
            dependents.extend_from_slice(outgoing);
        }
        if let Ok(incoming) = topology.incoming_links(link.target()) {
            dependents.extend_from_slice(incoming);
        }
        dependents
    }

    /// `link` together with every link depending on it
    fn with_dependents(topology: &Topology, link: LinkHandle) -> Vec<LinkHandle> {
        let mut seeds = vec![link];
        if let Some(entry) = topology.link(link) {
            seeds.extend(Self::dependents(topology, entry));
        }
        seeds
    }

    /// Re-evaluate the seeded links in ascending link order and propagate
    /// every state change to larger dependent links. Returns the number of
    /// links whose state changed.
    fn repair(&self, topology: &mut Topology, seeds: Vec<LinkHandle>) -> Result<usize, AlgorithmError> {
        let predicate = self.require_predicate()?;
        let mut worklist: BTreeSet<(P::Key, LinkHandle)> = seeds
            .into_iter()
            .filter_map(|link| topology.link(link).map(|entry| (predicate.key(topology, entry), link)))
            .collect();

        let mut changed = 0;
        while let Some((_, link)) = worklist.pop_first() {
            let state = Self::classify(predicate, topology, link);
            let old = topology.set_link_state(link, state)?;
            if old == state {
                continue;
            }
            changed += 1;

            let entry = topology.try_link(link)?;
            for dependent in Self::dependents(topology, entry) {
                if let Some(dependent_entry) = topology.link(dependent) {
                    if predicate.compare(topology, dependent_entry, entry) == Ordering::Greater {
                        worklist.insert((predicate.key(topology, dependent_entry), dependent));
                    }
                }
            }
        }
        Ok(changed)
    }

    /// React to a change that affects `seeds`: repair in incremental mode,
    /// unclassify in batch mode. Before the first run in incremental mode
    /// there is nothing to repair.
    fn process_seeds(&self, topology: &mut Topology, seeds: Vec<LinkHandle>) -> Result<(), AlgorithmError> {
        match self.mode {
            OperationMode::Incremental if self.predicate.is_some() => {
                let seeded = seeds.len();
                let changed = self.repair(topology, seeds)?;
                debug!("{} repair: {} seeds, {} state changes", P::ID, seeded, changed);
            }
            OperationMode::Incremental => {}
            OperationMode::Batch => {
                for link in seeds {
                    topology.set_link_state(link, LinkState::Unclassified)?;
                }
            }
        }
        Ok(())
    }

    /// Links in `links` that are greater than `reference`
    fn greater_than(&self, topology: &Topology, reference: &Link, links: Vec<LinkHandle>) -> Vec<LinkHandle> {
        let Some(predicate) = self.predicate.as_ref() else {
            return links;
        };
        links
            .into_iter()
            .filter(|&l| {
                topology
                    .link(l)
                    .is_some_and(|entry| predicate.compare(topology, entry, reference) == Ordering::Greater)
            })
            .collect()
    }
}

impl<P: KtcVariant> TopologyControlAlgorithm for IncrementalKtc<P> {
    fn id(&self) -> AlgorithmId {
        P::ID
    }

    fn operation_mode(&self) -> OperationMode {
        self.mode
    }

    fn set_operation_mode(&mut self, mode: OperationMode) {
        self.mode = mode;
    }

    fn configure(&mut self, parameters: &AlgorithmParameters) -> Result<(), AlgorithmError> {
        self.set_k(parameters.require(KTC_PARAMETER_K)?)
    }

    fn algorithm_specific_constraints(&self) -> Vec<Box<dyn TopologyConstraint>> {
        match &self.predicate {
            Some(predicate) => vec![Box::new(predicate.clone()) as Box<dyn TopologyConstraint>],
            None => Vec::new(),
        }
    }

    fn required_attributes(&self) -> &'static [AttributeKind] {
        P::REQUIRED_ATTRIBUTES
    }

    fn run_on_topology(&mut self, topology: &mut Topology) -> Result<(), AlgorithmError> {
        let predicate = self.require_predicate()?;

        let mut handles: Vec<LinkHandle> = topology.links().map(|(handle, _)| handle).collect();
        for &link in &handles {
            topology.set_link_state(link, LinkState::Unclassified)?;
        }
        handles.sort_by(|&a, &b| match (topology.link(a), topology.link(b)) {
            (Some(a), Some(b)) => predicate.compare(topology, a, b),
            _ => a.cmp(&b),
        });

        let mut inactive = 0;
        for &link in &handles {
            if Self::find_admitted_detour(predicate, topology, link).is_some() {
                topology.set_link_state(link, LinkState::Inactive)?;
                inactive += 1;
            }
        }

        for &link in &handles {
            if topology.try_link(link)?.state() == LinkState::Unclassified {
                topology.set_link_state(link, LinkState::Active)?;
            }
        }

        debug!(
            "{} run with k = {}: {} links, {} inactive",
            P::ID,
            predicate.k(),
            handles.len(),
            inactive
        );
        Ok(())
    }

    fn handle_node_addition(&mut self, topology: &mut Topology, node: NodeHandle) -> Result<(), AlgorithmError> {
        topology.try_node(node)?;
        Ok(())
    }

    fn handle_node_deletion(&mut self, topology: &mut Topology, node: NodeHandle) -> Result<(), AlgorithmError> {
        ensure_detached(topology, node)
    }

    fn handle_link_addition(&mut self, topology: &mut Topology, link: LinkHandle) -> Result<(), AlgorithmError> {
        let entry = topology.try_link(link)?;
        let mut seeds = vec![link];
        seeds.extend(self.greater_than(topology, entry, Self::dependents(topology, entry)));
        self.process_seeds(topology, seeds)
    }

    fn handle_link_deletion(&mut self, topology: &mut Topology, removed: &Link) -> Result<(), AlgorithmError> {
        let seeds = self.greater_than(topology, removed, Self::dependents(topology, removed));
        self.process_seeds(topology, seeds)
    }

    /// A changed remaining energy moves every outgoing link of the node in
    /// the lifetime order
    fn handle_node_attribute_modification(
        &mut self,
        topology: &mut Topology,
        node: NodeHandle,
        kind: AttributeKind,
    ) -> Result<(), AlgorithmError> {
        let outgoing = topology.outgoing_links(node)?.to_vec();
        if !self.requires_updates_of(kind) || kind != AttributeKind::RemainingEnergy {
            return Ok(());
        }

        let mut seeds = Vec::new();
        for link in outgoing {
            seeds.extend(Self::with_dependents(topology, link));
        }
        self.process_seeds(topology, seeds)
    }

    fn handle_link_attribute_modification(
        &mut self,
        topology: &mut Topology,
        link: LinkHandle,
        kind: AttributeKind,
    ) -> Result<(), AlgorithmError> {
        topology.try_link(link)?;
        if !self.requires_updates_of(kind) || kind == AttributeKind::RemainingEnergy {
            return Ok(());
        }
        self.process_seeds(topology, Self::with_dependents(topology, link))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintViolationReport;

    fn state(topology: &Topology, id: &str) -> LinkState {
        topology.link(topology.link_by_id(id).unwrap()).unwrap().state()
    }

    fn assert_consistent(topology: &Topology, k: f64) {
        let mut report = ConstraintViolationReport::new();
        DistanceKtcConstraint::new(k).check_on_topology(topology, &mut report);
        assert!(report.is_empty(), "{}", report.format_summary(topology));
        assert!(!topology.contains_unclassified_links());
    }

    fn assert_energy_consistent(topology: &Topology, k: f64) {
        let mut report = ConstraintViolationReport::new();
        EnergyKtcConstraint::new(k).check_on_topology(topology, &mut report);
        assert!(report.is_empty(), "{}", report.format_summary(topology));
        assert!(!topology.contains_unclassified_links());
    }

    /// Lifetimes e12 = 2, e21 = 6, e13 = 1, e31 = 6, e23 = 2, e32 = 4
    fn energy_triangle() -> Topology {
        let mut topology = Topology::new();
        let n1 = topology.add_node("n1", 10.0).unwrap();
        let n2 = topology.add_node("n2", 30.0).unwrap();
        let n3 = topology.add_node("n3", 60.0).unwrap();
        topology.add_undirected_link_pair("e12", "e21", n1, n2, 1.0, 5.0).unwrap();
        topology.add_undirected_link_pair("e13", "e31", n1, n3, 1.0, 10.0).unwrap();
        topology.add_undirected_link_pair("e23", "e32", n2, n3, 1.0, 15.0).unwrap();
        topology
    }

    fn inactive_links(topology: &Topology) -> Vec<String> {
        let mut ids: Vec<String> = topology
            .links()
            .filter(|(_, l)| l.state() == LinkState::Inactive)
            .map(|(_, l)| l.id().to_string())
            .collect();
        ids.sort();
        ids
    }

    /// A, B, C with AB = BC = 1 and AC = 1.9
    fn abc() -> Topology {
        let mut topology = Topology::new();
        let a = topology.add_node("A", 10.0).unwrap();
        let b = topology.add_node("B", 10.0).unwrap();
        let c = topology.add_node("C", 10.0).unwrap();
        topology.add_undirected_link_pair("eAB", "eBA", a, b, 1.0, 1.0).unwrap();
        topology.add_undirected_link_pair("eBC", "eCB", b, c, 1.0, 1.0).unwrap();
        topology.add_undirected_link_pair("eAC", "eCA", a, c, 1.9, 1.0).unwrap();
        topology
    }

    #[test]
    fn test_longest_link_of_triangle_is_inactivated() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        for id in ["eAB", "eBA", "eBC", "eCB"] {
            assert_eq!(state(&topology, id), LinkState::Active, "{}", id);
        }
        assert_eq!(state(&topology, "eAC"), LinkState::Inactive);
        assert_eq!(state(&topology, "eCA"), LinkState::Inactive);
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_large_k_keeps_every_link() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 2.0).unwrap();
        assert!(topology.links().all(|(_, l)| l.state() == LinkState::Active));
    }

    #[test]
    fn test_run_is_idempotent() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();
        let first: Vec<LinkState> = topology.links().map(|(_, l)| l.state()).collect();
        algorithm.run_with_k(&mut topology, 1.5).unwrap();
        let second: Vec<LinkState> = topology.links().map(|(_, l)| l.state()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_equilateral_triangle_breaks_ties_by_endpoint_ids() {
        let mut topology = Topology::new();
        let a = topology.add_node("A", 1.0).unwrap();
        let b = topology.add_node("B", 1.0).unwrap();
        let c = topology.add_node("C", 1.0).unwrap();
        topology.add_undirected_link_pair("eAB", "eBA", a, b, 1.0, 1.0).unwrap();
        topology.add_undirected_link_pair("eBC", "eCB", b, c, 1.0, 1.0).unwrap();
        topology.add_undirected_link_pair("eAC", "eCA", a, c, 1.0, 1.0).unwrap();

        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.0).unwrap();

        // B-C has the largest endpoint pair and is the only redundant pair
        assert_eq!(state(&topology, "eBC"), LinkState::Inactive);
        assert_eq!(state(&topology, "eCB"), LinkState::Inactive);
        for id in ["eAB", "eBA", "eAC", "eCA"] {
            assert_eq!(state(&topology, id), LinkState::Active, "{}", id);
        }
        assert_consistent(&topology, 1.0);
    }

    #[test]
    fn test_nan_distances_never_inactivate() {
        let mut topology = abc();
        let ac = topology.link_by_id("eAC").unwrap();
        topology.set_link_distance(ac, f64::NAN).unwrap();

        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();
        assert_eq!(state(&topology, "eAC"), LinkState::Active);
        assert_eq!(state(&topology, "eCA"), LinkState::Inactive);
    }

    #[test]
    fn test_invalid_k_is_rejected() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        assert_eq!(algorithm.run_with_k(&mut topology, 0.5), Err(AlgorithmError::InvalidK(0.5)));
        assert!(matches!(algorithm.set_k(f64::INFINITY), Err(AlgorithmError::InvalidK(_))));
        assert!(algorithm.set_k(f64::NAN).is_err());
        assert_eq!(
            algorithm.run_on_topology(&mut topology),
            Err(AlgorithmError::MissingParameter("k"))
        );
        assert!(topology.contains_unclassified_links());
    }

    #[test]
    fn test_incremental_link_addition_inactivates_longer_link() {
        let mut topology = Topology::new();
        let a = topology.add_node("A", 1.0).unwrap();
        let b = topology.add_node("B", 1.0).unwrap();
        let c = topology.add_node("C", 1.0).unwrap();
        topology.add_undirected_link_pair("eAB", "eBA", a, b, 1.0, 1.0).unwrap();
        topology.add_undirected_link_pair("eAC", "eCA", a, c, 1.9, 1.0).unwrap();

        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();
        assert_eq!(state(&topology, "eAC"), LinkState::Active);

        let bc = topology.add_directed_link("eBC", b, c, 1.0, 1.0).unwrap();
        algorithm.handle_link_addition(&mut topology, bc).unwrap();
        let cb = topology.add_directed_link("eCB", c, b, 1.0, 1.0).unwrap();
        topology.connect_reverse_links(bc, cb).unwrap();
        algorithm.handle_link_addition(&mut topology, cb).unwrap();

        assert_eq!(state(&topology, "eBC"), LinkState::Active);
        assert_eq!(state(&topology, "eAC"), LinkState::Inactive);
        assert_eq!(state(&topology, "eCA"), LinkState::Inactive);
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_incremental_link_deletion_reactivates_longer_link() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let bc = topology.link_by_id("eBC").unwrap();
        let removed = topology.remove_link(bc).unwrap();
        algorithm.handle_link_deletion(&mut topology, &removed).unwrap();

        assert_eq!(state(&topology, "eAC"), LinkState::Active);
        // C -> A still has the detour C -> B -> A
        assert_eq!(state(&topology, "eCA"), LinkState::Inactive);
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_incremental_distance_change_swaps_roles() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        for id in ["eAC", "eCA"] {
            let link = topology.link_by_id(id).unwrap();
            topology.set_link_distance(link, 0.5).unwrap();
            algorithm
                .handle_link_attribute_modification(&mut topology, link, AttributeKind::Distance)
                .unwrap();
        }
        for id in ["eAB", "eBA", "eBC", "eCB"] {
            let link = topology.link_by_id(id).unwrap();
            topology.set_link_distance(link, 2.0).unwrap();
            algorithm
                .handle_link_attribute_modification(&mut topology, link, AttributeKind::Distance)
                .unwrap();
        }

        assert_eq!(state(&topology, "eAC"), LinkState::Active);
        assert_eq!(state(&topology, "eBC"), LinkState::Inactive);
        assert_eq!(state(&topology, "eCB"), LinkState::Inactive);
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_incremental_state_override_is_repaired() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let ab = topology.link_by_id("eAB").unwrap();
        topology.set_link_state(ab, LinkState::Inactive).unwrap();
        algorithm
            .handle_link_attribute_modification(&mut topology, ab, AttributeKind::LinkState)
            .unwrap();
        assert_eq!(state(&topology, "eAB"), LinkState::Active);
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_incremental_handlers_wait_for_first_run() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        let ab = topology.link_by_id("eAB").unwrap();
        algorithm.handle_link_addition(&mut topology, ab).unwrap();
        assert_eq!(state(&topology, "eAB"), LinkState::Unclassified);
    }

    #[test]
    fn test_batch_handlers_unclassify_affected_links() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let ab = topology.link_by_id("eAB").unwrap();
        topology.set_link_distance(ab, 1.2).unwrap();
        algorithm
            .handle_link_attribute_modification(&mut topology, ab, AttributeKind::Distance)
            .unwrap();

        assert_eq!(state(&topology, "eAB"), LinkState::Unclassified);
        assert_eq!(state(&topology, "eAC"), LinkState::Unclassified);
        // B -> A neither leaves A nor enters B
        assert_eq!(state(&topology, "eBA"), LinkState::Active);

        algorithm.run_on_topology(&mut topology).unwrap();
        assert_consistent(&topology, 1.5);
    }

    #[test]
    fn test_node_deletion_requires_detached_node() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Incremental);
        let a = topology.node_by_id("A").unwrap();
        assert!(matches!(
            algorithm.handle_node_deletion(&mut topology, a),
            Err(AlgorithmError::Topology(_))
        ));
    }

    #[test]
    fn test_energy_ktc_inactivates_shortest_lived_link() {
        let mut topology = energy_triangle();
        let mut algorithm = IncrementalEnergyKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        assert_eq!(inactive_links(&topology), vec!["e13"]);
        assert_energy_consistent(&topology, 1.5);
    }

    #[test]
    fn test_batch_energy_update_unclassifies_outgoing_links() {
        let mut topology = energy_triangle();
        let mut algorithm = IncrementalEnergyKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        // e31 = 1.5, e32 = 1
        let n3 = topology.node_by_id("n3").unwrap();
        topology.set_remaining_energy(n3, 15.0).unwrap();
        algorithm
            .handle_node_attribute_modification(&mut topology, n3, AttributeKind::RemainingEnergy)
            .unwrap();

        assert_eq!(state(&topology, "e31"), LinkState::Unclassified);
        assert_eq!(state(&topology, "e32"), LinkState::Unclassified);
        assert_eq!(state(&topology, "e13"), LinkState::Inactive);
        assert_eq!(state(&topology, "e23"), LinkState::Active);

        algorithm.run_on_topology(&mut topology).unwrap();
        assert_eq!(inactive_links(&topology), vec!["e13", "e32"]);
        assert_energy_consistent(&topology, 1.5);
    }

    #[test]
    fn test_incremental_energy_update_is_repaired() {
        let mut topology = energy_triangle();
        let mut algorithm = IncrementalEnergyKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let n3 = topology.node_by_id("n3").unwrap();
        topology.set_remaining_energy(n3, 15.0).unwrap();
        algorithm
            .handle_node_attribute_modification(&mut topology, n3, AttributeKind::RemainingEnergy)
            .unwrap();

        assert_eq!(inactive_links(&topology), vec!["e13", "e32"]);
        assert_energy_consistent(&topology, 1.5);
    }

    #[test]
    fn test_equal_lifetimes_inactivate_larger_id_only() {
        // e12 = e13 = 2, e21 = e23 = 10, e31 = e32 = 10.4
        let mut topology = Topology::new();
        let n1 = topology.add_node("n1", 10.0).unwrap();
        let n2 = topology.add_node("n2", 50.0).unwrap();
        let n3 = topology.add_node("n3", 52.0).unwrap();
        topology.add_undirected_link_pair("e12", "e21", n1, n2, 1.0, 5.0).unwrap();
        topology.add_undirected_link_pair("e13", "e31", n1, n3, 1.0, 5.0).unwrap();
        topology.add_undirected_link_pair("e23", "e32", n2, n3, 1.0, 5.0).unwrap();

        let mut algorithm = IncrementalEnergyKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.1).unwrap();

        assert_eq!(inactive_links(&topology), vec!["e13"]);
        assert_energy_consistent(&topology, 1.1);
    }

    #[test]
    fn test_incremental_power_change_is_repaired() {
        let mut topology = energy_triangle();
        let mut algorithm = IncrementalEnergyKtc::new(OperationMode::Incremental);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let e12 = topology.link_by_id("e12").unwrap();
        topology.set_link_required_transmission_power(e12, 20.0).unwrap();
        algorithm
            .handle_link_attribute_modification(&mut topology, e12, AttributeKind::RequiredTransmissionPower)
            .unwrap();

        assert_eq!(inactive_links(&topology), vec!["e12"]);
        assert_energy_consistent(&topology, 1.5);

        // Distances do not enter the lifetime order
        topology.set_link_distance(e12, 100.0).unwrap();
        topology.set_link_state(e12, LinkState::Active).unwrap();
        algorithm
            .handle_link_attribute_modification(&mut topology, e12, AttributeKind::Distance)
            .unwrap();
        assert_eq!(state(&topology, "e12"), LinkState::Active);
    }

    #[test]
    fn test_distance_ktc_ignores_energy_updates() {
        let mut topology = abc();
        let mut algorithm = IncrementalDistanceKtc::new(OperationMode::Batch);
        algorithm.run_with_k(&mut topology, 1.5).unwrap();

        let a = topology.node_by_id("A").unwrap();
        topology.set_remaining_energy(a, 0.5).unwrap();
        algorithm
            .handle_node_attribute_modification(&mut topology, a, AttributeKind::RemainingEnergy)
            .unwrap();
        assert!(!topology.contains_unclassified_links());
    }
}
