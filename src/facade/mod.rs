//! Facade between an external, ID-based network model and topology control.
//!
//! The facade owns the canonical [`Topology`], maps external node and edge
//! IDs to internal handles in both directions, forwards every external
//! mutation to the topology and then to the configured algorithm, and runs
//! constraint checks at two checkpoints:
//!
//! - after a context event (incremental mode only): algorithm constraints,
//!   plus connectivity via ACTIVE and UNCLASSIFIED links when the physical
//!   topology is connected;
//! - after a topology control run: algorithm constraints, no unclassified
//!   links, plus connectivity via ACTIVE links when the physical topology is
//!   connected.
//!
//! Violations are accumulated into a counter that only resets on request.
//!
//! The algorithm writes link states into the topology directly. Those writes
//! are journaled by the topology and reported to [`LinkStateListener`]s once
//! per facade operation; they never reach the [`ContextEventListener`]s, so
//! no handler can be re-triggered by its own output.

pub mod events;
pub mod listeners;

use std::collections::HashMap;

use log::{debug, error, info};

pub use events::{EdgeId, EdgePrototype, LinkAttribute, NodeAttribute, NodeId, NodePrototype};
pub use listeners::{ContextEventListener, LinkStateListener};

use crate::algorithm::{
    create_algorithm, AlgorithmError, AlgorithmId, AlgorithmParameters, OperationMode, TopologyControlAlgorithm,
};
use crate::constraints::{
    ConstraintViolationReport, EdgeStateBasedConnectivityConstraint, NoUnclassifiedLinksConstraint,
    TopologyConstraint,
};
use crate::model::{LinkHandle, LinkState, LinkStateChange, NodeHandle, Topology, TopologyError};

/// Errors raised by facade operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FacadeError {
    #[error("Operation mode must be set before configuring an algorithm")]
    OperationModeNotSet,

    #[error("No topology control algorithm is configured")]
    AlgorithmNotConfigured,

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown edge: {0}")]
    UnknownEdge(EdgeId),

    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Edge already exists: {0}")]
    DuplicateEdge(EdgeId),

    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

pub type Result<T> = std::result::Result<T, FacadeError>;

pub struct TopologyControlFacade {
    topology: Topology,
    operation_mode: Option<OperationMode>,
    algorithm: Option<Box<dyn TopologyControlAlgorithm>>,
    algorithm_constraints: Vec<Box<dyn TopologyConstraint>>,

    node_handles: HashMap<NodeId, NodeHandle>,
    node_ids: HashMap<NodeHandle, NodeId>,
    link_handles: HashMap<EdgeId, LinkHandle>,
    edge_ids: HashMap<LinkHandle, EdgeId>,

    constraint_violation_count: usize,

    context_event_listeners: Vec<Box<dyn ContextEventListener>>,
    link_state_listeners: Vec<Box<dyn LinkStateListener>>,
    context_event_listeners_muted: bool,
    link_state_listeners_muted: bool,
}

impl Default for TopologyControlFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyControlFacade {
    pub fn new() -> Self {
        let mut topology = Topology::new();
        topology.set_state_journal_enabled(true);
        Self {
            topology,
            operation_mode: None,
            algorithm: None,
            algorithm_constraints: Vec::new(),
            node_handles: HashMap::new(),
            node_ids: HashMap::new(),
            link_handles: HashMap::new(),
            edge_ids: HashMap::new(),
            constraint_violation_count: 0,
            context_event_listeners: Vec::new(),
            link_state_listeners: Vec::new(),
            context_event_listeners_muted: false,
            link_state_listeners_muted: false,
        }
    }

    pub fn set_operation_mode(&mut self, mode: OperationMode) {
        self.operation_mode = Some(mode);
        if let Some(algorithm) = self.algorithm.as_deref_mut() {
            algorithm.set_operation_mode(mode);
        }
    }

    pub fn operation_mode(&self) -> Option<OperationMode> {
        self.operation_mode
    }

    /// Select the topology control algorithm. Requires an operation mode.
    pub fn configure_algorithm(&mut self, id: AlgorithmId) -> Result<()> {
        let mode = self.operation_mode.ok_or(FacadeError::OperationModeNotSet)?;
        let algorithm = create_algorithm(id, mode);
        self.algorithm_constraints = algorithm.algorithm_specific_constraints();
        self.algorithm = Some(algorithm);
        info!("Configured topology control algorithm {} in {:?} mode", id, mode);
        Ok(())
    }

    pub fn algorithm_id(&self) -> Option<AlgorithmId> {
        self.algorithm.as_ref().map(|a| a.id())
    }

    /// Names of the parameters `run` expects for the configured algorithm
    pub fn expected_parameters(&self) -> Result<&'static [&'static str]> {
        let algorithm = self.algorithm.as_ref().ok_or(FacadeError::AlgorithmNotConfigured)?;
        Ok(algorithm.id().expected_parameters())
    }

    /// Run topology control on the whole topology
    pub fn run(&mut self, parameters: &AlgorithmParameters) -> Result<()> {
        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        algorithm.configure(parameters)?;
        algorithm.run_on_topology(&mut self.topology)?;
        self.algorithm_constraints = algorithm.algorithm_specific_constraints();

        let counts = self.topology.state_counts();
        info!(
            "Topology control run of {} finished: {} active, {} inactive, {} unclassified",
            algorithm.id(),
            counts[&LinkState::Active],
            counts[&LinkState::Inactive],
            counts[&LinkState::Unclassified]
        );
        self.flush_state_changes();
        Ok(())
    }

    /// Run kTC with the given stretch factor
    pub fn run_with_k(&mut self, k: f64) -> Result<()> {
        self.run(&AlgorithmParameters::with_k(k))
    }

    pub fn add_node(&mut self, prototype: NodePrototype) -> Result<NodeHandle> {
        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        if self.node_handles.contains_key(&prototype.id) {
            return Err(FacadeError::DuplicateNode(prototype.id));
        }

        let energy = prototype.remaining_energy.unwrap_or(f64::NAN);
        let handle = self.topology.add_node(prototype.id.as_str(), energy)?;
        self.node_handles.insert(prototype.id.clone(), handle);
        self.node_ids.insert(handle, prototype.id.clone());
        debug!("Added node {}", prototype.id);

        algorithm.handle_node_addition(&mut self.topology, handle)?;
        self.notify_context_event(|l| l.node_added(&prototype.id));
        self.flush_state_changes();
        Ok(handle)
    }

    /// Remove a node together with all of its incoming and outgoing edges
    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        self.require_algorithm()?;
        let handle = self.resolve_node(id)?;

        let node = self.topology.try_node(handle)?;
        let incident: Vec<LinkHandle> = node.outgoing().iter().chain(node.incoming()).copied().collect();
        for link in incident {
            if let Some(edge) = self.edge_ids.get(&link).cloned() {
                self.remove_edge_internal(&edge)?;
            }
        }

        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        algorithm.handle_node_deletion(&mut self.topology, handle)?;
        self.topology.remove_node(handle)?;
        self.node_handles.remove(id);
        self.node_ids.remove(&handle);
        debug!("Removed node {}", id);

        self.notify_context_event(|l| l.node_removed(id));
        self.flush_state_changes();
        Ok(())
    }

    pub fn add_edge(&mut self, prototype: EdgePrototype) -> Result<LinkHandle> {
        let handle = self.add_edge_internal(&prototype)?;
        self.flush_state_changes();
        Ok(handle)
    }

    /// Add both directions of an edge and pair them as reverse edges.
    /// Returns the handles of the forward and backward link.
    pub fn add_symmetric_edge(
        &mut self,
        forward: EdgePrototype,
        backward_id: impl Into<EdgeId>,
    ) -> Result<(LinkHandle, LinkHandle)> {
        let backward = forward.reversed(backward_id);
        if backward.id == forward.id || self.link_handles.contains_key(&backward.id) {
            return Err(FacadeError::DuplicateEdge(backward.id));
        }

        let forward_handle = self.add_edge_internal(&forward)?;
        let backward_handle = self.add_edge_internal(&backward)?;
        self.topology.connect_reverse_links(forward_handle, backward_handle)?;
        self.flush_state_changes();
        Ok((forward_handle, backward_handle))
    }

    /// Pair two existing edges of opposite direction as reverse edges
    pub fn connect_opposite_edges(&mut self, forward: &EdgeId, backward: &EdgeId) -> Result<()> {
        let forward_handle = self.resolve_edge(forward)?;
        let backward_handle = self.resolve_edge(backward)?;
        self.topology.connect_reverse_links(forward_handle, backward_handle)?;
        Ok(())
    }

    /// Remove exactly one directed edge
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<()> {
        self.remove_edge_internal(id)?;
        self.flush_state_changes();
        Ok(())
    }

    /// Remove an edge and, if present, its reverse edge
    pub fn remove_edge_symmetric(&mut self, id: &EdgeId) -> Result<()> {
        let handle = self.resolve_edge(id)?;
        let reverse = self
            .topology
            .try_link(handle)?
            .reverse()
            .and_then(|r| self.edge_ids.get(&r).cloned());

        self.remove_edge_internal(id)?;
        if let Some(reverse) = reverse {
            self.remove_edge_internal(&reverse)?;
        }
        self.flush_state_changes();
        Ok(())
    }

    pub fn update_node_attribute(&mut self, id: &NodeId, attribute: NodeAttribute) -> Result<()> {
        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        let handle = *self.node_handles.get(id).ok_or_else(|| FacadeError::UnknownNode(id.clone()))?;

        match attribute {
            NodeAttribute::RemainingEnergy(energy) => {
                self.topology.set_remaining_energy(handle, energy)?;
            }
        }
        if algorithm.requires_updates_of(attribute.kind()) {
            algorithm.handle_node_attribute_modification(&mut self.topology, handle, attribute.kind())?;
        }

        self.notify_context_event(|l| l.node_attribute_updated(id, &attribute));
        self.flush_state_changes();
        Ok(())
    }

    pub fn update_edge_attribute(&mut self, id: &EdgeId, attribute: LinkAttribute) -> Result<()> {
        self.update_edge_attribute_internal(id, attribute)?;
        self.flush_state_changes();
        Ok(())
    }

    /// Apply an attribute update to an edge and its reverse edge
    pub fn update_edge_attribute_symmetric(&mut self, id: &EdgeId, attribute: LinkAttribute) -> Result<()> {
        let handle = self.resolve_edge(id)?;
        let reverse = self
            .topology
            .try_link(handle)?
            .reverse()
            .and_then(|r| self.edge_ids.get(&r).cloned());

        self.update_edge_attribute_internal(id, attribute)?;
        if let Some(reverse) = reverse {
            self.update_edge_attribute_internal(&reverse, attribute)?;
        }
        self.flush_state_changes();
        Ok(())
    }

    /// Reset every link to UNCLASSIFIED without notifying the algorithm
    pub fn unclassify_all_links(&mut self) -> Result<()> {
        let handles: Vec<LinkHandle> = self.topology.links().map(|(handle, _)| handle).collect();
        for link in handles {
            self.topology.set_link_state(link, LinkState::Unclassified)?;
        }
        self.flush_state_changes();
        Ok(())
    }

    /// Check the constraints that must hold between context events. Only
    /// performed in incremental mode; batch mode returns an empty report.
    pub fn check_constraints_after_context_event(&mut self) -> ConstraintViolationReport {
        if self.operation_mode != Some(OperationMode::Incremental) {
            debug!("Skipping constraint check after context event outside incremental mode");
            return ConstraintViolationReport::new();
        }

        let mut report = ConstraintViolationReport::new();
        for constraint in &self.algorithm_constraints {
            constraint.check_on_topology(&self.topology, &mut report);
        }
        if EdgeStateBasedConnectivityConstraint::physical().is_fulfilled(&self.topology) {
            EdgeStateBasedConnectivityConstraint::weak().check_on_topology(&self.topology, &mut report);
        }

        self.record_violations("context event", &report);
        report
    }

    /// Check the constraints that must hold after a topology control run
    pub fn check_constraints_after_topology_control_run(&mut self) -> ConstraintViolationReport {
        let mut report = ConstraintViolationReport::new();
        for constraint in &self.algorithm_constraints {
            constraint.check_on_topology(&self.topology, &mut report);
        }
        NoUnclassifiedLinksConstraint::new().check_on_topology(&self.topology, &mut report);
        if EdgeStateBasedConnectivityConstraint::physical().is_fulfilled(&self.topology) {
            EdgeStateBasedConnectivityConstraint::active_only().check_on_topology(&self.topology, &mut report);
        }

        self.record_violations("topology control run", &report);
        report
    }

    pub fn constraint_violation_count(&self) -> usize {
        self.constraint_violation_count
    }

    pub fn reset_constraint_violation_counter(&mut self) {
        self.constraint_violation_count = 0;
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn node_handle(&self, id: &NodeId) -> Option<NodeHandle> {
        self.node_handles.get(id).copied()
    }

    pub fn node_id_of(&self, handle: NodeHandle) -> Option<&NodeId> {
        self.node_ids.get(&handle)
    }

    pub fn link_handle(&self, id: &EdgeId) -> Option<LinkHandle> {
        self.link_handles.get(id).copied()
    }

    pub fn edge_id_of(&self, handle: LinkHandle) -> Option<&EdgeId> {
        self.edge_ids.get(&handle)
    }

    /// Current state of an edge
    pub fn edge_state(&self, id: &EdgeId) -> Result<LinkState> {
        let handle = self.resolve_edge(id)?;
        Ok(self.topology.try_link(handle)?.state())
    }

    pub fn add_context_event_listener(&mut self, listener: Box<dyn ContextEventListener>) {
        self.context_event_listeners.push(listener);
    }

    pub fn add_link_state_listener(&mut self, listener: Box<dyn LinkStateListener>) {
        self.link_state_listeners.push(listener);
    }

    pub fn set_context_event_listeners_muted(&mut self, muted: bool) {
        self.context_event_listeners_muted = muted;
    }

    pub fn set_link_state_listeners_muted(&mut self, muted: bool) {
        self.link_state_listeners_muted = muted;
    }

    fn require_algorithm(&self) -> Result<()> {
        if self.algorithm.is_none() {
            return Err(FacadeError::AlgorithmNotConfigured);
        }
        Ok(())
    }

    fn resolve_node(&self, id: &NodeId) -> Result<NodeHandle> {
        self.node_handle(id).ok_or_else(|| FacadeError::UnknownNode(id.clone()))
    }

    fn resolve_edge(&self, id: &EdgeId) -> Result<LinkHandle> {
        self.link_handle(id).ok_or_else(|| FacadeError::UnknownEdge(id.clone()))
    }

    fn add_edge_internal(&mut self, prototype: &EdgePrototype) -> Result<LinkHandle> {
        self.require_algorithm()?;
        if self.link_handles.contains_key(&prototype.id) {
            return Err(FacadeError::DuplicateEdge(prototype.id.clone()));
        }
        let source = self.resolve_node(&prototype.source)?;
        let target = self.resolve_node(&prototype.target)?;

        let power = prototype.required_transmission_power.unwrap_or(f64::NAN);
        let handle = self
            .topology
            .add_directed_link(prototype.id.as_str(), source, target, prototype.distance, power)?;
        self.link_handles.insert(prototype.id.clone(), handle);
        self.edge_ids.insert(handle, prototype.id.clone());
        debug!("Added edge {} ({} -> {})", prototype.id, prototype.source, prototype.target);

        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        algorithm.handle_link_addition(&mut self.topology, handle)?;
        self.notify_context_event(|l| l.edge_added(&prototype.id));
        Ok(handle)
    }

    fn remove_edge_internal(&mut self, id: &EdgeId) -> Result<()> {
        self.require_algorithm()?;
        let handle = self.resolve_edge(id)?;

        let removed = self.topology.remove_link(handle)?;
        self.link_handles.remove(id);
        self.edge_ids.remove(&handle);
        debug!("Removed edge {}", id);

        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        algorithm.handle_link_deletion(&mut self.topology, &removed)?;
        self.notify_context_event(|l| l.edge_removed(id));
        Ok(())
    }

    fn update_edge_attribute_internal(&mut self, id: &EdgeId, attribute: LinkAttribute) -> Result<()> {
        let algorithm = self.algorithm.as_deref_mut().ok_or(FacadeError::AlgorithmNotConfigured)?;
        let handle = *self.link_handles.get(id).ok_or_else(|| FacadeError::UnknownEdge(id.clone()))?;

        match attribute {
            LinkAttribute::Distance(distance) => {
                self.topology.set_link_distance(handle, distance)?;
            }
            LinkAttribute::RequiredTransmissionPower(power) => {
                self.topology.set_link_required_transmission_power(handle, power)?;
            }
            LinkAttribute::State(state) => {
                self.topology.set_link_state(handle, state)?;
            }
        }
        if algorithm.requires_updates_of(attribute.kind()) {
            algorithm.handle_link_attribute_modification(&mut self.topology, handle, attribute.kind())?;
        }

        self.notify_context_event(|l| l.edge_attribute_updated(id, &attribute));
        Ok(())
    }

    fn notify_context_event(&mut self, mut event: impl FnMut(&mut dyn ContextEventListener)) {
        if self.context_event_listeners_muted {
            return;
        }
        for listener in &mut self.context_event_listeners {
            event(listener.as_mut());
        }
    }

    /// Report the net state change of every link touched since the last
    /// flush to the link-state listeners
    fn flush_state_changes(&mut self) {
        let changes = self.topology.take_state_changes();
        if self.link_state_listeners_muted || self.link_state_listeners.is_empty() {
            return;
        }

        for change in coalesce_state_changes(changes) {
            let Some(edge) = self.edge_ids.get(&change.link) else {
                continue;
            };
            for listener in &mut self.link_state_listeners {
                listener.link_state_changed(edge, change.old, change.new);
            }
        }
    }

    fn record_violations(&mut self, checkpoint: &str, report: &ConstraintViolationReport) {
        self.constraint_violation_count += report.len();
        if report.is_empty() {
            debug!("No constraint violations after {}", checkpoint);
        } else {
            error!(
                "{} constraint violations after {}: {:?}\n{}",
                report.len(),
                checkpoint,
                report.histogram(),
                report.format_summary(&self.topology)
            );
        }
    }
}

/// Collapse consecutive changes of the same link into one change from its
/// first old state to its last new state, dropping links that ended where
/// they started. Keeps the order of first appearance.
fn coalesce_state_changes(changes: Vec<LinkStateChange>) -> Vec<LinkStateChange> {
    let mut positions: HashMap<LinkHandle, usize> = HashMap::new();
    let mut net: Vec<LinkStateChange> = Vec::new();
    for change in changes {
        match positions.get(&change.link) {
            Some(&index) => net[index].new = change.new,
            None => {
                positions.insert(change.link, net.len());
                net.push(change);
            }
        }
    }
    net.retain(|change| change.old != change.new);
    net
}
