//! Scenario execution.
//!
//! Drives a [`TopologyControlFacade`] through a scenario: load the graph,
//! run topology control, then replay the context events, checking the
//! constraints at every checkpoint.

use color_eyre::eyre::{Result, WrapErr};
use log::info;
use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmId, AlgorithmParameters, OperationMode};
use crate::config::{Config, ScenarioEvent};
use crate::facade::{
    EdgeId, EdgePrototype, LinkAttribute, NodeAttribute, NodeId, NodePrototype, TopologyControlFacade,
};
use crate::graph_t::GraphT;
use crate::model::LinkState;

/// Outcome of a scenario, written as JSON by the CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    pub algorithm: AlgorithmId,
    pub operation_mode: OperationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    pub nodes: usize,
    pub links: usize,
    pub active_links: usize,
    pub inactive_links: usize,
    pub unclassified_links: usize,
    pub topology_control_runs: usize,
    pub events_applied: usize,
    pub constraint_violations: usize,
}

pub struct ScenarioRunner {
    facade: TopologyControlFacade,
    algorithm: AlgorithmId,
    operation_mode: OperationMode,
    k: Option<f64>,
    topology_control_runs: usize,
    events_applied: usize,
}

impl ScenarioRunner {
    /// Create a facade configured for the scenario's algorithm
    pub fn new(config: &Config) -> Result<Self> {
        let mut facade = TopologyControlFacade::new();
        facade.set_operation_mode(config.algorithm.operation_mode);
        facade.configure_algorithm(config.algorithm.id)?;

        Ok(Self {
            facade,
            algorithm: config.algorithm.id,
            operation_mode: config.algorithm.operation_mode,
            k: config.algorithm.k,
            topology_control_runs: 0,
            events_applied: 0,
        })
    }

    pub fn facade(&self) -> &TopologyControlFacade {
        &self.facade
    }

    pub fn load_graph(&mut self, graph: &GraphT) -> Result<()> {
        graph.load_into_facade(&mut self.facade)
    }

    /// Run topology control, replacing the stretch factor if one is given,
    /// and check the post-run constraints
    pub fn run_topology_control(&mut self, k: Option<f64>) -> Result<()> {
        if k.is_some() {
            self.k = k;
        }
        let parameters = match self.k {
            Some(k) => AlgorithmParameters::with_k(k),
            None => AlgorithmParameters::new(),
        };

        self.facade
            .run(&parameters)
            .wrap_err_with(|| format!("Topology control run of {} failed", self.algorithm))?;
        self.topology_control_runs += 1;
        self.facade.check_constraints_after_topology_control_run();
        Ok(())
    }

    /// Apply one scenario event
    pub fn apply_event(&mut self, event: &ScenarioEvent) -> Result<()> {
        match event {
            ScenarioEvent::Run { k } => return self.run_topology_control(*k),
            ScenarioEvent::AddNode { id, remaining_energy } => {
                let mut prototype = NodePrototype::new(id.as_str());
                prototype.remaining_energy = *remaining_energy;
                self.facade.add_node(prototype)?;
            }
            ScenarioEvent::AddLink { forward, backward, source, target, distance, required_transmission_power } => {
                let mut prototype = EdgePrototype::new(forward.as_str(), source.as_str(), target.as_str(), *distance);
                prototype.required_transmission_power = *required_transmission_power;
                self.facade.add_symmetric_edge(prototype, backward.as_str())?;
            }
            ScenarioEvent::RemoveLink { link } => {
                self.facade.remove_edge_symmetric(&EdgeId::from(link.as_str()))?;
            }
            ScenarioEvent::RemoveNode { node } => {
                self.facade.remove_node(&NodeId::from(node.as_str()))?;
            }
            ScenarioEvent::SetDistance { link, distance } => {
                self.facade
                    .update_edge_attribute_symmetric(&EdgeId::from(link.as_str()), LinkAttribute::Distance(*distance))?;
            }
            ScenarioEvent::SetEnergy { node, remaining_energy } => {
                self.facade.update_node_attribute(
                    &NodeId::from(node.as_str()),
                    NodeAttribute::RemainingEnergy(*remaining_energy),
                )?;
            }
        }

        self.events_applied += 1;
        self.facade.check_constraints_after_context_event();
        Ok(())
    }

    pub fn summary(&self) -> RunSummary {
        let topology = self.facade.topology();
        let counts = topology.state_counts();
        let count = |state: LinkState| counts.get(&state).copied().unwrap_or(0);
        RunSummary {
            algorithm: self.algorithm,
            operation_mode: self.operation_mode,
            k: self.k,
            nodes: topology.node_count(),
            links: topology.link_count(),
            active_links: count(LinkState::Active),
            inactive_links: count(LinkState::Inactive),
            unclassified_links: count(LinkState::Unclassified),
            topology_control_runs: self.topology_control_runs,
            events_applied: self.events_applied,
            constraint_violations: self.facade.constraint_violation_count(),
        }
    }
}

/// Load the graph, run topology control and replay every event of a scenario
pub fn run_scenario(config: &Config, graph: &GraphT) -> Result<(RunSummary, ScenarioRunner)> {
    let mut runner = ScenarioRunner::new(config)?;
    runner.load_graph(graph)?;
    runner.run_topology_control(None)?;

    for (index, event) in config.events.iter().enumerate() {
        runner
            .apply_event(event)
            .wrap_err_with(|| format!("Failed to apply event {}: {:?}", index, event))?;
    }

    let summary = runner.summary();
    info!(
        "Scenario finished: {} active, {} inactive, {} unclassified links, {} constraint violations",
        summary.active_links, summary.inactive_links, summary.unclassified_links, summary.constraint_violations
    );
    Ok((summary, runner))
}
