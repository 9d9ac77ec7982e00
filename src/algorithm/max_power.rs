//! Maximum power topology control: every link stays ACTIVE.
//!
//! Serves as a baseline against which kTC results are compared.

use super::{
    ensure_detached, AlgorithmError, AlgorithmId, AlgorithmParameters, AttributeKind, OperationMode,
    TopologyControlAlgorithm,
};
use crate::constraints::TopologyConstraint;
use crate::model::{Link, LinkHandle, LinkState, NodeHandle, Topology};

const REQUIRED_ATTRIBUTES: &[AttributeKind] = &[AttributeKind::LinkState];

#[derive(Debug, Clone)]
pub struct MaxPowerTopologyControl {
    mode: OperationMode,
}

impl MaxPowerTopologyControl {
    pub fn new(mode: OperationMode) -> Self {
        Self { mode }
    }

    fn admit(&self, topology: &mut Topology, link: LinkHandle) -> Result<(), AlgorithmError> {
        let state = match self.mode {
            OperationMode::Incremental => LinkState::Active,
            OperationMode::Batch => LinkState::Unclassified,
        };
        topology.set_link_state(link, state)?;
        Ok(())
    }
}

impl TopologyControlAlgorithm for MaxPowerTopologyControl {
    fn id(&self) -> AlgorithmId {
        AlgorithmId::MaxPower
    }

    fn operation_mode(&self) -> OperationMode {
        self.mode
    }

    fn set_operation_mode(&mut self, mode: OperationMode) {
        self.mode = mode;
    }

    fn configure(&mut self, _parameters: &AlgorithmParameters) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn algorithm_specific_constraints(&self) -> Vec<Box<dyn TopologyConstraint>> {
        Vec::new()
    }

    fn required_attributes(&self) -> &'static [AttributeKind] {
        REQUIRED_ATTRIBUTES
    }

    fn run_on_topology(&mut self, topology: &mut Topology) -> Result<(), AlgorithmError> {
        let handles: Vec<LinkHandle> = topology.links().map(|(handle, _)| handle).collect();
        for link in handles {
            topology.set_link_state(link, LinkState::Active)?;
        }
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
        self.admit(topology, link)
    }

    fn handle_link_deletion(&mut self, _topology: &mut Topology, _removed: &Link) -> Result<(), AlgorithmError> {
        Ok(())
    }

    fn handle_node_attribute_modification(
        &mut self,
        topology: &mut Topology,
        node: NodeHandle,
        _kind: AttributeKind,
    ) -> Result<(), AlgorithmError> {
        topology.try_node(node)?;
        Ok(())
    }

    fn handle_link_attribute_modification(
        &mut self,
        topology: &mut Topology,
        link: LinkHandle,
        kind: AttributeKind,
    ) -> Result<(), AlgorithmError> {
        if kind == AttributeKind::LinkState {
            self.admit(topology, link)?;
        }
        Ok(())
    }
}
