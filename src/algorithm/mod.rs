//! Topology control algorithms.
//!
//! An algorithm classifies the links of a [`Topology`] as ACTIVE or
//! INACTIVE. Every algorithm offers a batch pass over the whole topology and
//! six handlers that keep the classification up to date while the topology
//! is mutated from outside. Handlers receive the topology mutably and write
//! link states through the model directly; they are never notified about
//! their own writes.

pub mod ktc;
pub mod max_power;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constraints::TopologyConstraint;
use crate::model::{Link, LinkHandle, NodeHandle, Topology, TopologyError};

pub use ktc::{IncrementalDistanceKtc, IncrementalEnergyKtc, IncrementalKtc, KtcVariant};
pub use max_power::MaxPowerTopologyControl;

/// Name of the stretch factor parameter of kTC
pub const KTC_PARAMETER_K: &str = "k";

/// Identifier of a topology control algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgorithmId {
    /// Distance-based kTC
    #[serde(rename = "D_KTC")]
    DistanceKtc,
    /// kTC over estimated link lifetimes
    #[serde(rename = "E_KTC")]
    EnergyKtc,
    /// Null algorithm that keeps every link active
    #[serde(rename = "MAXPOWER_TC")]
    MaxPower,
}

impl AlgorithmId {
    pub fn name(&self) -> &'static str {
        match self {
            AlgorithmId::DistanceKtc => "D_KTC",
            AlgorithmId::EnergyKtc => "E_KTC",
            AlgorithmId::MaxPower => "MAXPOWER_TC",
        }
    }

    /// Names of the parameters `run` expects for this algorithm
    pub fn expected_parameters(&self) -> &'static [&'static str] {
        match self {
            AlgorithmId::DistanceKtc | AlgorithmId::EnergyKtc => &[KTC_PARAMETER_K],
            AlgorithmId::MaxPower => &[],
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AlgorithmId {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D_KTC" => Ok(AlgorithmId::DistanceKtc),
            "E_KTC" => Ok(AlgorithmId::EnergyKtc),
            "MAXPOWER_TC" => Ok(AlgorithmId::MaxPower),
            other => Err(AlgorithmError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// How handlers react to context events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// Handlers unclassify affected links; the next run reclassifies them
    Batch,
    /// Handlers repair the classification immediately
    Incremental,
}

/// Attributes of nodes and links an algorithm may depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    RemainingEnergy,
    Distance,
    RequiredTransmissionPower,
    LinkState,
}

/// Named numeric parameters passed to a topology control run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlgorithmParameters {
    values: BTreeMap<String, f64>,
}

impl AlgorithmParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters consisting of the kTC stretch factor only
    pub fn with_k(k: f64) -> Self {
        let mut parameters = Self::new();
        parameters.set(KTC_PARAMETER_K, k);
        parameters
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Get a parameter that must be present
    pub fn require(&self, name: &'static str) -> Result<f64, AlgorithmError> {
        self.get(name).ok_or(AlgorithmError::MissingParameter(name))
    }
}

/// Errors raised by topology control algorithms
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid stretch factor k = {0}: must be finite and at least 1")]
    InvalidK(f64),

    #[error("Missing algorithm parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unknown topology control algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// A topology control algorithm with batch and incremental entry points
pub trait TopologyControlAlgorithm: fmt::Debug {
    fn id(&self) -> AlgorithmId;

    fn operation_mode(&self) -> OperationMode;

    fn set_operation_mode(&mut self, mode: OperationMode);

    /// Apply run parameters (for kTC, the stretch factor `k`)
    fn configure(&mut self, parameters: &AlgorithmParameters) -> Result<(), AlgorithmError>;

    /// Constraints that hold for every correct classification of this
    /// algorithm
    fn algorithm_specific_constraints(&self) -> Vec<Box<dyn TopologyConstraint>>;

    /// Attributes whose modification the algorithm must be told about
    fn required_attributes(&self) -> &'static [AttributeKind];

    fn requires_updates_of(&self, kind: AttributeKind) -> bool {
        self.required_attributes().contains(&kind)
    }

    /// Classify every link from scratch
    fn run_on_topology(&mut self, topology: &mut Topology) -> Result<(), AlgorithmError>;

    /// Called after `node` was added
    fn handle_node_addition(&mut self, topology: &mut Topology, node: NodeHandle) -> Result<(), AlgorithmError>;

    /// Called before `node` is removed; all incident links must already be
    /// gone
    fn handle_node_deletion(&mut self, topology: &mut Topology, node: NodeHandle) -> Result<(), AlgorithmError>;

    /// Called after `link` was added
    fn handle_link_addition(&mut self, topology: &mut Topology, link: LinkHandle) -> Result<(), AlgorithmError>;

    /// Called after `removed` was taken out of the topology
    fn handle_link_deletion(&mut self, topology: &mut Topology, removed: &Link) -> Result<(), AlgorithmError>;

    /// Called after an attribute of `node` changed
    fn handle_node_attribute_modification(
        &mut self,
        topology: &mut Topology,
        node: NodeHandle,
        kind: AttributeKind,
    ) -> Result<(), AlgorithmError>;

    /// Called after an attribute of `link` changed
    fn handle_link_attribute_modification(
        &mut self,
        topology: &mut Topology,
        link: LinkHandle,
        kind: AttributeKind,
    ) -> Result<(), AlgorithmError>;
}

/// Create the algorithm for an ID
pub fn create_algorithm(id: AlgorithmId, mode: OperationMode) -> Box<dyn TopologyControlAlgorithm> {
    match id {
        AlgorithmId::DistanceKtc => Box::new(IncrementalDistanceKtc::new(mode)),
        AlgorithmId::EnergyKtc => Box::new(IncrementalEnergyKtc::new(mode)),
        AlgorithmId::MaxPower => Box::new(MaxPowerTopologyControl::new(mode)),
    }
}

/// Fail unless the node exists and has no incident links
pub(crate) fn ensure_detached(topology: &Topology, node: NodeHandle) -> Result<(), AlgorithmError> {
    let entry = topology.try_node(node)?;
    if entry.degree() > 0 {
        return Err(TopologyError::NodeHasIncidentLinks {
            node: entry.id().to_string(),
            count: entry.degree(),
        }
        .into());
    }
    Ok(())
}
