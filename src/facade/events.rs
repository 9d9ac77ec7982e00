//! External identities and mutation payloads accepted by the facade.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithm::AttributeKind;
use crate::model::LinkState;

/// External identity of a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

/// External identity of a directed edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);

/// Description of a node to add
#[derive(Debug, Clone, PartialEq)]
pub struct NodePrototype {
    pub id: NodeId,
    /// `None` is stored as `NaN`
    pub remaining_energy: Option<f64>,
}

impl NodePrototype {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self { id: id.into(), remaining_energy: None }
    }

    pub fn with_remaining_energy(mut self, remaining_energy: f64) -> Self {
        self.remaining_energy = Some(remaining_energy);
        self
    }
}

/// Description of a directed edge to add
#[derive(Debug, Clone, PartialEq)]
pub struct EdgePrototype {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub distance: f64,
    /// `None` is stored as `NaN`
    pub required_transmission_power: Option<f64>,
}

impl EdgePrototype {
    pub fn new(id: impl Into<EdgeId>, source: impl Into<NodeId>, target: impl Into<NodeId>, distance: f64) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            distance,
            required_transmission_power: None,
        }
    }

    pub fn with_required_transmission_power(mut self, power: f64) -> Self {
        self.required_transmission_power = Some(power);
        self
    }

    /// The opposite direction of this edge under a new ID
    pub fn reversed(&self, id: impl Into<EdgeId>) -> Self {
        Self {
            id: id.into(),
            source: self.target.clone(),
            target: self.source.clone(),
            distance: self.distance,
            required_transmission_power: self.required_transmission_power,
        }
    }
}

/// New value of a node attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeAttribute {
    RemainingEnergy(f64),
}

impl NodeAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            NodeAttribute::RemainingEnergy(_) => AttributeKind::RemainingEnergy,
        }
    }
}

/// New value of a link attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkAttribute {
    Distance(f64),
    RequiredTransmissionPower(f64),
    State(LinkState),
}

impl LinkAttribute {
    pub fn kind(&self) -> AttributeKind {
        match self {
            LinkAttribute::Distance(_) => AttributeKind::Distance,
            LinkAttribute::RequiredTransmissionPower(_) => AttributeKind::RequiredTransmissionPower,
            LinkAttribute::State(_) => AttributeKind::LinkState,
        }
    }
}
