//! Observers of facade activity.
//!
//! Context-event listeners see each external mutation exactly once, after
//! the topology and the algorithm have processed it. Link-state listeners
//! receive the net state changes of one facade operation, including the
//! changes made by the algorithm.

use super::events::{EdgeId, LinkAttribute, NodeAttribute, NodeId};
use crate::model::LinkState;

pub trait ContextEventListener {
    fn node_added(&mut self, _node: &NodeId) {}

    fn node_removed(&mut self, _node: &NodeId) {}

    fn edge_added(&mut self, _edge: &EdgeId) {}

    fn edge_removed(&mut self, _edge: &EdgeId) {}

    fn node_attribute_updated(&mut self, _node: &NodeId, _attribute: &NodeAttribute) {}

    fn edge_attribute_updated(&mut self, _edge: &EdgeId, _attribute: &LinkAttribute) {}
}

pub trait LinkStateListener {
    fn link_state_changed(&mut self, edge: &EdgeId, old: LinkState, new: LinkState);
}
