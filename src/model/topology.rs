//! The topology aggregate.
//!
//! Owns every node and directed link of a simulated network. The topology
//! never cascades: removing a node requires all incident links to be gone,
//! and removing one direction of a link pair leaves the other in place.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use log::trace;

use super::arena::Arena;
use super::types::*;

/// Nodes and directed links of a wireless network
#[derive(Debug, Clone, Default)]
pub struct Topology {
    nodes: Arena<Node>,
    links: Arena<Link>,
    node_ids: HashMap<Arc<str>, NodeHandle>,
    link_ids: HashMap<Arc<str>, LinkHandle>,
    journal_enabled: bool,
    journal: Vec<LinkStateChange>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with the given remaining energy (`NaN` if unknown)
    pub fn add_node(&mut self, id: impl Into<String>, remaining_energy: f64) -> Result<NodeHandle, TopologyError> {
        let id = id.into();
        if self.node_ids.contains_key(id.as_str()) {
            return Err(TopologyError::DuplicateNodeId(id));
        }

        let id: Arc<str> = Arc::from(id);
        let (index, generation) = self.nodes.insert(Node {
            id: Arc::clone(&id),
            remaining_energy,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        });
        let handle = NodeHandle { index, generation };
        self.node_ids.insert(id, handle);
        Ok(handle)
    }

    /// Remove a node that has no incident links
    pub fn remove_node(&mut self, node: NodeHandle) -> Result<Node, TopologyError> {
        let existing = self.try_node(node)?;
        if existing.degree() > 0 {
            return Err(TopologyError::NodeHasIncidentLinks {
                node: existing.id.to_string(),
                count: existing.degree(),
            });
        }

        let removed = self
            .nodes
            .remove(node.index, node.generation)
            .ok_or_else(|| TopologyError::NodeNotFound(node.to_string()))?;
        self.node_ids.remove(&*removed.id);
        Ok(removed)
    }

    /// Add a single directed link in state UNCLASSIFIED
    pub fn add_directed_link(
        &mut self,
        id: impl Into<String>,
        source: NodeHandle,
        target: NodeHandle,
        distance: f64,
        required_transmission_power: f64,
    ) -> Result<LinkHandle, TopologyError> {
        let id = id.into();
        if self.link_ids.contains_key(id.as_str()) {
            return Err(TopologyError::DuplicateLinkId(id));
        }
        self.try_node(source)?;
        self.try_node(target)?;

        let id: Arc<str> = Arc::from(id);
        let (index, generation) = self.links.insert(Link {
            id: Arc::clone(&id),
            source,
            target,
            distance,
            required_transmission_power,
            state: LinkState::Unclassified,
            reverse: None,
        });
        let handle = LinkHandle { index, generation };
        self.link_ids.insert(id, handle);

        if let Some(node) = self.nodes.get_mut(source.index, source.generation) {
            node.outgoing.push(handle);
        }
        if let Some(node) = self.nodes.get_mut(target.index, target.generation) {
            node.incoming.push(handle);
        }
        Ok(handle)
    }

    /// Add both directions of an undirected link and pair them as mutual
    /// reverse links. Returns the forward link.
    pub fn add_undirected_link_pair(
        &mut self,
        forward_id: impl Into<String>,
        backward_id: impl Into<String>,
        source: NodeHandle,
        target: NodeHandle,
        distance: f64,
        required_transmission_power: f64,
    ) -> Result<LinkHandle, TopologyError> {
        let forward_id = forward_id.into();
        let backward_id = backward_id.into();
        if forward_id == backward_id || self.link_ids.contains_key(backward_id.as_str()) {
            return Err(TopologyError::DuplicateLinkId(backward_id));
        }

        let forward = self.add_directed_link(forward_id, source, target, distance, required_transmission_power)?;
        let backward = self.add_directed_link(backward_id, target, source, distance, required_transmission_power)?;
        self.connect_reverse_links(forward, backward)?;
        Ok(forward)
    }

    /// Pair two existing links of opposite direction as mutual reverse links
    pub fn connect_reverse_links(&mut self, forward: LinkHandle, backward: LinkHandle) -> Result<(), TopologyError> {
        let fwd = self.try_link(forward)?;
        let bwd = self.try_link(backward)?;

        let mismatch = |reason: &str| TopologyError::ReverseLinkMismatch {
            forward: fwd.id.to_string(),
            backward: bwd.id.to_string(),
            reason: reason.to_string(),
        };

        if forward == backward {
            return Err(mismatch("a link cannot be its own reverse"));
        }
        if fwd.source != bwd.target || fwd.target != bwd.source {
            return Err(mismatch("endpoints are not opposite"));
        }
        if fwd.reverse.is_some_and(|r| r != backward) || bwd.reverse.is_some_and(|r| r != forward) {
            return Err(mismatch("one of the links is already paired"));
        }

        if let Some(link) = self.links.get_mut(forward.index, forward.generation) {
            link.reverse = Some(backward);
        }
        if let Some(link) = self.links.get_mut(backward.index, backward.generation) {
            link.reverse = Some(forward);
        }
        Ok(())
    }

    /// Remove exactly one directed link.
    ///
    /// If the link is paired, the partner's reverse reference is cleared; the
    /// partner itself stays in the topology.
    pub fn remove_link(&mut self, link: LinkHandle) -> Result<Link, TopologyError> {
        let removed = self
            .links
            .remove(link.index, link.generation)
            .ok_or_else(|| TopologyError::LinkNotFound(link.to_string()))?;
        self.link_ids.remove(&*removed.id);

        if let Some(node) = self.nodes.get_mut(removed.source.index, removed.source.generation) {
            node.outgoing.retain(|l| *l != link);
        }
        if let Some(node) = self.nodes.get_mut(removed.target.index, removed.target.generation) {
            node.incoming.retain(|l| *l != link);
        }
        if let Some(reverse) = removed.reverse {
            if let Some(partner) = self.links.get_mut(reverse.index, reverse.generation) {
                partner.reverse = None;
            }
        }
        Ok(removed)
    }

    pub fn set_link_distance(&mut self, link: LinkHandle, distance: f64) -> Result<f64, TopologyError> {
        let entry = self.try_link_mut(link)?;
        Ok(std::mem::replace(&mut entry.distance, distance))
    }

    pub fn set_link_required_transmission_power(&mut self, link: LinkHandle, power: f64) -> Result<f64, TopologyError> {
        let entry = self.try_link_mut(link)?;
        Ok(std::mem::replace(&mut entry.required_transmission_power, power))
    }

    /// Set the state of a link, returning the previous state.
    ///
    /// Effective changes are appended to the state journal when it is enabled.
    pub fn set_link_state(&mut self, link: LinkHandle, state: LinkState) -> Result<LinkState, TopologyError> {
        let entry = self.try_link_mut(link)?;
        let old = std::mem::replace(&mut entry.state, state);
        if old != state {
            trace!("Link {} changed {} -> {}", entry.id, old, state);
            if self.journal_enabled {
                self.journal.push(LinkStateChange { link, old, new: state });
            }
        }
        Ok(old)
    }

    pub fn set_remaining_energy(&mut self, node: NodeHandle, remaining_energy: f64) -> Result<f64, TopologyError> {
        let entry = self
            .nodes
            .get_mut(node.index, node.generation)
            .ok_or_else(|| TopologyError::NodeNotFound(node.to_string()))?;
        Ok(std::mem::replace(&mut entry.remaining_energy, remaining_energy))
    }

    /// Start or stop recording link state changes
    pub fn set_state_journal_enabled(&mut self, enabled: bool) {
        self.journal_enabled = enabled;
        if !enabled {
            self.journal.clear();
        }
    }

    /// Drain the recorded link state changes
    pub fn take_state_changes(&mut self) -> Vec<LinkStateChange> {
        std::mem::take(&mut self.journal)
    }

    pub fn node(&self, node: NodeHandle) -> Option<&Node> {
        self.nodes.get(node.index, node.generation)
    }

    pub fn link(&self, link: LinkHandle) -> Option<&Link> {
        self.links.get(link.index, link.generation)
    }

    pub fn try_node(&self, node: NodeHandle) -> Result<&Node, TopologyError> {
        self.node(node).ok_or_else(|| TopologyError::NodeNotFound(node.to_string()))
    }

    pub fn try_link(&self, link: LinkHandle) -> Result<&Link, TopologyError> {
        self.link(link).ok_or_else(|| TopologyError::LinkNotFound(link.to_string()))
    }

    fn try_link_mut(&mut self, link: LinkHandle) -> Result<&mut Link, TopologyError> {
        self.links
            .get_mut(link.index, link.generation)
            .ok_or_else(|| TopologyError::LinkNotFound(link.to_string()))
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeHandle> {
        self.node_ids.get(id).copied()
    }

    pub fn link_by_id(&self, id: &str) -> Option<LinkHandle> {
        self.link_ids.get(id).copied()
    }

    /// The ID of a node, or an empty string for stale handles
    pub fn node_id(&self, node: NodeHandle) -> &str {
        self.node(node).map(Node::id).unwrap_or("")
    }

    /// Iterate all nodes in arena order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes
            .iter()
            .map(|(index, generation, node)| (NodeHandle { index, generation }, node))
    }

    /// Iterate all links in arena order
    pub fn links(&self) -> impl Iterator<Item = (LinkHandle, &Link)> {
        self.links
            .iter()
            .map(|(index, generation, link)| (LinkHandle { index, generation }, link))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn outgoing_links(&self, node: NodeHandle) -> Result<&[LinkHandle], TopologyError> {
        Ok(self.try_node(node)?.outgoing())
    }

    pub fn incoming_links(&self, node: NodeHandle) -> Result<&[LinkHandle], TopologyError> {
        Ok(self.try_node(node)?.incoming())
    }

    /// Outgoing links of a node, ascending in link order (distance first)
    pub fn outgoing_links_by_distance(&self, node: NodeHandle) -> Result<Vec<LinkHandle>, TopologyError> {
        let mut ordered = self.outgoing_links(node)?.to_vec();
        ordered.sort_by(|&a, &b| self.compare_links(a, b));
        Ok(ordered)
    }

    /// All links in ascending link order
    pub fn links_by_distance(&self) -> Vec<LinkHandle> {
        let mut ordered: Vec<LinkHandle> = self.links().map(|(handle, _)| handle).collect();
        ordered.sort_by(|&a, &b| self.compare_links(a, b));
        ordered
    }

    /// Position of a link in the longest-link order
    pub fn link_order(&self, link: LinkHandle) -> Option<LinkOrder> {
        self.link(link).map(|entry| self.order_of(entry))
    }

    /// Position of a link value in the longest-link order. Also works for a
    /// link that was just removed, as long as its endpoints still exist.
    pub fn order_of(&self, link: &Link) -> LinkOrder {
        let (low, high) = self.ordered_endpoints(link);
        LinkOrder {
            distance: link.distance,
            low_endpoint: low.map(|n| Arc::clone(&n.id)).unwrap_or_else(|| Arc::from("")),
            high_endpoint: high.map(|n| Arc::clone(&n.id)).unwrap_or_else(|| Arc::from("")),
            link_id: Arc::clone(&link.id),
        }
    }

    /// Compare two link values in longest-link order without building
    /// [`LinkOrder`]s
    pub fn compare_link_values(&self, a: &Link, b: &Link) -> Ordering {
        compare_distance_keys(self.distance_key(a), self.distance_key(b))
    }

    /// Compare two links in longest-link order. Stale handles sort last.
    pub fn compare_links(&self, a: LinkHandle, b: LinkHandle) -> Ordering {
        match (self.link(a), self.link(b)) {
            (Some(a), Some(b)) => self.compare_link_values(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    fn ordered_endpoints(&self, link: &Link) -> (Option<&Node>, Option<&Node>) {
        let source = self.node(link.source);
        let target = self.node(link.target);
        let source_id = source.map(Node::id).unwrap_or("");
        let target_id = target.map(Node::id).unwrap_or("");
        if source_id <= target_id {
            (source, target)
        } else {
            (target, source)
        }
    }

    fn distance_key<'a>(&'a self, link: &'a Link) -> (f64, &'a str, &'a str, &'a str) {
        let (low, high) = self.ordered_endpoints(link);
        (
            link.distance,
            low.map(Node::id).unwrap_or(""),
            high.map(Node::id).unwrap_or(""),
            &*link.id,
        )
    }

    /// Estimated remaining lifetime of a link: the remaining energy of its
    /// source divided by the power required to transmit over it. `NaN` when
    /// either value is unknown or the source is gone.
    pub fn estimated_lifetime(&self, link: &Link) -> f64 {
        match self.node(link.source) {
            Some(source) => source.remaining_energy / link.required_transmission_power,
            None => f64::NAN,
        }
    }

    /// Position of a link in the weakest-link order of energy-aware kTC
    pub fn lifetime_order_of(&self, link: &Link) -> LifetimeOrder {
        LifetimeOrder {
            lifetime: self.estimated_lifetime(link),
            link_id: Arc::clone(&link.id),
        }
    }

    /// Compare two link values by estimated lifetime, weakest greatest
    pub fn compare_lifetimes(&self, a: &Link, b: &Link) -> Ordering {
        compare_lifetime_keys((self.estimated_lifetime(a), &*a.id), (self.estimated_lifetime(b), &*b.id))
    }

    /// Links leaving `source` and arriving at `target`
    pub fn links_between(&self, source: NodeHandle, target: NodeHandle) -> Vec<LinkHandle> {
        self.node(source)
            .map(|node| {
                node.outgoing
                    .iter()
                    .copied()
                    .filter(|&l| self.link(l).is_some_and(|link| link.target == target))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_unclassified_links(&self) -> bool {
        self.links().any(|(_, link)| link.state == LinkState::Unclassified)
    }

    /// Number of links per state
    pub fn state_counts(&self) -> HashMap<LinkState, usize> {
        let mut counts: HashMap<LinkState, usize> = LinkState::ALL.iter().map(|s| (*s, 0)).collect();
        for (_, link) in self.links() {
            *counts.entry(link.state).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Topology, NodeHandle, NodeHandle, NodeHandle) {
        let mut topology = Topology::new();
        let a = topology.add_node("A", f64::NAN).unwrap();
        let b = topology.add_node("B", 10.0).unwrap();
        let c = topology.add_node("C", 10.0).unwrap();
        topology.add_undirected_link_pair("eAB", "eBA", a, b, 1.0, 2.0).unwrap();
        topology.add_undirected_link_pair("eBC", "eCB", b, c, 1.0, 2.0).unwrap();
        topology.add_undirected_link_pair("eAC", "eCA", a, c, 1.9, 3.0).unwrap();
        (topology, a, b, c)
    }

    #[test]
    fn test_undirected_pair_establishes_reverse_invariant() {
        let (topology, _, _, _) = triangle();
        for (handle, link) in topology.links() {
            let reverse = link.reverse().expect("paired link");
            let partner = topology.link(reverse).unwrap();
            assert_eq!(partner.reverse(), Some(handle));
            assert_eq!(partner.source(), link.target());
            assert_eq!(partner.target(), link.source());
        }
        assert_eq!(topology.link_count(), 6);
    }

    #[test]
    fn test_new_links_are_unclassified() {
        let (topology, _, _, _) = triangle();
        assert!(topology.links().all(|(_, l)| l.state() == LinkState::Unclassified));
        assert!(topology.contains_unclassified_links());
    }

    #[test]
    fn test_remove_link_clears_partner_reverse() {
        let (mut topology, _, _, _) = triangle();
        let forward = topology.link_by_id("eAB").unwrap();
        let backward = topology.link_by_id("eBA").unwrap();

        let removed = topology.remove_link(forward).unwrap();
        assert_eq!(removed.id(), "eAB");
        assert!(topology.link(forward).is_none());
        assert_eq!(topology.link(backward).unwrap().reverse(), None);
        assert_eq!(topology.link_count(), 5);
        assert!(topology.link_by_id("eAB").is_none());
    }

    #[test]
    fn test_stale_link_handle_is_an_error() {
        let (mut topology, a, b, _) = triangle();
        let forward = topology.link_by_id("eAB").unwrap();
        topology.remove_link(forward).unwrap();
        topology.add_directed_link("eAB2", a, b, 1.0, 1.0).unwrap();

        assert!(matches!(topology.try_link(forward), Err(TopologyError::LinkNotFound(_))));
        assert!(topology.set_link_state(forward, LinkState::Active).is_err());
    }

    #[test]
    fn test_remove_node_requires_detached_links() {
        let (mut topology, a, _, _) = triangle();
        let err = topology.remove_node(a).unwrap_err();
        assert_eq!(err, TopologyError::NodeHasIncidentLinks { node: "A".to_string(), count: 4 });

        for link in ["eAB", "eBA", "eAC", "eCA"] {
            let handle = topology.link_by_id(link).unwrap();
            topology.remove_link(handle).unwrap();
        }
        topology.remove_node(a).unwrap();
        assert_eq!(topology.node_count(), 2);
        assert!(topology.node_by_id("A").is_none());
        assert!(matches!(topology.remove_node(a), Err(TopologyError::NodeNotFound(_))));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let (mut topology, a, b, _) = triangle();
        assert_eq!(topology.add_node("A", 1.0), Err(TopologyError::DuplicateNodeId("A".to_string())));
        assert_eq!(
            topology.add_directed_link("eAB", a, b, 1.0, 1.0),
            Err(TopologyError::DuplicateLinkId("eAB".to_string()))
        );
        assert_eq!(
            topology.add_undirected_link_pair("x", "eBA", a, b, 1.0, 1.0),
            Err(TopologyError::DuplicateLinkId("eBA".to_string()))
        );
        assert!(topology.link_by_id("x").is_none());
    }

    #[test]
    fn test_link_to_missing_node_is_rejected() {
        let (mut topology, a, _, _) = triangle();
        let ghost = topology.add_node("ghost", 1.0).unwrap();
        topology.remove_node(ghost).unwrap();
        assert!(matches!(
            topology.add_directed_link("e", a, ghost, 1.0, 1.0),
            Err(TopologyError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_connect_reverse_links_validates_endpoints() {
        let mut topology = Topology::new();
        let a = topology.add_node("A", 1.0).unwrap();
        let b = topology.add_node("B", 1.0).unwrap();
        let c = topology.add_node("C", 1.0).unwrap();
        let ab = topology.add_directed_link("ab", a, b, 1.0, 1.0).unwrap();
        let ba = topology.add_directed_link("ba", b, a, 1.0, 1.0).unwrap();
        let ca = topology.add_directed_link("ca", c, a, 1.0, 1.0).unwrap();

        assert!(matches!(
            topology.connect_reverse_links(ab, ca),
            Err(TopologyError::ReverseLinkMismatch { .. })
        ));
        topology.connect_reverse_links(ab, ba).unwrap();
        assert_eq!(topology.link(ab).unwrap().reverse(), Some(ba));
        assert_eq!(topology.link(ba).unwrap().reverse(), Some(ab));
    }

    #[test]
    fn test_outgoing_links_by_distance() {
        let (topology, a, _, _) = triangle();
        let ordered: Vec<&str> = topology
            .outgoing_links_by_distance(a)
            .unwrap()
            .into_iter()
            .map(|l| topology.link(l).unwrap().id())
            .collect();
        assert_eq!(ordered, vec!["eAB", "eAC"]);
    }

    #[test]
    fn test_borrowed_comparison_matches_link_order() {
        let (topology, _, _, _) = triangle();
        let handles: Vec<LinkHandle> = topology.links().map(|(h, _)| h).collect();
        for &a in &handles {
            for &b in &handles {
                let expected = topology.link_order(a).unwrap().cmp(&topology.link_order(b).unwrap());
                assert_eq!(topology.compare_links(a, b), expected);
            }
        }
        let by_distance: Vec<&str> =
            topology.links_by_distance().into_iter().map(|l| topology.link(l).unwrap().id()).collect();
        assert_eq!(by_distance, vec!["eAB", "eBA", "eBC", "eCB", "eAC", "eCA"]);
    }

    #[test]
    fn test_estimated_lifetime() {
        let (topology, _, _, _) = triangle();
        let link = |id: &str| topology.link(topology.link_by_id(id).unwrap()).unwrap();

        assert_eq!(topology.estimated_lifetime(link("eBA")), 5.0);
        assert_eq!(topology.estimated_lifetime(link("eCA")), 10.0 / 3.0);
        // A has unknown energy
        assert!(topology.estimated_lifetime(link("eAB")).is_nan());
        assert_eq!(
            topology.compare_lifetimes(link("eCA"), link("eBA")),
            topology.lifetime_order_of(link("eCA")).cmp(&topology.lifetime_order_of(link("eBA")))
        );
        assert_eq!(topology.compare_lifetimes(link("eCA"), link("eBA")), Ordering::Greater);
    }

    #[test]
    fn test_state_journal_records_effective_changes_only() {
        let (mut topology, _, _, _) = triangle();
        let link = topology.link_by_id("eAB").unwrap();

        topology.set_link_state(link, LinkState::Active).unwrap();
        assert!(topology.take_state_changes().is_empty());

        topology.set_state_journal_enabled(true);
        topology.set_link_state(link, LinkState::Active).unwrap();
        topology.set_link_state(link, LinkState::Inactive).unwrap();
        let changes = topology.take_state_changes();
        assert_eq!(
            changes,
            vec![LinkStateChange { link, old: LinkState::Active, new: LinkState::Inactive }]
        );
    }

    #[test]
    fn test_setters_return_previous_values() {
        let (mut topology, a, _, _) = triangle();
        let link = topology.link_by_id("eAC").unwrap();
        assert_eq!(topology.set_link_distance(link, 5.0).unwrap(), 1.9);
        assert_eq!(topology.set_link_required_transmission_power(link, 7.0).unwrap(), 3.0);
        assert!(topology.set_remaining_energy(a, 4.0).unwrap().is_nan());
        assert_eq!(topology.node(a).unwrap().remaining_energy(), 4.0);
        // the reverse direction is not touched
        let reverse = topology.link_by_id("eCA").unwrap();
        assert_eq!(topology.link(reverse).unwrap().distance(), 1.9);
    }
}
