//! Reader for graphT topology files.
//!
//! ```text
//! # comment
//! 3 3
//! n1 20.0
//! n2 20.0
//! n3
//! e12 e21 n1 n2 100.0 5.0
//! e13 e31 n1 n3 120.0
//! e23 e32 n2 n3 150.0 5.0
//! ```
//!
//! The header holds the node count and the link count. Node lines carry an
//! ID and an optional remaining energy; link lines describe one undirected
//! link as forward ID, backward ID, source, target, distance and an optional
//! required transmission power. Missing values are read as `NaN`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use log::{debug, info};

use crate::facade::{EdgePrototype, NodePrototype, TopologyControlFacade};
use crate::model::Topology;

#[derive(Debug, Clone, PartialEq)]
pub struct GraphTNode {
    pub id: String,
    pub remaining_energy: Option<f64>,
}

/// One undirected link, stored as its two directed halves
#[derive(Debug, Clone, PartialEq)]
pub struct GraphTLink {
    pub forward_id: String,
    pub backward_id: String,
    pub source: String,
    pub target: String,
    pub distance: f64,
    pub required_transmission_power: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphT {
    pub nodes: Vec<GraphTNode>,
    pub links: Vec<GraphTLink>,
}

impl GraphT {
    /// Check for duplicate IDs and links between unknown nodes
    pub fn validate(&self) -> Result<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                bail!("Duplicate node ID: {}", node.id);
            }
        }

        let mut link_ids = HashSet::new();
        for link in &self.links {
            for id in [&link.forward_id, &link.backward_id] {
                if !link_ids.insert(id.as_str()) {
                    bail!("Duplicate link ID: {}", id);
                }
            }
            for endpoint in [&link.source, &link.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    bail!("Link {} references unknown node: {}", link.forward_id, endpoint);
                }
            }
        }
        Ok(())
    }

    /// Replay the graph as context events on a facade
    pub fn load_into_facade(&self, facade: &mut TopologyControlFacade) -> Result<()> {
        for node in &self.nodes {
            let mut prototype = NodePrototype::new(node.id.as_str());
            prototype.remaining_energy = node.remaining_energy;
            facade
                .add_node(prototype)
                .wrap_err_with(|| format!("Failed to add node {}", node.id))?;
        }

        for link in &self.links {
            let mut prototype =
                EdgePrototype::new(link.forward_id.as_str(), link.source.as_str(), link.target.as_str(), link.distance);
            prototype.required_transmission_power = link.required_transmission_power;
            facade
                .add_symmetric_edge(prototype, link.backward_id.as_str())
                .wrap_err_with(|| format!("Failed to add link {}", link.forward_id))?;
        }

        info!("Loaded {} nodes and {} links into the facade", self.nodes.len(), self.links.len() * 2);
        Ok(())
    }

    /// Build the graph directly in a topology
    pub fn load_into_topology(&self, topology: &mut Topology) -> Result<()> {
        for node in &self.nodes {
            topology.add_node(node.id.as_str(), node.remaining_energy.unwrap_or(f64::NAN))?;
        }

        for link in &self.links {
            let source = topology
                .node_by_id(&link.source)
                .ok_or_else(|| eyre!("Link {} references unknown node: {}", link.forward_id, link.source))?;
            let target = topology
                .node_by_id(&link.target)
                .ok_or_else(|| eyre!("Link {} references unknown node: {}", link.forward_id, link.target))?;
            topology.add_undirected_link_pair(
                link.forward_id.as_str(),
                link.backward_id.as_str(),
                source,
                target,
                link.distance,
                link.required_transmission_power.unwrap_or(f64::NAN),
            )?;
        }
        Ok(())
    }
}

fn parse_number(token: &str, what: &str, line_number: usize) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|e| eyre!("Line {}: invalid {} '{}': {}", line_number, what, token, e))
}

fn parse_count(token: Option<&str>, what: &str, line_number: usize) -> Result<usize> {
    let token = token.ok_or_else(|| eyre!("Line {}: missing {}", line_number, what))?;
    token
        .parse::<usize>()
        .map_err(|e| eyre!("Line {}: invalid {} '{}': {}", line_number, what, token, e))
}

/// Parse graphT content
pub fn parse_graph_t_str(content: &str) -> Result<GraphT> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (header_line, header) = lines.next().ok_or_else(|| eyre!("Missing graphT header"))?;
    let mut tokens = header.split_whitespace();
    let node_count = parse_count(tokens.next(), "node count", header_line)?;
    let link_count = parse_count(tokens.next(), "link count", header_line)?;

    let mut graph = GraphT::default();
    for _ in 0..node_count {
        let (line_number, line) = lines
            .next()
            .ok_or_else(|| eyre!("Expected {} node lines, found {}", node_count, graph.nodes.len()))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let remaining_energy = match tokens.as_slice() {
            [_] => None,
            [_, energy] => Some(parse_number(energy, "remaining energy", line_number)?),
            _ => bail!("Line {}: expected 'id [energy]', found '{}'", line_number, line),
        };
        graph.nodes.push(GraphTNode { id: tokens[0].to_string(), remaining_energy });
    }

    for _ in 0..link_count {
        let (line_number, line) = lines
            .next()
            .ok_or_else(|| eyre!("Expected {} link lines, found {}", link_count, graph.links.len()))?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (ids, power) = match tokens.as_slice() {
            [forward, backward, source, target, distance] => ([*forward, *backward, *source, *target, *distance], None),
            [forward, backward, source, target, distance, power] => (
                [*forward, *backward, *source, *target, *distance],
                Some(parse_number(power, "transmission power", line_number)?),
            ),
            _ => bail!(
                "Line {}: expected 'forward backward source target distance [power]', found '{}'",
                line_number,
                line
            ),
        };
        let [forward_id, backward_id, source, target, distance] = ids;
        graph.links.push(GraphTLink {
            forward_id: forward_id.to_string(),
            backward_id: backward_id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            distance: parse_number(distance, "distance", line_number)?,
            required_transmission_power: power,
        });
    }

    if let Some((line_number, line)) = lines.next() {
        bail!("Line {}: unexpected content after the last link: '{}'", line_number, line);
    }

    graph.validate()?;
    debug!("Parsed graphT with {} nodes and {} links", graph.nodes.len(), graph.links.len());
    Ok(graph)
}

/// Read and parse a graphT file
pub fn parse_graph_t_file(path: &Path) -> Result<GraphT> {
    let content = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read graphT file {:?}", path))?;
    parse_graph_t_str(&content).wrap_err_with(|| format!("Failed to parse graphT file {:?}", path))
}
