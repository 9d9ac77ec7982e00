//! # ktcsim - Incremental topology control for wireless sensor networks
//!
//! This library maintains a kTC (k-Triangle-Topology-Control) classification
//! of the links of a wireless network while the network changes. Every
//! directed link is ACTIVE, INACTIVE or UNCLASSIFIED; kTC inactivates the
//! longest link of a triangle when a detour over the two shorter links is at
//! most `k` times longer than the shorter of them. Energy-aware kTC applies
//! the same rule to estimated link lifetimes, the remaining energy of the
//! source divided by the required transmission power.
//!
//! ## Overview
//!
//! A simulation host mutates the network through the
//! [`TopologyControlFacade`](facade::TopologyControlFacade) using its own
//! node and edge IDs. The facade updates the canonical topology, forwards the
//! change to the configured algorithm, which repairs the classification
//! incrementally, and checks consistency constraints after context events
//! and after explicit topology control runs.
//!
//! ## Architecture
//!
//! - `model`: arena-backed topology of nodes and directed links
//! - `algorithm`: distance-kTC, energy-aware kTC and max-power topology control
//! - `constraints`: kTC consistency, connectivity and classification checks
//! - `facade`: ID mapping, listeners and constraint checkpoints
//! - `graph_t`: reader for graphT topology files
//! - `config`: scenario configuration structures
//! - `config_loader`: scenario loading and CLI overrides
//! - `scenario`: scenario execution and run summaries
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ktcsim::algorithm::{AlgorithmId, OperationMode};
//! use ktcsim::facade::{EdgeId, EdgePrototype, NodePrototype, TopologyControlFacade};
//!
//! let mut facade = TopologyControlFacade::new();
//! facade.set_operation_mode(OperationMode::Incremental);
//! facade.configure_algorithm(AlgorithmId::DistanceKtc)?;
//!
//! for id in ["A", "B", "C"] {
//!     facade.add_node(NodePrototype::new(id))?;
//! }
//! facade.add_symmetric_edge(EdgePrototype::new("eAB", "A", "B", 1.0), "eBA")?;
//! facade.add_symmetric_edge(EdgePrototype::new("eBC", "B", "C", 1.0), "eCB")?;
//! facade.add_symmetric_edge(EdgePrototype::new("eAC", "A", "C", 1.9), "eCA")?;
//!
//! facade.run_with_k(1.5)?;
//! facade.check_constraints_after_topology_control_run();
//!
//! // A-C is inactive; later mutations are repaired incrementally
//! facade.remove_edge_symmetric(&EdgeId::from("eBC"))?;
//! facade.check_constraints_after_context_event();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Scenario Format
//!
//! The `ktcsim` binary runs YAML scenarios:
//!
//! ```yaml
//! general:
//!   log_level: info
//!
//! algorithm:
//!   id: D_KTC               # or E_KTC, MAXPOWER_TC
//!   k: 1.41
//!   operation_mode: incremental   # or batch
//!
//! topology:
//!   path: "graph.txt"       # graphT file
//!
//! events:
//!   - type: remove_link
//!     link: e12
//!   - type: run
//!     k: 1.5
//! ```
//!
//! ## Error Handling
//!
//! Library operations return typed errors (`TopologyError`, `AlgorithmError`,
//! `FacadeError`, `ValidationError`). File loading and the binary use
//! `color_eyre` for error reports with context. Constraint violations are
//! not errors: they are reported, logged and counted.

pub mod algorithm;
pub mod config;
pub mod config_loader;
pub mod constraints;
pub mod facade;
pub mod graph_t;
pub mod model;
pub mod scenario;
