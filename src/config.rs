use serde::{Deserialize, Serialize};

use crate::algorithm::{AlgorithmId, OperationMode, KTC_PARAMETER_K};

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Topology control scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub algorithm: AlgorithmConfig,
    pub topology: TopologyConfig,
    /// Context events replayed after the initial topology control run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlgorithmConfig {
    pub id: AlgorithmId,
    /// Stretch factor, required for kTC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<f64>,
    #[serde(default = "default_operation_mode")]
    pub operation_mode: OperationMode,
}

fn default_operation_mode() -> OperationMode {
    OperationMode::Incremental
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyConfig {
    /// Path of a graphT file
    pub path: String,
}

/// A context event or an explicit topology control run.
///
/// Link events act on both directions of an undirected link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScenarioEvent {
    AddNode {
        id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remaining_energy: Option<f64>,
    },
    AddLink {
        forward: String,
        backward: String,
        source: String,
        target: String,
        distance: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        required_transmission_power: Option<f64>,
    },
    RemoveLink {
        link: String,
    },
    RemoveNode {
        node: String,
    },
    SetDistance {
        link: String,
        distance: f64,
    },
    SetEnergy {
        node: String,
        remaining_energy: f64,
    },
    /// Re-run topology control, optionally with a new stretch factor
    Run {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        k: Option<f64>,
    },
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!("unknown log level '{}'", level)));
            }
        }

        if self.topology.path.is_empty() {
            return Err(ValidationError::InvalidTopology("topology path cannot be empty".to_string()));
        }

        match (self.algorithm.id, self.algorithm.k) {
            (id, None) if id.expected_parameters().contains(&KTC_PARAMETER_K) => {
                return Err(ValidationError::InvalidAlgorithm(format!(
                    "{} requires the stretch factor k",
                    self.algorithm.id
                )));
            }
            (_, Some(k)) => validate_k(k).map_err(ValidationError::InvalidAlgorithm)?,
            (_, None) => {}
        }

        for (index, event) in self.events.iter().enumerate() {
            Self::validate_event(event).map_err(|e| ValidationError::InvalidEvent(format!("event {}: {}", index, e)))?;
        }

        Ok(())
    }

    fn validate_event(event: &ScenarioEvent) -> Result<(), String> {
        let ids: Vec<&str> = match event {
            ScenarioEvent::AddNode { id, .. } => vec![id.as_str()],
            ScenarioEvent::AddLink { forward, backward, source, target, .. } => {
                if forward == backward {
                    return Err(format!("forward and backward link share the ID '{}'", forward));
                }
                vec![forward.as_str(), backward.as_str(), source.as_str(), target.as_str()]
            }
            ScenarioEvent::RemoveLink { link } | ScenarioEvent::SetDistance { link, .. } => vec![link.as_str()],
            ScenarioEvent::RemoveNode { node } | ScenarioEvent::SetEnergy { node, .. } => vec![node.as_str()],
            ScenarioEvent::Run { k } => {
                if let Some(k) = k {
                    validate_k(*k)?;
                }
                Vec::new()
            }
        };

        if ids.iter().any(|id| id.is_empty()) {
            return Err("IDs cannot be empty".to_string());
        }
        Ok(())
    }
}

fn validate_k(k: f64) -> Result<(), String> {
    if !k.is_finite() || k < 1.0 {
        return Err(format!("k must be finite and at least 1, got {}", k));
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid algorithm configuration: {0}")]
    InvalidAlgorithm(String),
    #[error("Invalid topology configuration: {0}")]
    InvalidTopology(String),
    #[error("Invalid scenario event: {0}")]
    InvalidEvent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_full_scenario() {
        let config = parse(
            r#"
general:
  log_level: debug
algorithm:
  id: D_KTC
  k: 1.41
  operation_mode: batch
topology:
  path: graph.txt
events:
  - type: add_node
    id: n9
    remaining_energy: 2.0
  - type: add_link
    forward: e19
    backward: e91
    source: n1
    target: n9
    distance: 10.0
  - type: remove_link
    link: e12
  - type: set_distance
    link: e13
    distance: 4.0
  - type: run
"#,
        );

        assert_eq!(config.algorithm.id, AlgorithmId::DistanceKtc);
        assert_eq!(config.algorithm.k, Some(1.41));
        assert_eq!(config.algorithm.operation_mode, OperationMode::Batch);
        assert_eq!(config.events.len(), 5);
        assert_eq!(
            config.events[0],
            ScenarioEvent::AddNode { id: "n9".to_string(), remaining_energy: Some(2.0) }
        );
        assert_eq!(config.events[4], ScenarioEvent::Run { k: None });
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = parse(
            r#"
algorithm:
  id: MAXPOWER_TC
topology:
  path: graph.txt
"#,
        );
        assert_eq!(config.algorithm.operation_mode, OperationMode::Incremental);
        assert!(config.events.is_empty());
        assert!(config.general.log_level.is_none());
        config.validate().unwrap();
    }

    #[test]
    fn test_validation_errors() {
        let mut config = parse(
            r#"
algorithm:
  id: D_KTC
  k: 1.5
topology:
  path: graph.txt
"#,
        );
        config.validate().unwrap();

        config.algorithm.k = None;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAlgorithm(_))));

        config.algorithm.id = AlgorithmId::EnergyKtc;
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAlgorithm(_))));

        config.algorithm.id = AlgorithmId::MaxPower;
        config.validate().unwrap();

        config.algorithm.id = AlgorithmId::DistanceKtc;
        config.algorithm.k = Some(0.5);
        assert!(matches!(config.validate(), Err(ValidationError::InvalidAlgorithm(_))));

        config.algorithm.k = Some(1.5);
        config.topology.path.clear();
        assert!(matches!(config.validate(), Err(ValidationError::InvalidTopology(_))));

        config.topology.path = "graph.txt".to_string();
        config.events.push(ScenarioEvent::Run { k: Some(f64::NAN) });
        assert!(matches!(config.validate(), Err(ValidationError::InvalidEvent(_))));

        config.events = vec![ScenarioEvent::RemoveLink { link: String::new() }];
        assert!(matches!(config.validate(), Err(ValidationError::InvalidEvent(_))));

        config.events.clear();
        config.general.log_level = Some("loud".to_string());
        assert!(matches!(config.validate(), Err(ValidationError::InvalidGeneral(_))));
    }

    #[test]
    fn test_unknown_algorithm_is_rejected() {
        let result: Result<Config, _> = serde_yaml::from_str(
            r#"
algorithm:
  id: LMST
topology:
  path: graph.txt
"#,
        );
        assert!(result.is_err());
    }
}
