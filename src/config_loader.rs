use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Load and parse a scenario from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file {:?}", config_path))?;
    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file {:?}", config_path))?;

    config.validate()?;

    Ok(config)
}

/// CLI arguments that override scenario settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub graph: Option<PathBuf>,
    pub k: Option<f64>,
}

/// Apply CLI overrides to a scenario and validate the result
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(graph) = &overrides.graph {
        info!("Overriding topology path with {:?}", graph);
        config.topology.path = graph.to_string_lossy().into_owned();
    }

    if let Some(k) = overrides.k {
        info!("Overriding stretch factor with k = {}", k);
        config.algorithm.k = Some(k);
    }

    config.validate()?;

    Ok(())
}

/// Path of the topology file; relative paths are resolved against the
/// directory of the configuration file
pub fn resolve_topology_path(config_path: &Path, config: &Config) -> PathBuf {
    let path = Path::new(&config.topology.path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
