use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{debug, info};
use std::fs;
use std::path::PathBuf;

use ktcsim::config_loader::{self, CliOverrides};
use ktcsim::graph_t::parse_graph_t_file;
use ktcsim::model::format_edge_state_report;
use ktcsim::scenario::run_scenario;

/// Topology control simulator for wireless sensor networks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// graphT topology file, overrides the scenario's topology path
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// kTC stretch factor, overrides the scenario's k
    #[arg(short, long)]
    k: Option<f64>,

    /// Output path for the JSON run summary
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = config_loader::load_config(&args.config)?;
    let overrides = CliOverrides { graph: args.graph.clone(), k: args.k };
    config_loader::apply_overrides(&mut config, &overrides)?;

    // Initialize logging; RUST_LOG wins over the scenario's log level
    let default_level = config.general.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Starting ktcsim");
    info!("Configuration file: {:?}", args.config);
    info!(
        "Algorithm: {} ({:?} mode, k = {:?})",
        config.algorithm.id, config.algorithm.operation_mode, config.algorithm.k
    );

    let graph_path = match &args.graph {
        Some(path) => path.clone(),
        None => config_loader::resolve_topology_path(&args.config, &config),
    };
    let graph = parse_graph_t_file(&graph_path)?;
    info!(
        "Loaded topology {:?} with {} nodes and {} undirected links",
        graph_path,
        graph.nodes.len(),
        graph.links.len()
    );

    let (summary, runner) = run_scenario(&config, &graph)?;
    debug!("Edge states:\n{}", format_edge_state_report(runner.facade().topology()));

    let json = serde_json::to_string_pretty(&summary)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &json).wrap_err_with(|| format!("Failed to write run summary to '{}'", path.display()))?;
            info!("Run summary written to {:?}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["ktcsim", "--config", "scenario.yaml"]);

        assert_eq!(args.config, PathBuf::from("scenario.yaml"));
        assert!(args.graph.is_none());
        assert!(args.k.is_none());
        assert!(args.output.is_none());
    }

    #[test]
    fn test_override_args() {
        let args = Args::parse_from([
            "ktcsim",
            "--config",
            "scenario.yaml",
            "--graph",
            "graph.txt",
            "-k",
            "1.41",
            "--output",
            "summary.json",
        ]);

        assert_eq!(args.graph, Some(PathBuf::from("graph.txt")));
        assert_eq!(args.k, Some(1.41));
        assert_eq!(args.output, Some(PathBuf::from("summary.json")));
    }
}
