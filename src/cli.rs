//! Knowledge Graph - CLI Tool
//!
//! Loads a JSON snapshot and runs one analysis against it, printing JSON to
//! stdout. Logs go to stderr.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use knowledge_graph::patterns::PatternSummary;
use knowledge_graph::{
    CentralityType, ClusterAlgorithm, EngineConfig, GraphSnapshot, GraphStore, PatternType,
};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kg")]
#[command(about = "Analyze a knowledge graph snapshot")]
struct Cli {
    /// Snapshot JSON file produced by `GraphStore::export_json`
    #[arg(short, long, env = "KG_SNAPSHOT")]
    snapshot: PathBuf,

    /// YAML config file (defaults to kg.yaml in the working directory)
    #[arg(short, long, env = "KG_CONFIG")]
    config: Option<PathBuf>,

    /// Print compact instead of pretty JSON
    #[arg(long)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node and edge counts of the snapshot
    Stats,

    /// Whole-graph metrics (density, diameter, path length, clustering)
    Metrics,

    /// Centralities of one node, or of every node when omitted
    Node {
        /// Node id
        id: Option<String>,
    },

    /// Top nodes by a centrality measure
    Central {
        /// degree, betweenness, closeness, pagerank or eigenvector
        #[arg(short = 't', long, default_value = "degree")]
        centrality: String,

        /// Number of nodes to return
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Small-world / scale-free classification
    Structure,

    /// Bridge edges, articulation points and hubs
    Importance,

    /// Mine structural patterns
    Patterns {
        /// Restrict to these families (repeatable)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Print per-family counts instead of the patterns
        #[arg(long)]
        summary: bool,
    },

    /// Cluster nodes
    Clusters {
        /// community or similarity
        #[arg(short, long, default_value = "community")]
        algorithm: String,
    },

    /// Nodes most similar in content to a node
    Similar {
        id: String,

        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },

    /// All simple paths between two nodes
    Paths {
        from: String,
        to: String,

        /// Maximum nodes per path
        #[arg(short, long, default_value = "5")]
        depth: usize,
    },

    /// Shortest directed path between two nodes
    Shortest { from: String, to: String },

    /// Neighborhood of a node within a hop radius
    Subgraph {
        id: String,

        #[arg(short, long, default_value = "2")]
        depth: usize,
    },

    /// Weakly connected components
    Components,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    node_count: usize,
    edge_count: usize,
}

fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,knowledge_graph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = EngineConfig::from_yaml_and_env(cli.config.as_deref())?;
    let store = load_store(&cli.snapshot, config)?;
    tracing::info!(
        node_count = store.node_count(),
        edge_count = store.edge_count(),
        "Snapshot loaded from {}",
        cli.snapshot.display()
    );

    let output = run(&store, cli.command)?;
    if cli.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn load_store(path: &Path, config: EngineConfig) -> Result<GraphStore> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = GraphSnapshot::from_json(&json)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    let mut store = GraphStore::with_config(config);
    store
        .import_snapshot(snapshot)
        .context("Snapshot rejected")?;
    Ok(store)
}

fn run(store: &GraphStore, command: Commands) -> Result<serde_json::Value> {
    let value = match command {
        Commands::Stats => serde_json::to_value(Stats {
            node_count: store.node_count(),
            edge_count: store.edge_count(),
        })?,
        Commands::Metrics => serde_json::to_value(store.calculate_graph_metrics())?,
        Commands::Node { id: Some(id) } => {
            let metrics = store
                .calculate_node_metrics(&id)
                .with_context(|| format!("Node not found: {id}"))?;
            serde_json::to_value(metrics)?
        }
        Commands::Node { id: None } => serde_json::to_value(store.calculate_all_node_metrics())?,
        Commands::Central { centrality, count } => serde_json::to_value(
            store.find_central_nodes(count, CentralityType::parse_or_default(&centrality)),
        )?,
        Commands::Structure => serde_json::to_value(store.analyze_structure())?,
        Commands::Importance => serde_json::to_value(store.detect_structural_importance())?,
        Commands::Patterns { types, summary } => {
            let mut mining = store.config().mining.clone();
            if !types.is_empty() {
                mining.enabled = types
                    .iter()
                    .map(|name| {
                        PatternType::parse(name)
                            .with_context(|| format!("Unknown pattern type: {name}"))
                    })
                    .collect::<Result<_>>()?;
            }
            let patterns = store.mine_patterns_with(&mining);
            if summary {
                serde_json::to_value(PatternSummary::from_patterns(&patterns))?
            } else {
                serde_json::to_value(patterns)?
            }
        }
        Commands::Clusters { algorithm } => serde_json::to_value(
            store.cluster_nodes(ClusterAlgorithm::parse_or_default(&algorithm)),
        )?,
        Commands::Similar { id, limit } => {
            serde_json::to_value(store.find_similar_nodes(&id, limit))?
        }
        Commands::Paths { from, to, depth } => {
            serde_json::to_value(store.find_paths(&from, &to, depth))?
        }
        Commands::Shortest { from, to } => {
            serde_json::to_value(store.find_shortest_path(&from, &to))?
        }
        Commands::Subgraph { id, depth } => serde_json::to_value(store.get_subgraph(&id, depth))?,
        Commands::Components => serde_json::to_value(store.get_connected_components())?,
    };
    Ok(value)
}
