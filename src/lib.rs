//! Knowledge Graph Engine
//!
//! An embeddable, in-memory knowledge graph with:
//! - Typed nodes and typed, weighted multi-edges with cascade deletion
//! - Traversal primitives (bounded path enumeration, shortest path, subgraphs)
//! - Centrality metrics and whole-graph statistics
//! - Structural pattern mining (star, chain, cycle, tree, bridge, cluster, hub)
//! - Content-similarity clustering
//! - Lossless JSON snapshots
//!
//! ## Modules
//!
//! - [`graph`] — `GraphStore`, traversal, clustering dispatch, snapshots
//! - [`metrics`] — `MetricsEngine` over a petgraph snapshot
//! - [`patterns`] — `PatternMiner` and the seven detectors
//! - [`similarity`] — Tokenizer and `SimilarityClusterer`
//! - [`events`] — Change notifications for store mutations
//! - [`error`] — `GraphError` and the crate `Result` alias

pub mod error;
pub mod events;
pub mod graph;
pub mod metrics;
pub mod patterns;
pub mod similarity;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::{GraphError, Result};
pub use graph::{
    Cluster, ClusterAlgorithm, EdgeDirection, GraphSnapshot, GraphStore, KnowledgeEdge,
    KnowledgeNode, NodeUpdate, SubgraphEntry, DEFAULT_TRAVERSAL_DEPTH, MAX_TRAVERSAL_DEPTH,
};
pub use metrics::{CentralityType, MetricsConfig, MetricsEngine};
pub use patterns::{GraphPattern, MiningConfig, PatternMiner, PatternType};
pub use similarity::{SimilarityClusterer, SimilarityConfig, SimilarityMetric};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kg.yaml";

// ============================================================================
// Configuration
// ============================================================================

/// Depth bounds for path enumeration and subgraph extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Depth used when a caller passes an out-of-range value (default: 5)
    pub default_depth: usize,
    /// Largest depth a caller may request (default: 10)
    pub max_depth: usize,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            default_depth: DEFAULT_TRAVERSAL_DEPTH,
            max_depth: MAX_TRAVERSAL_DEPTH,
        }
    }
}

impl TraversalConfig {
    /// Keep `1 <= default_depth <= max_depth <= MAX_TRAVERSAL_DEPTH`.
    pub fn sanitized(mut self) -> Self {
        if self.max_depth == 0 || self.max_depth > MAX_TRAVERSAL_DEPTH {
            tracing::warn!(
                value = self.max_depth,
                limit = MAX_TRAVERSAL_DEPTH,
                "Invalid max_depth, using limit"
            );
            self.max_depth = MAX_TRAVERSAL_DEPTH;
        }
        if self.default_depth == 0 || self.default_depth > self.max_depth {
            let fallback = DEFAULT_TRAVERSAL_DEPTH.min(self.max_depth);
            tracing::warn!(
                value = self.default_depth,
                fallback,
                "Invalid default_depth"
            );
            self.default_depth = fallback;
        }
        self
    }
}

/// Analytics configuration for a [`GraphStore`].
///
/// Loaded from YAML (all sections optional) and then overridden by
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub metrics: MetricsConfig,
    pub mining: MiningConfig,
    pub similarity: SimilarityConfig,
    pub traversal: TraversalConfig,
}

impl EngineConfig {
    /// Load from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries `kg.yaml` in CWD. A missing or
    /// unparsable file falls back to defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::load_yaml(yaml_path);

        if let Some(v) = env_parse::<f64>("KG_MIN_SUPPORT") {
            config.mining.min_support = v;
        }
        if let Some(v) = env_parse::<f64>("KG_MIN_CONFIDENCE") {
            config.mining.min_confidence = v;
        }
        if let Some(v) = env_parse::<usize>("KG_MAX_PATTERN_SIZE") {
            config.mining.max_pattern_size = v;
        }
        if let Some(v) = env_parse::<f64>("KG_SIMILARITY_THRESHOLD") {
            config.similarity.threshold = v;
        }
        if let Some(v) = env_parse::<f64>("KG_HUB_THRESHOLD") {
            config.metrics.hub_threshold = v;
        }
        if let Some(v) = env_parse::<usize>("KG_MAX_PATH_DEPTH") {
            config.traversal.max_depth = v;
        }

        Ok(config.sanitized())
    }

    /// Load from the environment only (plus `kg.yaml` if present).
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Sanitize every section.
    pub fn sanitized(self) -> Self {
        Self {
            metrics: self.metrics.sanitized(),
            mining: self.mining.sanitized(),
            similarity: self.similarity.sanitized(),
            traversal: self.traversal.sanitized(),
        }
    }

    fn load_yaml(yaml_path: Option<&Path>) -> Self {
        let path = yaml_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::debug!("No config file at {}, using env vars / defaults", path.display());
                Self::default()
            }
        }
    }
}

/// Parse an env var, ignoring (with a warning) values that do not parse.
fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparsable env override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ENV_VARS: [&str; 6] = [
        "KG_MIN_SUPPORT",
        "KG_MIN_CONFIDENCE",
        "KG_MAX_PATTERN_SIZE",
        "KG_SIMILARITY_THRESHOLD",
        "KG_HUB_THRESHOLD",
        "KG_MAX_PATH_DEPTH",
    ];

    #[test]
    fn test_yaml_defaults() {
        let config: EngineConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.traversal.default_depth, 5);
        assert_eq!(config.traversal.max_depth, 10);
    }

    #[test]
    fn test_partial_yaml_sections() {
        let yaml = r#"
metrics:
  pagerank_damping: 0.9
similarity:
  metric: cosine
  threshold: 0.4
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.metrics.pagerank_damping, 0.9);
        assert_eq!(config.metrics.max_iterations, 100);
        assert_eq!(config.similarity.metric, SimilarityMetric::Cosine);
        assert_eq!(config.mining, MiningConfig::default());
    }

    #[test]
    fn test_traversal_sanitized() {
        let config = TraversalConfig {
            default_depth: 8,
            max_depth: 50,
        }
        .sanitized();
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.default_depth, 8);

        let config = TraversalConfig {
            default_depth: 7,
            max_depth: 3,
        }
        .sanitized();
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.default_depth, 3);
    }

    /// YAML loading, env overrides and fallbacks in one test to avoid
    /// parallel env var races.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded ---
        let yaml = r#"
mining:
  min_support: 0.2
  max_pattern_size: 6
similarity:
  threshold: 0.7
traversal:
  max_depth: 8
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("kg.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = EngineConfig::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.mining.min_support, 0.2);
        assert_eq!(config.mining.max_pattern_size, 6);
        assert_eq!(config.similarity.threshold, 0.7);
        assert_eq!(config.traversal.max_depth, 8);

        // --- Phase 2: env overrides YAML, bad values are clamped or ignored ---
        std::env::set_var("KG_MAX_PATTERN_SIZE", "4");
        std::env::set_var("KG_MIN_CONFIDENCE", "1.7");
        std::env::set_var("KG_HUB_THRESHOLD", "not-a-number");
        std::env::set_var("KG_MAX_PATH_DEPTH", "99");

        let config = EngineConfig::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.mining.max_pattern_size, 4);
        assert_eq!(config.mining.min_confidence, 1.0);
        assert_eq!(config.metrics.hub_threshold, 0.8);
        assert_eq!(config.traversal.max_depth, MAX_TRAVERSAL_DEPTH);
        assert_eq!(config.mining.min_support, 0.2);

        clear_env();

        // --- Phase 3: unparsable YAML falls back to defaults ---
        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "mining: [not, a, map").unwrap();
        let config = EngineConfig::from_yaml_and_env(Some(&broken)).unwrap();
        assert_eq!(config, EngineConfig::default());

        // --- Phase 4: no file at all ---
        let missing = dir.path().join("missing.yaml");
        let config = EngineConfig::from_yaml_and_env(Some(&missing)).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
