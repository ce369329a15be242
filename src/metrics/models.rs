//! Metrics data models.
//!
//! ## Output types
//! - [`NodeMetrics`] — per-node centralities and local clustering
//! - [`GraphMetrics`] — whole-graph statistics
//! - [`StructuralAnalysis`] — small-world / scale-free classification
//! - [`StructuralImportance`] — bridge edges, articulation points, hubs
//! - [`CentralNode`] — one entry of a centrality ranking
//!
//! ## Configuration
//! - [`MetricsConfig`] — iteration bounds and classification thresholds

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the metrics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// PageRank damping factor (default: 0.85)
    pub pagerank_damping: f64,
    /// Convergence tolerance for PageRank and eigenvector (default: 1e-6)
    pub tolerance: f64,
    /// Iteration cap for PageRank and eigenvector (default: 100)
    pub max_iterations: usize,
    /// Hop bound of the shortest-path search behind betweenness (default: 5)
    pub betweenness_max_hops: usize,
    /// Fraction of the maximum degree a node needs to count as a hub (default: 0.8)
    pub hub_threshold: f64,
    /// Betweenness above which a node is a bridge / articulation point (default: 0.1)
    pub bridge_node_threshold: f64,
    /// Endpoint-average betweenness above which an edge is a bridge (default: 0.05)
    pub bridge_edge_threshold: f64,
    /// Clustering coefficient a small-world graph must exceed (default: 0.3)
    pub small_world_clustering: f64,
    /// Max-degree / mean-degree ratio a scale-free graph must exceed (default: 3.0)
    pub scale_free_ratio: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            pagerank_damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
            betweenness_max_hops: 5,
            hub_threshold: 0.8,
            bridge_node_threshold: 0.1,
            bridge_edge_threshold: 0.05,
            small_world_clustering: 0.3,
            scale_free_ratio: 3.0,
        }
    }
}

impl MetricsConfig {
    /// Replace out-of-range values with their defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(0.0..1.0).contains(&self.pagerank_damping) {
            warn!(value = self.pagerank_damping, "Invalid pagerank_damping, using default");
            self.pagerank_damping = defaults.pagerank_damping;
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            warn!(value = self.tolerance, "Invalid tolerance, using default");
            self.tolerance = defaults.tolerance;
        }
        if self.max_iterations == 0 {
            warn!("max_iterations must be positive, using default");
            self.max_iterations = defaults.max_iterations;
        }
        if self.betweenness_max_hops == 0 {
            warn!("betweenness_max_hops must be positive, using default");
            self.betweenness_max_hops = defaults.betweenness_max_hops;
        }
        if !(0.0..=1.0).contains(&self.hub_threshold) {
            warn!(value = self.hub_threshold, "Invalid hub_threshold, using default");
            self.hub_threshold = defaults.hub_threshold;
        }
        self
    }
}

// ============================================================================
// Centrality selection
// ============================================================================

/// Centrality measure used to rank nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentralityType {
    #[default]
    Degree,
    Betweenness,
    Closeness,
    #[serde(rename = "pagerank")]
    PageRank,
    Eigenvector,
}

impl CentralityType {
    /// Parse a centrality name, falling back to `Degree` for unknown names.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "degree" => Self::Degree,
            "betweenness" => Self::Betweenness,
            "closeness" => Self::Closeness,
            "pagerank" | "page_rank" => Self::PageRank,
            "eigenvector" => Self::Eigenvector,
            other => {
                warn!(centrality = other, "Unknown centrality type, using degree");
                Self::Degree
            }
        }
    }
}

impl std::fmt::Display for CentralityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degree => write!(f, "degree"),
            Self::Betweenness => write!(f, "betweenness"),
            Self::Closeness => write!(f, "closeness"),
            Self::PageRank => write!(f, "pagerank"),
            Self::Eigenvector => write!(f, "eigenvector"),
        }
    }
}

/// A node and its score under one centrality measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralNode {
    pub node_id: String,
    pub score: f64,
    pub centrality: CentralityType,
}

// ============================================================================
// Output types
// ============================================================================

/// Per-node scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub node_id: String,
    /// in_degree + out_degree, multi-edges counted individually
    pub degree: usize,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Bounded-hop betweenness, normalized by (n-1)(n-2)/2
    pub betweenness: f64,
    /// reachable / sum of undirected distances
    pub closeness: f64,
    pub pagerank: f64,
    pub eigenvector: f64,
    /// Local clustering coefficient in [0, 1]
    pub clustering_coefficient: f64,
}

impl NodeMetrics {
    /// Score of this node under `centrality`.
    pub fn score(&self, centrality: CentralityType) -> f64 {
        match centrality {
            CentralityType::Degree => self.degree as f64,
            CentralityType::Betweenness => self.betweenness,
            CentralityType::Closeness => self.closeness,
            CentralityType::PageRank => self.pagerank,
            CentralityType::Eigenvector => self.eigenvector,
        }
    }
}

/// Whole-graph statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub node_count: usize,
    pub edge_count: usize,
    /// edges / (n(n-1)); 0 when n < 2
    pub density: f64,
    pub average_degree: f64,
    pub max_degree: usize,
    /// Mean undirected distance over reachable ordered pairs
    pub average_path_length: f64,
    /// Longest undirected distance over reachable pairs
    pub diameter: usize,
    /// Mean of the local clustering coefficients
    pub clustering_coefficient: f64,
    pub connected_components: usize,
}

/// Global structural classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralAnalysis {
    pub is_small_world: bool,
    pub is_scale_free: bool,
    /// Nodes whose betweenness exceeds the bridge threshold
    pub bridge_nodes: Vec<String>,
    /// Nodes whose degree reaches `hub_threshold × max_degree`
    pub hub_nodes: Vec<String>,
    /// degree → number of nodes with that degree
    pub degree_distribution: BTreeMap<usize, usize>,
    pub metrics: GraphMetrics,
}

/// An edge whose endpoints carry high betweenness on average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticulationPoint {
    pub node_id: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub node_id: String,
    pub degree: usize,
    /// degree / max_degree
    pub importance: f64,
}

/// Structurally important elements of the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralImportance {
    pub bridges: Vec<BridgeEdge>,
    pub articulation_points: Vec<ArticulationPoint>,
    pub hubs: Vec<Hub>,
}

// ============================================================================
// Tests
// ============================================================================
