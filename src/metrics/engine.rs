//! Metrics engine.
//!
//! `MetricsEngine` owns one [`AnalysisGraph`] snapshot and computes node and
//! graph metrics over it. Expensive intermediate results (shortest-path
//! tables, PageRank, eigenvector, betweenness) are computed at most once per
//! engine and reused across calls on the same engine.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::debug;

use super::algorithms::{
    betweenness_centrality, closeness_from, clustering_coefficient, eigenvector_centrality,
    pagerank, ShortestPathTable,
};
use super::models::{
    ArticulationPoint, BridgeEdge, CentralNode, CentralityType, GraphMetrics, Hub, MetricsConfig,
    NodeMetrics, StructuralAnalysis, StructuralImportance,
};
use crate::graph::AnalysisGraph;

pub struct MetricsEngine {
    graph: AnalysisGraph,
    config: MetricsConfig,
    /// Hop-bounded table behind betweenness
    bounded_paths: OnceCell<ShortestPathTable>,
    /// Unbounded table behind closeness, path length and diameter
    all_paths: OnceCell<ShortestPathTable>,
    betweenness: OnceCell<Vec<f64>>,
    pagerank: OnceCell<Vec<f64>>,
    eigenvector: OnceCell<Vec<f64>>,
    clustering: OnceCell<Vec<f64>>,
}

impl MetricsEngine {
    pub fn new(graph: AnalysisGraph, config: MetricsConfig) -> Self {
        Self {
            graph,
            config,
            bounded_paths: OnceCell::new(),
            all_paths: OnceCell::new(),
            betweenness: OnceCell::new(),
            pagerank: OnceCell::new(),
            eigenvector: OnceCell::new(),
            clustering: OnceCell::new(),
        }
    }

    pub fn graph(&self) -> &AnalysisGraph {
        &self.graph
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    // ========================================================================
    // Cached kernels
    // ========================================================================

    fn all_paths(&self) -> &ShortestPathTable {
        self.all_paths
            .get_or_init(|| ShortestPathTable::build(&self.graph, None))
    }

    fn betweenness_scores(&self) -> &[f64] {
        self.betweenness.get_or_init(|| {
            let start = Instant::now();
            let table = self.bounded_paths.get_or_init(|| {
                ShortestPathTable::build(&self.graph, Some(self.config.betweenness_max_hops))
            });
            let scores = betweenness_centrality(table);
            debug!(
                node_count = self.graph.node_count(),
                max_hops = self.config.betweenness_max_hops,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Betweenness computed"
            );
            scores
        })
    }

    fn pagerank_scores(&self) -> &[f64] {
        self.pagerank
            .get_or_init(|| pagerank(&self.graph, &self.config))
    }

    fn eigenvector_scores(&self) -> &[f64] {
        self.eigenvector
            .get_or_init(|| eigenvector_centrality(&self.graph, &self.config))
    }

    fn clustering_scores(&self) -> &[f64] {
        self.clustering
            .get_or_init(|| clustering_coefficient(&self.graph))
    }

    fn closeness(&self, pos: usize) -> f64 {
        closeness_from(&self.all_paths().dist[pos], pos)
    }

    fn max_degree(&self) -> usize {
        (0..self.graph.node_count())
            .map(|pos| self.graph.degree(pos))
            .max()
            .unwrap_or(0)
    }

    // ========================================================================
    // Node metrics
    // ========================================================================

    fn node_metrics_at(&self, pos: usize) -> NodeMetrics {
        NodeMetrics {
            node_id: self.graph.node_id(pos).to_string(),
            degree: self.graph.degree(pos),
            in_degree: self.graph.in_degree(pos),
            out_degree: self.graph.out_degree(pos),
            betweenness: self.betweenness_scores()[pos],
            closeness: self.closeness(pos),
            pagerank: self.pagerank_scores()[pos],
            eigenvector: self.eigenvector_scores()[pos],
            clustering_coefficient: self.clustering_scores()[pos],
        }
    }

    /// Metrics for one node; `None` if the node is not in the snapshot.
    pub fn calculate_node_metrics(&self, node_id: &str) -> Option<NodeMetrics> {
        self.graph
            .position(node_id)
            .map(|pos| self.node_metrics_at(pos))
    }

    /// Metrics for every node, in snapshot order.
    pub fn calculate_all_node_metrics(&self) -> Vec<NodeMetrics> {
        (0..self.graph.node_count())
            .map(|pos| self.node_metrics_at(pos))
            .collect()
    }

    fn centrality_score(&self, pos: usize, centrality: CentralityType) -> f64 {
        match centrality {
            CentralityType::Degree => self.graph.degree(pos) as f64,
            CentralityType::Betweenness => self.betweenness_scores()[pos],
            CentralityType::Closeness => self.closeness(pos),
            CentralityType::PageRank => self.pagerank_scores()[pos],
            CentralityType::Eigenvector => self.eigenvector_scores()[pos],
        }
    }

    /// Top `count` nodes by `centrality`, descending. Ties keep snapshot order.
    pub fn find_central_nodes(&self, count: usize, centrality: CentralityType) -> Vec<CentralNode> {
        let mut ranked: Vec<CentralNode> = (0..self.graph.node_count())
            .map(|pos| CentralNode {
                node_id: self.graph.node_id(pos).to_string(),
                score: self.centrality_score(pos, centrality),
                centrality,
            })
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(count);
        ranked
    }

    // ========================================================================
    // Graph metrics
    // ========================================================================

    pub fn calculate_graph_metrics(&self) -> GraphMetrics {
        let start = Instant::now();
        let n = self.graph.node_count();
        let m = self.graph.edge_count();

        let density = if n < 2 {
            0.0
        } else {
            m as f64 / (n * (n - 1)) as f64
        };

        let (average_degree, max_degree) = if n == 0 {
            (0.0, 0)
        } else {
            let total: usize = (0..n).map(|pos| self.graph.degree(pos)).sum();
            (total as f64 / n as f64, self.max_degree())
        };

        let mut pair_count = 0usize;
        let mut distance_sum = 0usize;
        let mut diameter = 0usize;
        if n > 1 {
            for (s, row) in self.all_paths().dist.iter().enumerate() {
                for (t, &d) in row.iter().enumerate() {
                    let Some(d) = d else { continue };
                    if s != t {
                        pair_count += 1;
                        distance_sum += d;
                        diameter = diameter.max(d);
                    }
                }
            }
        }
        let average_path_length = if pair_count == 0 {
            0.0
        } else {
            distance_sum as f64 / pair_count as f64
        };

        let clustering_coefficient = if n == 0 {
            0.0
        } else {
            self.clustering_scores().iter().sum::<f64>() / n as f64
        };

        let metrics = GraphMetrics {
            node_count: n,
            edge_count: m,
            density,
            average_degree,
            max_degree,
            average_path_length,
            diameter,
            clustering_coefficient,
            connected_components: petgraph::algo::connected_components(&self.graph.graph),
        };
        debug!(
            node_count = n,
            edge_count = m,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Graph metrics computed"
        );
        metrics
    }

    // ========================================================================
    // Structure
    // ========================================================================

    fn hub_positions(&self) -> Vec<usize> {
        let max_degree = self.max_degree();
        if max_degree == 0 {
            return vec![];
        }
        let cutoff = self.config.hub_threshold * max_degree as f64;
        (0..self.graph.node_count())
            .filter(|&pos| self.graph.degree(pos) as f64 >= cutoff)
            .collect()
    }

    /// Small-world / scale-free classification plus bridge and hub nodes.
    pub fn analyze_structure(&self) -> StructuralAnalysis {
        let metrics = self.calculate_graph_metrics();
        let n = metrics.node_count;

        let is_small_world = n > 1
            && metrics.average_path_length > 0.0
            && metrics.average_path_length < (n as f64).ln()
            && metrics.clustering_coefficient > self.config.small_world_clustering;
        let is_scale_free = metrics.average_degree > 0.0
            && metrics.max_degree as f64 > self.config.scale_free_ratio * metrics.average_degree;

        let betweenness = self.betweenness_scores();
        let bridge_nodes = (0..n)
            .filter(|&pos| betweenness[pos] > self.config.bridge_node_threshold)
            .map(|pos| self.graph.node_id(pos).to_string())
            .collect();
        let hub_nodes = self
            .hub_positions()
            .into_iter()
            .map(|pos| self.graph.node_id(pos).to_string())
            .collect();

        let mut degree_distribution = BTreeMap::new();
        for pos in 0..n {
            *degree_distribution.entry(self.graph.degree(pos)).or_insert(0) += 1;
        }

        StructuralAnalysis {
            is_small_world,
            is_scale_free,
            bridge_nodes,
            hub_nodes,
            degree_distribution,
            metrics,
        }
    }

    /// Bridge edges, articulation points and hubs.
    ///
    /// Bridge edges are reported once per ordered node pair, under the type
    /// of the first such edge.
    pub fn detect_structural_importance(&self) -> StructuralImportance {
        let betweenness = self.betweenness_scores();

        let mut bridges = Vec::new();
        let mut seen_pairs = HashSet::new();
        for edge in self.graph.graph.edge_indices() {
            let (s, t) = self.graph.endpoints(edge);
            if !seen_pairs.insert((s, t)) {
                continue;
            }
            let importance = (betweenness[s] + betweenness[t]) / 2.0;
            if importance > self.config.bridge_edge_threshold {
                bridges.push(BridgeEdge {
                    from: self.graph.node_id(s).to_string(),
                    to: self.graph.node_id(t).to_string(),
                    edge_type: self.graph.edge(edge).edge_type.clone(),
                    importance,
                });
            }
        }

        let articulation_points = betweenness
            .iter()
            .enumerate()
            .filter(|&(_, &score)| score > self.config.bridge_node_threshold)
            .map(|(pos, &score)| ArticulationPoint {
                node_id: self.graph.node_id(pos).to_string(),
                importance: score,
            })
            .collect();

        let max_degree = self.max_degree();
        let hubs = self
            .hub_positions()
            .into_iter()
            .map(|pos| {
                let degree = self.graph.degree(pos);
                Hub {
                    node_id: self.graph.node_id(pos).to_string(),
                    degree,
                    importance: degree as f64 / max_degree as f64,
                }
            })
            .collect();

        StructuralImportance {
            bridges,
            articulation_points,
            hubs,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
