//! Cluster dispatch on the store.
//!
//! `community` clusters are the undirected connected components of the edge
//! structure; `similarity` clusters come from the content-based
//! [`SimilarityClusterer`](crate::similarity::SimilarityClusterer).

use std::time::Instant;

use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::metrics::algorithms::{connected_components, modularity};
use crate::similarity::{SimilarNode, SimilarityClusterer};

use super::extraction::AnalysisGraph;
use super::models::{Cluster, ClusterAlgorithm};
use super::store::GraphStore;

impl GraphStore {
    /// Cluster all nodes with the given algorithm.
    pub fn cluster_nodes(&self, algorithm: ClusterAlgorithm) -> Vec<Cluster> {
        let start = Instant::now();
        let clusters = match algorithm {
            ClusterAlgorithm::Community => community_clusters(&self.analysis_graph()),
            ClusterAlgorithm::Similarity => {
                SimilarityClusterer::new(self.config().similarity.clone())
                    .cluster(&self.get_all_nodes())
            }
        };
        debug!(
            algorithm = %algorithm,
            cluster_count = clusters.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Nodes clustered"
        );
        clusters
    }

    /// Cluster by algorithm name; unknown names fall back to `community`.
    pub fn cluster_nodes_by_name(&self, algorithm: &str) -> Vec<Cluster> {
        self.cluster_nodes(ClusterAlgorithm::parse_or_default(algorithm))
    }

    /// Nodes most similar in content to `node_id`, best first. Empty when
    /// the node does not exist.
    pub fn find_similar_nodes(&self, node_id: &str, limit: usize) -> Vec<SimilarNode> {
        let Some(target) = self.get_node(node_id) else {
            return vec![];
        };
        SimilarityClusterer::new(self.config().similarity.clone()).similar_nodes(
            &target,
            &self.get_all_nodes(),
            limit,
        )
    }
}

/// One cluster per connected component.
///
/// Coherence is intra-component edges over edges touching the component
/// (1.0 for an edgeless component). Every cluster carries the modularity of
/// the whole partition; the centroid is the member of highest degree, first
/// in insertion order on ties.
pub(crate) fn community_clusters(graph: &AnalysisGraph) -> Vec<Cluster> {
    let components = connected_components(graph);
    let mut assignment = vec![0usize; graph.node_count()];
    for (label, members) in components.iter().enumerate() {
        for &pos in members {
            assignment[pos] = label;
        }
    }

    let mut internal = vec![0usize; components.len()];
    let mut touching = vec![0usize; components.len()];
    for edge in graph.graph.edge_references() {
        let s = assignment[edge.source().index()];
        let t = assignment[edge.target().index()];
        touching[s] += 1;
        if s == t {
            internal[s] += 1;
        } else {
            touching[t] += 1;
        }
    }

    let q = modularity(graph, &assignment);

    components
        .iter()
        .enumerate()
        .map(|(label, members)| {
            let coherence = if touching[label] == 0 {
                1.0
            } else {
                internal[label] as f64 / touching[label] as f64
            };
            let centroid = members
                .iter()
                .copied()
                .fold(None::<usize>, |best, pos| match best {
                    Some(b) if graph.degree(b) >= graph.degree(pos) => Some(b),
                    _ => Some(pos),
                })
                .map(|pos| graph.node_id(pos).to_string());
            Cluster {
                id: format!("community_{label}"),
                nodes: members
                    .iter()
                    .map(|&pos| graph.node_id(pos).to_string())
                    .collect(),
                centroid,
                coherence,
                algorithm: ClusterAlgorithm::Community,
                modularity: Some(q),
                avg_similarity: None,
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{store_with_edges, two_triangles};
    use crate::KnowledgeNode;
    use serde_json::json;

    #[test]
    fn test_two_disjoint_triangles() {
        let store = two_triangles();
        let clusters = store.cluster_nodes(ClusterAlgorithm::Community);
        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert_eq!(cluster.size(), 3);
            assert!((cluster.coherence - 1.0).abs() < f64::EPSILON);
            assert_eq!(cluster.algorithm, ClusterAlgorithm::Community);
            assert!((cluster.modularity.unwrap() - 0.5).abs() < 1e-12);
        }
        assert_eq!(clusters[0].id, "community_0");
        assert_eq!(clusters[0].nodes, vec!["a", "b", "c"]);
        assert_eq!(clusters[1].nodes, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_community_centroid_is_highest_degree() {
        let store = store_with_edges(
            &["leaf1", "hub", "leaf2", "leaf3"],
            &[("hub", "leaf1"), ("hub", "leaf2"), ("leaf3", "hub")],
        );
        let clusters = store.cluster_nodes(ClusterAlgorithm::Community);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].centroid.as_deref(), Some("hub"));
    }

    #[test]
    fn test_isolated_nodes_form_singletons() {
        let store = store_with_edges(&["a", "b"], &[]);
        let clusters = store.cluster_nodes(ClusterAlgorithm::Community);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.size() == 1 && c.coherence == 1.0));
        assert_eq!(clusters[0].modularity, Some(0.0));
    }

    #[test]
    fn test_unknown_algorithm_falls_back_to_community() {
        let store = two_triangles();
        let clusters = store.cluster_nodes_by_name("spectral");
        assert_eq!(clusters.len(), 2);
        assert!(clusters
            .iter()
            .all(|c| c.algorithm == ClusterAlgorithm::Community));
    }

    #[test]
    fn test_similarity_dispatch() {
        let mut store = store_with_edges(&[], &[]);
        store
            .add_node(KnowledgeNode::new("r1", "doc", json!("rust ownership borrowing lifetimes")))
            .unwrap();
        store
            .add_node(KnowledgeNode::new("r2", "doc", json!("rust ownership borrowing traits")))
            .unwrap();
        store
            .add_node(KnowledgeNode::new("c1", "recipe", json!("banana bread flour sugar")))
            .unwrap();

        let clusters = store.cluster_nodes_by_name("similarity");
        assert!(clusters
            .iter()
            .all(|c| c.algorithm == ClusterAlgorithm::Similarity));
        let rust = clusters.iter().find(|c| c.contains("r1")).unwrap();
        assert!(rust.contains("r2"));
        assert!(!rust.contains("c1"));
        let total: usize = clusters.iter().map(Cluster::size).sum();
        assert_eq!(total, 3);

        let similar = store.find_similar_nodes("r1", 1);
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].node_id, "r2");
        assert!(store.find_similar_nodes("missing", 5).is_empty());
    }

    #[test]
    fn test_empty_store_has_no_clusters() {
        let store = store_with_edges(&[], &[]);
        assert!(store.cluster_nodes(ClusterAlgorithm::Community).is_empty());
        assert!(store.cluster_nodes(ClusterAlgorithm::Similarity).is_empty());
    }
}
