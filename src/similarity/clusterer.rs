//! Content-similarity clustering.
//!
//! Pairwise node similarity is a weighted sum of three components:
//! - **content**: set overlap of content tokens (Jaccard, Cosine or Dice)
//! - **type**: 1.0 when both nodes share a type (if enabled)
//! - **metadata**: fraction of metadata keys whose values are equal
//!
//! Clustering is hierarchical agglomerative with average linkage. Each
//! round merges the best-scoring pair of clusters; merging stops once the
//! best score drops below the configured threshold.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::debug;

use super::models::{SimilarNode, SimilarityConfig, SimilarityMetric};
use super::tokenizer::tokenize_content;
use crate::graph::{Cluster, ClusterAlgorithm, KnowledgeNode};

/// Overlap of two token sets under `metric`, in [0, 1].
///
/// Two empty sets are identical (1.0); an empty set against a non-empty one
/// scores 0.
pub fn set_similarity(metric: SimilarityMetric, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    match metric {
        SimilarityMetric::Jaccard => {
            let union = (a.len() + b.len()) as f64 - shared;
            shared / union
        }
        SimilarityMetric::Cosine => shared / ((a.len() * b.len()) as f64).sqrt(),
        SimilarityMetric::Dice => 2.0 * shared / (a.len() + b.len()) as f64,
    }
}

/// Fraction of the union of metadata keys whose values are equal on both
/// sides. 0 when neither side has metadata.
pub fn metadata_similarity(a: Option<&Map<String, Value>>, b: Option<&Map<String, Value>>) -> f64 {
    let empty = Map::new();
    let a = a.unwrap_or(&empty);
    let b = b.unwrap_or(&empty);

    let keys: HashSet<&String> = a.keys().chain(b.keys()).collect();
    if keys.is_empty() {
        return 0.0;
    }
    let equal = keys
        .iter()
        .filter(|key| matches!((a.get(key.as_str()), b.get(key.as_str())), (Some(x), Some(y)) if x == y))
        .count();
    equal as f64 / keys.len() as f64
}

/// Per-node data the similarity function reads.
struct Profile<'a> {
    id: &'a str,
    node_type: &'a str,
    tokens: BTreeSet<String>,
    metadata: Option<&'a Map<String, Value>>,
}

impl<'a> Profile<'a> {
    fn of(node: &'a KnowledgeNode) -> Self {
        Self {
            id: &node.id,
            node_type: &node.node_type,
            tokens: tokenize_content(&node.content),
            metadata: node.metadata.as_ref(),
        }
    }
}

pub struct SimilarityClusterer {
    config: SimilarityConfig,
}

impl SimilarityClusterer {
    pub fn new(config: SimilarityConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    fn profile_similarity(&self, a: &Profile<'_>, b: &Profile<'_>) -> f64 {
        let weights = &self.config.weights;
        let content = set_similarity(self.config.metric, &a.tokens, &b.tokens);
        let node_type = if self.config.consider_type && a.node_type == b.node_type {
            1.0
        } else {
            0.0
        };
        let metadata = metadata_similarity(a.metadata, b.metadata);
        weights.content * content + weights.node_type * node_type + weights.metadata * metadata
    }

    /// Weighted similarity of two nodes.
    pub fn similarity(&self, a: &KnowledgeNode, b: &KnowledgeNode) -> f64 {
        self.profile_similarity(&Profile::of(a), &Profile::of(b))
    }

    /// Symmetric pairwise similarity matrix; the diagonal is 1.0.
    pub fn similarity_matrix(&self, nodes: &[KnowledgeNode]) -> Vec<Vec<f64>> {
        let profiles: Vec<Profile<'_>> = nodes.iter().map(Profile::of).collect();
        self.matrix_of(&profiles)
    }

    fn matrix_of(&self, profiles: &[Profile<'_>]) -> Vec<Vec<f64>> {
        let n = profiles.len();
        let mut matrix = vec![vec![0.0; n]; n];
        for i in 0..n {
            matrix[i][i] = 1.0;
            for j in (i + 1)..n {
                let score = self.profile_similarity(&profiles[i], &profiles[j]);
                matrix[i][j] = score;
                matrix[j][i] = score;
            }
        }
        matrix
    }

    /// Cluster `nodes` by content similarity.
    ///
    /// Every node lands in exactly one cluster. A single node yields one
    /// cluster with coherence 1.0. No input yields no clusters rather than a
    /// trivial cluster, since a cluster always has at least one member.
    pub fn cluster(&self, nodes: &[KnowledgeNode]) -> Vec<Cluster> {
        let start = Instant::now();
        let profiles: Vec<Profile<'_>> = nodes.iter().map(Profile::of).collect();
        let matrix = self.matrix_of(&profiles);

        let mut groups: Vec<Vec<usize>> = (0..profiles.len()).map(|i| vec![i]).collect();
        let mut merges = 0usize;
        loop {
            let mut best: Option<(usize, usize, f64)> = None;
            for i in 0..groups.len() {
                for j in (i + 1)..groups.len() {
                    let score = average_linkage(&matrix, &groups[i], &groups[j]);
                    if best.map_or(true, |(_, _, b)| score > b) {
                        best = Some((i, j, score));
                    }
                }
            }
            match best {
                Some((i, j, score)) if score >= self.config.threshold => {
                    let absorbed = groups.remove(j);
                    groups[i].extend(absorbed);
                    groups[i].sort_unstable();
                    merges += 1;
                }
                _ => break,
            }
        }

        let clusters: Vec<Cluster> = groups
            .iter()
            .enumerate()
            .map(|(k, members)| self.build_cluster(k, members, &profiles, &matrix))
            .collect();
        debug!(
            node_count = nodes.len(),
            cluster_count = clusters.len(),
            merges,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Similarity clustering complete"
        );
        clusters
    }

    fn build_cluster(
        &self,
        k: usize,
        members: &[usize],
        profiles: &[Profile<'_>],
        matrix: &[Vec<f64>],
    ) -> Cluster {
        let avg_similarity = average_linkage_within(matrix, members);

        // Highest mean similarity to the other members; first on ties
        let centroid = members
            .iter()
            .map(|&m| {
                let others = members.iter().filter(|&&o| o != m);
                let count = members.len().saturating_sub(1).max(1) as f64;
                (m, others.map(|&o| matrix[m][o]).sum::<f64>() / count)
            })
            .fold(None::<(usize, f64)>, |best, (m, score)| match best {
                Some((_, b)) if b >= score => best,
                _ => Some((m, score)),
            })
            .map(|(m, _)| profiles[m].id.to_string());

        Cluster {
            id: format!("similarity_{k}"),
            nodes: members.iter().map(|&m| profiles[m].id.to_string()).collect(),
            centroid,
            coherence: avg_similarity.clamp(0.0, 1.0),
            algorithm: ClusterAlgorithm::Similarity,
            modularity: None,
            avg_similarity: Some(avg_similarity),
        }
    }

    /// Rank `candidates` by similarity to `target`, best first, keeping at
    /// most `limit`. Candidates sharing the target's id are skipped.
    pub fn similar_nodes(
        &self,
        target: &KnowledgeNode,
        candidates: &[KnowledgeNode],
        limit: usize,
    ) -> Vec<SimilarNode> {
        let target = Profile::of(target);
        let mut ranked: Vec<SimilarNode> = candidates
            .iter()
            .filter(|c| c.id != target.id)
            .map(|c| SimilarNode {
                node_id: c.id.clone(),
                similarity: self.profile_similarity(&target, &Profile::of(c)),
            })
            .collect();
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        ranked.truncate(limit);
        ranked
    }
}

/// Mean similarity over all cross pairs of two groups.
fn average_linkage(matrix: &[Vec<f64>], a: &[usize], b: &[usize]) -> f64 {
    let total: f64 = a
        .iter()
        .flat_map(|&i| b.iter().map(move |&j| matrix[i][j]))
        .sum();
    total / (a.len() * b.len()) as f64
}

/// Mean similarity over all unordered member pairs of one group.
fn average_linkage_within(matrix: &[Vec<f64>], members: &[usize]) -> f64 {
    let mut total = 0.0;
    let mut pairs = 0usize;
    for (idx, &i) in members.iter().enumerate() {
        for &j in &members[idx + 1..] {
            total += matrix[i][j];
            pairs += 1;
        }
    }
    if pairs == 0 {
        1.0
    } else {
        total / pairs as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
