//! Graph metric algorithms.
//!
//! Implements the metric kernels on [`AnalysisGraph`] snapshots:
//! - **PageRank** — power iteration, dangling mass spread evenly
//! - **Eigenvector centrality** — power iteration on in-edges, L2-normalized
//! - **Betweenness centrality** — shortest paths enumerated within a hop bound
//! - **Closeness centrality** — reachable / sum of undirected distances
//! - **Clustering coefficient** — local clustering per node
//! - **Connected components** — BFS on the undirected view
//! - **Modularity** — Newman's Q for a node partition
//!
//! All kernels return vectors indexed by snapshot position.

use std::collections::VecDeque;

use petgraph::visit::EdgeRef;

use super::models::MetricsConfig;
use crate::graph::AnalysisGraph;

// ============================================================================
// PageRank (power iteration)
// ============================================================================

/// Compute PageRank scores for all nodes.
///
/// Multi-edges each carry a share of the source's rank. Stops after
/// `max_iterations` or once no score moves by `tolerance` or more, then
/// normalizes the scores to sum to 1.0.
pub fn pagerank(graph: &AnalysisGraph, config: &MetricsConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let damping = config.pagerank_damping;
    let initial = 1.0 / n as f64;
    let mut scores: Vec<f64> = vec![initial; n];
    let mut new_scores: Vec<f64> = vec![0.0; n];

    for _ in 0..config.max_iterations {
        for s in new_scores.iter_mut() {
            *s = (1.0 - damping) / n as f64;
        }

        let mut dangling = 0.0;
        for (i, &score) in scores.iter().enumerate() {
            let out = graph.out_edges(i);
            if out.is_empty() {
                dangling += damping * score / n as f64;
                continue;
            }
            let contribution = damping * score / out.len() as f64;
            for &edge in out {
                let (_, target) = graph.endpoints(edge);
                new_scores[target] += contribution;
            }
        }
        if dangling > 0.0 {
            for s in new_scores.iter_mut() {
                *s += dangling;
            }
        }

        let max_change = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        std::mem::swap(&mut scores, &mut new_scores);

        if max_change < config.tolerance {
            break;
        }
    }

    let total: f64 = scores.iter().sum();
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    }
    scores
}

// ============================================================================
// Eigenvector centrality
// ============================================================================

/// Eigenvector centrality by power iteration on incoming edges.
///
/// Each iteration sets a node's score to the sum of its predecessors' scores
/// (one term per edge) and rescales the vector to unit L2 norm. When the
/// vector collapses to zero (e.g. an acyclic graph) every score is 0.
pub fn eigenvector_centrality(graph: &AnalysisGraph, config: &MetricsConfig) -> Vec<f64> {
    let n = graph.node_count();
    if n == 0 {
        return vec![];
    }

    let mut scores = vec![1.0 / n as f64; n];
    for _ in 0..config.max_iterations {
        let mut next = vec![0.0; n];
        for (v, slot) in next.iter_mut().enumerate() {
            *slot = graph
                .in_edges(v)
                .iter()
                .map(|&edge| scores[graph.endpoints(edge).0])
                .sum();
        }

        let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            return vec![0.0; n];
        }
        for x in next.iter_mut() {
            *x /= norm;
        }

        let max_change = scores
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        scores = next;
        if max_change < config.tolerance {
            break;
        }
    }
    scores
}

// ============================================================================
// Shortest paths (undirected view)
// ============================================================================

/// Hop distances and shortest-path counts from a single source over the
/// undirected view. Nodes beyond `max_hops` stay unreached.
pub fn bfs_from(
    graph: &AnalysisGraph,
    source: usize,
    max_hops: Option<usize>,
) -> (Vec<Option<usize>>, Vec<f64>) {
    let n = graph.node_count();
    let mut dist: Vec<Option<usize>> = vec![None; n];
    let mut sigma = vec![0.0; n];
    dist[source] = Some(0);
    sigma[source] = 1.0;

    let mut queue = VecDeque::from([source]);
    while let Some(current) = queue.pop_front() {
        let d = dist[current].unwrap_or(0);
        if max_hops.is_some_and(|limit| d >= limit) {
            continue;
        }
        for &next in graph.neighbors(current) {
            match dist[next] {
                None => {
                    dist[next] = Some(d + 1);
                    sigma[next] = sigma[current];
                    queue.push_back(next);
                }
                Some(dn) if dn == d + 1 => sigma[next] += sigma[current],
                Some(_) => {}
            }
        }
    }
    (dist, sigma)
}

/// All-pairs hop distances and shortest-path counts.
#[derive(Debug, Clone)]
pub struct ShortestPathTable {
    pub dist: Vec<Vec<Option<usize>>>,
    pub sigma: Vec<Vec<f64>>,
}

impl ShortestPathTable {
    pub fn build(graph: &AnalysisGraph, max_hops: Option<usize>) -> Self {
        let (dist, sigma) = (0..graph.node_count())
            .map(|s| bfs_from(graph, s, max_hops))
            .unzip();
        Self { dist, sigma }
    }

    pub fn node_count(&self) -> usize {
        self.dist.len()
    }
}

// ============================================================================
// Betweenness centrality (bounded)
// ============================================================================

/// Betweenness of `target` from a hop-bounded shortest-path table.
///
/// For every unordered pair `{s, t}` of other nodes joined within the hop
/// bound, adds the fraction of their shortest paths passing through
/// `target`. Normalized by `(n-1)(n-2)/2`; 0 when `n < 3`.
pub fn betweenness_of(table: &ShortestPathTable, target: usize) -> f64 {
    let n = table.node_count();
    if n < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    for s in 0..n {
        if s == target {
            continue;
        }
        let Some(d_sv) = table.dist[s][target] else {
            continue;
        };
        for t in (s + 1)..n {
            if t == target {
                continue;
            }
            let (Some(d_st), Some(d_vt)) = (table.dist[s][t], table.dist[target][t]) else {
                continue;
            };
            let sigma_st = table.sigma[s][t];
            if d_sv + d_vt == d_st && sigma_st > 0.0 {
                total += table.sigma[s][target] * table.sigma[target][t] / sigma_st;
            }
        }
    }

    let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;
    total / pairs
}

/// Bounded betweenness for every node.
pub fn betweenness_centrality(table: &ShortestPathTable) -> Vec<f64> {
    (0..table.node_count())
        .map(|v| betweenness_of(table, v))
        .collect()
}

// ============================================================================
// Closeness centrality
// ============================================================================

/// `reachable / sum_of_distances` from one row of an unbounded distance
/// table; 0 when nothing else is reachable.
pub fn closeness_from(distances: &[Option<usize>], source: usize) -> f64 {
    let (reachable, total) = distances
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != source)
        .filter_map(|(_, d)| *d)
        .fold((0usize, 0usize), |(count, sum), d| (count + 1, sum + d));
    if total == 0 {
        0.0
    } else {
        reachable as f64 / total as f64
    }
}

// ============================================================================
// Clustering Coefficient
// ============================================================================

/// Local clustering coefficient of one node on the undirected view:
/// linked neighbor pairs / C(k, 2), 0 when k < 2.
pub fn local_clustering(graph: &AnalysisGraph, pos: usize) -> f64 {
    let neighbors = graph.neighbors(pos);
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }

    let mut links = 0usize;
    for i in 0..k {
        for j in (i + 1)..k {
            if graph.adjacent(neighbors[i], neighbors[j]) {
                links += 1;
            }
        }
    }
    links as f64 / (k * (k - 1) / 2) as f64
}

/// Local clustering coefficient for every node.
pub fn clustering_coefficient(graph: &AnalysisGraph) -> Vec<f64> {
    (0..graph.node_count())
        .map(|pos| local_clustering(graph, pos))
        .collect()
}

// ============================================================================
// Connected Components
// ============================================================================

/// Weakly connected components, in order of their lowest position.
/// Members are sorted by position.
pub fn connected_components(graph: &AnalysisGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut assigned = vec![false; n];
    let mut components = Vec::new();

    for start in 0..n {
        if assigned[start] {
            continue;
        }
        assigned[start] = true;
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &next in graph.neighbors(current) {
                if !assigned[next] {
                    assigned[next] = true;
                    members.push(next);
                    queue.push_back(next);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }
    components
}

// ============================================================================
// Modularity
// ============================================================================

/// Newman's modularity Q of a partition, using edge strengths as weights.
///
/// `community[i]` is the community label of position `i`. Edges are read as
/// undirected; 0 when the graph carries no weight.
pub fn modularity(graph: &AnalysisGraph, community: &[usize]) -> f64 {
    let n = graph.node_count();
    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    let mut node_strengths = vec![0.0; n];
    let mut total_weight = 0.0;

    for edge in graph.graph.edge_references() {
        let s = edge.source().index();
        let t = edge.target().index();
        let w = edge.weight().strength;
        adj[s].push((t, w));
        adj[t].push((s, w));
        node_strengths[s] += w;
        node_strengths[t] += w;
        total_weight += w;
    }

    if total_weight == 0.0 {
        return 0.0;
    }
    let m2 = 2.0 * total_weight;
    let mut q = 0.0;

    for (i, neighbors) in adj.iter().enumerate() {
        for &(j, w) in neighbors {
            if community[i] == community[j] {
                q += w;
            }
        }
    }
    for i in 0..n {
        for j in 0..n {
            if community[i] == community[j] {
                q -= node_strengths[i] * node_strengths[j] / m2;
            }
        }
    }
    q / m2
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{analysis_graph, chain_ids, star_edges};

    fn star(n_leaves: usize) -> AnalysisGraph {
        let (ids, edges) = star_edges("center", n_leaves);
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let pairs: Vec<(&str, &str)> = edges
            .iter()
            .map(|(f, t)| (f.as_str(), t.as_str()))
            .collect();
        analysis_graph(&id_refs, &pairs)
    }

    fn chain(n: usize) -> AnalysisGraph {
        let ids = chain_ids(n);
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let pairs: Vec<(&str, &str)> = id_refs.windows(2).map(|w| (w[0], w[1])).collect();
        analysis_graph(&id_refs, &pairs)
    }

    fn triangle() -> AnalysisGraph {
        analysis_graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")])
    }

    // --- PageRank ---

    #[test]
    fn test_pagerank_reverse_star_center_highest() {
        let g = analysis_graph(
            &["center", "l0", "l1", "l2", "l3", "l4"],
            &[
                ("l0", "center"),
                ("l1", "center"),
                ("l2", "center"),
                ("l3", "center"),
                ("l4", "center"),
            ],
        );
        let pr = pagerank(&g, &MetricsConfig::default());
        assert_eq!(pr.len(), 6);
        for leaf in 1..6 {
            assert!(pr[0] > pr[leaf], "center {} vs leaf {}", pr[0], pr[leaf]);
        }
        let total: f64 = pr.iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "PageRank sum should be ≈ 1.0, got {total}");
    }

    #[test]
    fn test_pagerank_directed_star_leaves_higher() {
        // Leaves are dangling and accumulate more rank than the center
        let g = star(5);
        let pr = pagerank(&g, &MetricsConfig::default());
        let center = g.position("center").unwrap();
        let leaf = g.position("center_leaf_0").unwrap();
        assert!(pr[leaf] > pr[center]);
    }

    #[test]
    fn test_pagerank_cycle_is_uniform() {
        let pr = pagerank(&triangle(), &MetricsConfig::default());
        for score in &pr {
            assert!((score - 1.0 / 3.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pagerank_empty_graph() {
        let g = analysis_graph(&[], &[]);
        assert!(pagerank(&g, &MetricsConfig::default()).is_empty());
    }

    #[test]
    fn test_pagerank_counts_multi_edges() {
        // a sends two edges to b and one to c
        let g = analysis_graph(&["a", "b", "c"], &[("a", "b"), ("a", "b"), ("a", "c")]);
        let pr = pagerank(&g, &MetricsConfig::default());
        assert!(pr[1] > pr[2]);
    }

    // --- Eigenvector ---

    #[test]
    fn test_eigenvector_cycle_is_uniform_unit_norm() {
        let ev = eigenvector_centrality(&triangle(), &MetricsConfig::default());
        let norm: f64 = ev.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        for x in &ev {
            assert!((x - ev[0]).abs() < 1e-9);
        }
    }

    #[test]
    fn test_eigenvector_acyclic_collapses_to_zero() {
        let ev = eigenvector_centrality(&chain(4), &MetricsConfig::default());
        assert!(ev.iter().all(|&x| x == 0.0));
    }

    // --- Betweenness ---

    #[test]
    fn test_betweenness_chain_middle_highest() {
        let g = chain(5);
        let table = ShortestPathTable::build(&g, Some(5));
        let bc = betweenness_centrality(&table);
        assert!(bc[2] > bc[0]);
        assert!(bc[2] > bc[1]);
        assert_eq!(bc[0], 0.0);
        // Middle of a 5-chain sits on 4 of the 6 pairs that exclude it
        assert!((bc[2] - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_star_center_is_one() {
        let g = star(4);
        let table = ShortestPathTable::build(&g, Some(5));
        let bc = betweenness_centrality(&table);
        let center = g.position("center").unwrap();
        assert!((bc[center] - 1.0).abs() < 1e-12);
        for (pos, score) in bc.iter().enumerate() {
            if pos != center {
                assert_eq!(*score, 0.0);
            }
        }
    }

    #[test]
    fn test_betweenness_splits_between_parallel_routes() {
        // a-b-d and a-c-d: b and c each carry half of the a..d pair
        let g = analysis_graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let table = ShortestPathTable::build(&g, Some(5));
        let bc = betweenness_centrality(&table);
        assert!((bc[1] - 0.5 / 3.0).abs() < 1e-12);
        assert!((bc[1] - bc[2]).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_respects_hop_bound() {
        // Ends of an 8-chain are 7 hops apart, beyond the bound of 5
        let g = chain(8);
        let bounded = betweenness_centrality(&ShortestPathTable::build(&g, Some(5)));
        let unbounded = betweenness_centrality(&ShortestPathTable::build(&g, None));
        assert!(bounded[3] < unbounded[3]);
    }

    #[test]
    fn test_betweenness_small_graphs_are_zero() {
        let g = analysis_graph(&["a", "b"], &[("a", "b")]);
        let table = ShortestPathTable::build(&g, Some(5));
        assert_eq!(betweenness_centrality(&table), vec![0.0, 0.0]);
    }

    // --- Closeness ---

    #[test]
    fn test_closeness() {
        let g = star(3);
        let table = ShortestPathTable::build(&g, None);
        let center = g.position("center").unwrap();
        assert!((closeness_from(&table.dist[center], center) - 1.0).abs() < 1e-12);
        // A leaf: 1 hop to center, 2 hops to each other leaf
        let leaf = g.position("center_leaf_0").unwrap();
        assert!((closeness_from(&table.dist[leaf], leaf) - 3.0 / 5.0).abs() < 1e-12);

        let lonely = analysis_graph(&["x"], &[]);
        let table = ShortestPathTable::build(&lonely, None);
        assert_eq!(closeness_from(&table.dist[0], 0), 0.0);
    }

    // --- Clustering Coefficient ---

    #[test]
    fn test_clustering_triangle_all_one() {
        for coeff in clustering_coefficient(&triangle()) {
            assert!((coeff - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_clustering_star_center_zero() {
        let g = star(5);
        let cc = clustering_coefficient(&g);
        assert_eq!(cc[g.position("center").unwrap()], 0.0);
    }

    // --- Connected Components ---

    #[test]
    fn test_connected_components_disconnected() {
        let g = analysis_graph(
            &["a", "x", "b", "y", "c"],
            &[("a", "b"), ("c", "b"), ("x", "y")],
        );
        assert_eq!(connected_components(&g), vec![vec![0, 2, 4], vec![1, 3]]);
    }

    #[test]
    fn test_connected_components_single() {
        let g = chain(5);
        assert_eq!(connected_components(&g), vec![vec![0, 1, 2, 3, 4]]);
    }

    // --- Modularity ---

    #[test]
    fn test_modularity_two_triangles() {
        let g = analysis_graph(
            &["a", "b", "c", "x", "y", "z"],
            &[
                ("a", "b"),
                ("b", "c"),
                ("c", "a"),
                ("x", "y"),
                ("y", "z"),
                ("z", "x"),
            ],
        );
        let q = modularity(&g, &[0, 0, 0, 1, 1, 1]);
        assert!((q - 0.5).abs() < 1e-12, "got {q}");
        assert!(modularity(&g, &[0; 6]).abs() < 1e-12);
    }

    #[test]
    fn test_modularity_without_edges() {
        let g = analysis_graph(&["a", "b"], &[]);
        assert_eq!(modularity(&g, &[0, 1]), 0.0);
    }
}
