//! Structural pattern detectors.
//!
//! Each detector scans an [`AnalysisGraph`] and returns raw detections
//! (node positions, edge indices, descriptive contexts). Scoring, merging
//! and filtering happen in the miner. Every detector caps its detections at
//! `max_size` nodes.
//!
//! Neighbor order always follows edge insertion order, so detections are
//! deterministic for a given graph.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::EdgeIndex;

use super::models::PatternType;
use crate::graph::AnalysisGraph;

/// Minimum number of distinct neighbors a star center needs.
pub const STAR_MIN_LEAVES: usize = 3;
/// Minimum nodes in a chain, cycle, tree or cluster.
pub const MIN_STRUCTURE_NODES: usize = 3;
/// A node is a bridge when fewer than this fraction of its neighbor pairs
/// are linked.
pub const BRIDGE_LINK_RATIO: f64 = 0.25;
/// A cluster keeps growing only while its density stays above this.
pub const CLUSTER_DENSITY_THRESHOLD: f64 = 0.3;
/// Hubs need at least this many incident edges.
pub const HUB_MIN_DEGREE: usize = 3;
/// ... and at least this fraction of the node count.
pub const HUB_DEGREE_FRACTION: f64 = 0.05;

/// One raw detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub pattern_type: PatternType,
    pub nodes: Vec<usize>,
    pub edges: Vec<EdgeIndex>,
    pub contexts: Vec<String>,
}

/// First edge joining `a` and `b` in either direction, preferring `a → b`.
fn edge_between(graph: &AnalysisGraph, a: usize, b: usize) -> Option<EdgeIndex> {
    graph
        .edges_between(a, b)
        .next()
        .or_else(|| graph.edges_between(b, a).next())
}

/// First edge of each consecutive pair along `path`.
fn path_edges(graph: &AnalysisGraph, path: &[usize]) -> Vec<EdgeIndex> {
    path.windows(2)
        .filter_map(|w| graph.edges_between(w[0], w[1]).next())
        .collect()
}

// ============================================================================
// Star
// ============================================================================

/// Nodes with at least three distinct out-neighbors (or in-neighbors).
///
/// Outgoing and incoming stars are reported separately. Leaves beyond the
/// size cap are dropped.
pub fn detect_stars(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    if max_size < STAR_MIN_LEAVES + 1 {
        return vec![];
    }
    let mut found = Vec::new();
    for center in 0..graph.node_count() {
        let orientations: [(&[usize], bool); 2] = [
            (graph.successors(center), true),
            (graph.predecessors(center), false),
        ];
        for (neighbors, outgoing) in orientations {
            let leaves: Vec<usize> = neighbors
                .iter()
                .copied()
                .filter(|&n| n != center)
                .collect();
            if leaves.len() < STAR_MIN_LEAVES {
                continue;
            }
            let kept = &leaves[..leaves.len().min(max_size - 1)];
            let edges = kept
                .iter()
                .filter_map(|&leaf| {
                    if outgoing {
                        graph.edges_between(center, leaf).next()
                    } else {
                        graph.edges_between(leaf, center).next()
                    }
                })
                .collect();
            let mut nodes = vec![center];
            nodes.extend_from_slice(kept);
            found.push(Detection {
                pattern_type: PatternType::Star,
                nodes,
                edges,
                contexts: vec![
                    format!(
                        "direction:{}",
                        if outgoing { "outgoing" } else { "incoming" }
                    ),
                    format!("leaves:{}", leaves.len()),
                ],
            });
        }
    }
    found
}

// ============================================================================
// Chain
// ============================================================================

fn out_neighbors(graph: &AnalysisGraph, pos: usize) -> impl Iterator<Item = usize> + '_ {
    graph.successors(pos).iter().copied().filter(move |&n| n != pos)
}

/// Whether some predecessor of `pos` leads nowhere but `pos`, which makes
/// `pos` the interior of a longer chain rather than its start.
fn continues_chain(graph: &AnalysisGraph, pos: usize) -> bool {
    graph.predecessors(pos).iter().any(|&p| {
        p != pos && {
            let mut succ = out_neighbors(graph, p);
            succ.next() == Some(pos) && succ.next().is_none()
        }
    })
}

/// Maximal simple directed paths of three or more nodes whose interior
/// nodes each have exactly one outgoing neighbor.
///
/// A chain contained in a longer reported chain is not reported.
pub fn detect_chains(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let mut chains: Vec<Vec<usize>> = Vec::new();

    for start in 0..graph.node_count() {
        if continues_chain(graph, start) {
            continue;
        }
        for first in out_neighbors(graph, start) {
            let mut path = vec![start, first];
            let mut on_path: HashSet<usize> = HashSet::from([start, first]);
            while path.len() < max_size {
                let current = path[path.len() - 1];
                let mut succ = out_neighbors(graph, current);
                let (Some(next), None) = (succ.next(), succ.next()) else {
                    break;
                };
                if !on_path.insert(next) {
                    break;
                }
                path.push(next);
            }
            if path.len() >= MIN_STRUCTURE_NODES {
                chains.push(path);
            }
        }
    }

    let contained = |short: &Vec<usize>, long: &Vec<usize>| {
        short.len() < long.len() && long.windows(short.len()).any(|w| w == short.as_slice())
    };
    let maximal: Vec<&Vec<usize>> = chains
        .iter()
        .filter(|c| !chains.iter().any(|other| contained(c, other)))
        .collect();

    maximal
        .into_iter()
        .map(|path| Detection {
            pattern_type: PatternType::Chain,
            nodes: path.clone(),
            edges: path_edges(graph, path),
            contexts: vec![format!("length:{}", path.len())],
        })
        .collect()
}

// ============================================================================
// Cycle
// ============================================================================

/// Simple directed cycles of three or more nodes.
///
/// Depth-first search with on-path detection; once a node belongs to a
/// reported cycle it is never part of another one. Cycles longer than the
/// size cap are skipped.
pub fn detect_cycles(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let n = graph.node_count();
    let mut visited = vec![false; n];
    let mut claimed = vec![false; n];
    let mut found = Vec::new();

    for root in 0..n {
        if visited[root] {
            continue;
        }
        // (node, index of the next successor to try)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        let mut path: Vec<usize> = vec![root];
        let mut path_pos: HashMap<usize, usize> = HashMap::from([(root, 0)]);
        visited[root] = true;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let successors = graph.successors(node);
            if top.1 >= successors.len() {
                stack.pop();
                path.pop();
                path_pos.remove(&node);
                continue;
            }
            let next = successors[top.1];
            top.1 += 1;

            if let Some(&start) = path_pos.get(&next) {
                let cycle = &path[start..];
                if cycle.len() >= MIN_STRUCTURE_NODES
                    && cycle.len() <= max_size
                    && cycle.iter().all(|&c| !claimed[c])
                {
                    for &c in cycle {
                        claimed[c] = true;
                    }
                    let mut closed = cycle.to_vec();
                    closed.push(cycle[0]);
                    found.push(Detection {
                        pattern_type: PatternType::Cycle,
                        nodes: cycle.to_vec(),
                        edges: path_edges(graph, &closed),
                        contexts: vec![format!("length:{}", cycle.len())],
                    });
                }
            } else if !visited[next] {
                visited[next] = true;
                path_pos.insert(next, path.len());
                path.push(next);
                stack.push((next, 0));
            }
        }
    }
    found
}

// ============================================================================
// Tree
// ============================================================================

/// Breadth-first trees grown from every root (node without incoming edges)
/// along outgoing edges, keeping only the edge that first discovers each
/// node. A tree is reported when it has three or more nodes and branches.
///
/// Only in-degree 0 nodes are roots, so a graph where every node has an
/// incoming edge (every node on a cycle, say) yields no trees. Paths that
/// never branch are left to the chain detector.
pub fn detect_trees(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let mut found = Vec::new();
    for root in 0..graph.node_count() {
        if graph.in_degree(root) > 0 || graph.out_degree(root) == 0 {
            continue;
        }

        let mut nodes = vec![root];
        let mut edges = Vec::new();
        let mut seen = HashSet::from([root]);
        let mut children = vec![0usize; 1];
        let mut depth = vec![0usize; 1];
        let mut queue = VecDeque::from([0usize]);

        'grow: while let Some(parent_slot) = queue.pop_front() {
            let parent = nodes[parent_slot];
            for child in out_neighbors(graph, parent) {
                if nodes.len() >= max_size {
                    break 'grow;
                }
                if !seen.insert(child) {
                    continue;
                }
                if let Some(edge) = graph.edges_between(parent, child).next() {
                    edges.push(edge);
                }
                children[parent_slot] += 1;
                nodes.push(child);
                children.push(0);
                depth.push(depth[parent_slot] + 1);
                queue.push_back(nodes.len() - 1);
            }
        }

        let branches = children.iter().any(|&c| c >= 2);
        if nodes.len() >= MIN_STRUCTURE_NODES && branches {
            let max_depth = depth.iter().copied().max().unwrap_or(0);
            found.push(Detection {
                pattern_type: PatternType::Tree,
                nodes,
                edges,
                contexts: vec![format!("depth:{max_depth}")],
            });
        }
    }
    found
}

// ============================================================================
// Bridge
// ============================================================================

/// Fraction of unordered neighbor pairs of `pos` that are themselves linked.
fn neighbor_link_ratio(graph: &AnalysisGraph, pos: usize) -> f64 {
    let neighbors = graph.neighbors(pos);
    let k = neighbors.len();
    if k < 2 {
        return 1.0;
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

/// Nodes whose neighbors are mostly unconnected to each other. The node is
/// reported with up to `max_size - 1` of its neighbors.
pub fn detect_bridges(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let mut found = Vec::new();
    for pos in 0..graph.node_count() {
        let neighbors = graph.neighbors(pos);
        if neighbors.len() < 2 {
            continue;
        }
        let ratio = neighbor_link_ratio(graph, pos);
        if ratio >= BRIDGE_LINK_RATIO {
            continue;
        }
        let kept = &neighbors[..neighbors.len().min(max_size.saturating_sub(1))];
        let edges = kept
            .iter()
            .filter_map(|&n| edge_between(graph, pos, n))
            .collect();
        let mut nodes = vec![pos];
        nodes.extend_from_slice(kept);
        found.push(Detection {
            pattern_type: PatternType::Bridge,
            nodes,
            edges,
            contexts: vec![format!("link_ratio:{ratio:.2}")],
        });
    }
    found
}

// ============================================================================
// Cluster
// ============================================================================

/// Linked unordered pairs among `members`.
fn internal_links(graph: &AnalysisGraph, members: &[usize]) -> usize {
    let mut links = 0;
    for (i, &a) in members.iter().enumerate() {
        for &b in &members[i + 1..] {
            if graph.adjacent(a, b) {
                links += 1;
            }
        }
    }
    links
}

fn density(links: usize, size: usize) -> f64 {
    if size < 2 {
        return 0.0;
    }
    links as f64 / (size * (size - 1) / 2) as f64
}

/// Greedy densest-first groups.
///
/// Seeds are taken in descending degree order. A group absorbs the
/// unclaimed neighbor with the highest connection density, its links into
/// the group divided by the group size (higher degree breaks ties). Growth
/// stops once that density is no longer above the threshold or the size
/// cap is reached. Groups of three or more nodes are reported and their
/// members claimed.
pub fn detect_clusters(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let n = graph.node_count();
    let mut seeds: Vec<usize> = (0..n).collect();
    // Stable: equal degrees keep insertion order
    seeds.sort_by_key(|&pos| std::cmp::Reverse(graph.degree(pos)));

    let mut claimed = vec![false; n];
    let mut found = Vec::new();

    for seed in seeds {
        if claimed[seed] || graph.neighbors(seed).is_empty() {
            continue;
        }
        let mut members = vec![seed];
        let mut in_group: HashSet<usize> = HashSet::from([seed]);

        while members.len() < max_size {
            // (candidate, links into the group, degree)
            let mut best: Option<(usize, usize, usize)> = None;
            for &member in &members {
                for &candidate in graph.neighbors(member) {
                    if in_group.contains(&candidate) || claimed[candidate] {
                        continue;
                    }
                    let ties = members
                        .iter()
                        .filter(|&&m| graph.adjacent(m, candidate))
                        .count();
                    let degree = graph.degree(candidate);
                    if best.map_or(true, |(_, t, d)| (ties, degree) > (t, d)) {
                        best = Some((candidate, ties, degree));
                    }
                }
            }
            let Some((candidate, ties, _)) = best else {
                break;
            };
            if ties as f64 / members.len() as f64 <= CLUSTER_DENSITY_THRESHOLD {
                break;
            }
            members.push(candidate);
            in_group.insert(candidate);
        }

        if members.len() < MIN_STRUCTURE_NODES {
            continue;
        }
        for &m in &members {
            claimed[m] = true;
        }
        let edges = graph
            .graph
            .edge_indices()
            .filter(|&e| {
                let (s, t) = graph.endpoints(e);
                s != t && in_group.contains(&s) && in_group.contains(&t)
            })
            .collect();
        let final_density = density(internal_links(graph, &members), members.len());
        found.push(Detection {
            pattern_type: PatternType::Cluster,
            nodes: members,
            edges,
            contexts: vec![format!("density:{final_density:.2}")],
        });
    }
    found
}

// ============================================================================
// Hub
// ============================================================================

/// Degree a node needs to count as a hub in a graph of `node_count` nodes.
pub fn hub_degree_threshold(node_count: usize) -> usize {
    let fraction = (HUB_DEGREE_FRACTION * node_count as f64).ceil() as usize;
    HUB_MIN_DEGREE.max(fraction)
}

/// Nodes whose total degree reaches `max(3, 5% of the node count)`,
/// reported with up to `max_size - 1` distinct neighbors.
pub fn detect_hubs(graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    let threshold = hub_degree_threshold(graph.node_count());
    let mut found = Vec::new();
    for pos in 0..graph.node_count() {
        let degree = graph.degree(pos);
        if degree < threshold {
            continue;
        }
        let neighbors = graph.neighbors(pos);
        let kept = &neighbors[..neighbors.len().min(max_size.saturating_sub(1))];
        let edges = kept
            .iter()
            .filter_map(|&n| edge_between(graph, pos, n))
            .collect();
        let mut nodes = vec![pos];
        nodes.extend_from_slice(kept);
        found.push(Detection {
            pattern_type: PatternType::Hub,
            nodes,
            edges,
            contexts: vec![format!("degree:{degree}")],
        });
    }
    found
}

/// Run the detector of one family.
pub fn detect(pattern_type: PatternType, graph: &AnalysisGraph, max_size: usize) -> Vec<Detection> {
    match pattern_type {
        PatternType::Star => detect_stars(graph, max_size),
        PatternType::Chain => detect_chains(graph, max_size),
        PatternType::Cycle => detect_cycles(graph, max_size),
        PatternType::Tree => detect_trees(graph, max_size),
        PatternType::Bridge => detect_bridges(graph, max_size),
        PatternType::Cluster => detect_clusters(graph, max_size),
        PatternType::Hub => detect_hubs(graph, max_size),
    }
}

// ============================================================================
// Tests
// ============================================================================
