//! Traversal primitives over the store: path enumeration, shortest path,
//! subgraph expansion, connected components.
//!
//! Depth arguments outside the configured bounds fall back to the
//! configured default depth instead of failing.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::warn;

use crate::metrics::algorithms::connected_components;

use super::models::{EdgeDirection, SubgraphEntry};
use super::store::GraphStore;

/// Default depth for path enumeration and subgraph expansion.
pub const DEFAULT_TRAVERSAL_DEPTH: usize = 5;
/// Largest depth a caller may request.
pub const MAX_TRAVERSAL_DEPTH: usize = 10;

/// One DFS frame. Each frame owns its path and visited set, so popping a
/// frame is the backtrack.
struct PathFrame {
    node: String,
    path: Vec<String>,
    visited: HashSet<String>,
}

impl GraphStore {
    fn resolve_depth(&self, requested: usize, min: usize, operation: &'static str) -> usize {
        let traversal = &self.config().traversal;
        if requested < min || requested > traversal.max_depth {
            warn!(
                operation,
                requested,
                fallback = traversal.default_depth,
                "Traversal depth out of bounds, using default"
            );
            traversal.default_depth
        } else {
            requested
        }
    }

    /// Enumerate every simple directed path from `from` to `to` containing
    /// at most `max_depth` nodes.
    ///
    /// Unknown endpoints yield no paths. `from == to` yields `[[from]]`.
    pub fn find_paths(&self, from: &str, to: &str, max_depth: usize) -> Vec<Vec<String>> {
        if !self.has_node(from) || !self.has_node(to) {
            return vec![];
        }
        if from == to {
            return vec![vec![from.to_string()]];
        }
        let max_nodes = self.resolve_depth(max_depth, 1, "find_paths");

        let mut paths = Vec::new();
        let mut stack = vec![PathFrame {
            node: from.to_string(),
            path: vec![from.to_string()],
            visited: HashSet::from([from.to_string()]),
        }];

        while let Some(frame) = stack.pop() {
            if frame.node == to {
                paths.push(frame.path);
                continue;
            }
            if frame.path.len() >= max_nodes {
                continue;
            }
            // Reversed so the first successor is explored first
            for next in self
                .get_neighbors(&frame.node, EdgeDirection::Out)
                .into_iter()
                .rev()
            {
                if frame.visited.contains(&next) {
                    continue;
                }
                let mut visited = frame.visited.clone();
                visited.insert(next.clone());
                let mut path = frame.path.clone();
                path.push(next.clone());
                stack.push(PathFrame {
                    node: next,
                    path,
                    visited,
                });
            }
        }

        paths
    }

    /// Breadth-first shortest directed path. Empty when unreachable.
    pub fn find_shortest_path(&self, from: &str, to: &str) -> Vec<String> {
        if !self.has_node(from) || !self.has_node(to) {
            return vec![];
        }
        if from == to {
            return vec![from.to_string()];
        }

        let mut parent: HashMap<String, String> = HashMap::new();
        let mut seen = HashSet::from([from.to_string()]);
        let mut queue = VecDeque::from([from.to_string()]);

        while let Some(current) = queue.pop_front() {
            for next in self.get_neighbors(&current, EdgeDirection::Out) {
                if !seen.insert(next.clone()) {
                    continue;
                }
                parent.insert(next.clone(), current.clone());
                if next == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(prev) = parent.get(cursor) {
                        path.push(prev.clone());
                        cursor = prev.as_str();
                    }
                    path.reverse();
                    return path;
                }
                queue.push_back(next);
            }
        }

        vec![]
    }

    /// Expand `depth` hops from `node_id` along edges in both directions.
    ///
    /// Each visited node contributes one entry holding its full edge list.
    pub fn get_subgraph(&self, node_id: &str, depth: usize) -> Vec<SubgraphEntry> {
        let Some(root) = self.get_node(node_id) else {
            return vec![];
        };
        let depth = self.resolve_depth(depth, 0, "get_subgraph");

        let mut entries = Vec::new();
        let mut seen = HashSet::from([root.id.clone()]);
        let mut queue = VecDeque::from([(root, 0usize)]);

        while let Some((node, hops)) = queue.pop_front() {
            if hops < depth {
                for neighbor in self.get_neighbors(&node.id, EdgeDirection::Both) {
                    if seen.insert(neighbor.clone()) {
                        if let Some(next) = self.get_node(&neighbor) {
                            queue.push_back((next, hops + 1));
                        }
                    }
                }
            }
            let edges = self.get_node_edges(&node.id, EdgeDirection::Both);
            entries.push(SubgraphEntry {
                node,
                edges,
                depth: hops,
            });
        }

        entries
    }

    /// Partition all node ids by undirected reachability.
    ///
    /// Components appear in order of their first node; members keep store
    /// insertion order.
    pub fn get_connected_components(&self) -> Vec<Vec<String>> {
        let graph = self.analysis_graph();
        connected_components(&graph)
            .into_iter()
            .map(|members| {
                members
                    .into_iter()
                    .map(|pos| graph.node_id(pos).to_string())
                    .collect()
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
