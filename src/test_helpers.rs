//! Test fixture factories.
//!
//! Small graphs with sensible defaults: nodes are `concept` nodes whose
//! content is their id, edges are `links` edges of full strength.
#![allow(dead_code)]

use serde_json::json;

use crate::graph::{AnalysisGraph, GraphStore, KnowledgeEdge, KnowledgeNode};

// ============================================================================
// Records
// ============================================================================

pub fn node(id: &str) -> KnowledgeNode {
    KnowledgeNode::new(id, "concept", json!(id))
}

pub fn edge(from: &str, to: &str) -> KnowledgeEdge {
    KnowledgeEdge::new(from, to, "links")
}

// ============================================================================
// Stores
// ============================================================================

pub fn store_with_nodes(ids: &[&str]) -> GraphStore {
    let mut store = GraphStore::new();
    for id in ids {
        store.add_node(node(id)).expect("fixture node");
    }
    store
}

pub fn store_with_edges(ids: &[&str], pairs: &[(&str, &str)]) -> GraphStore {
    let mut store = store_with_nodes(ids);
    for (from, to) in pairs {
        store.add_edge(edge(from, to)).expect("fixture edge");
    }
    store
}

/// Two disjoint directed triangles: a → b → c → a and x → y → z → x.
pub fn two_triangles() -> GraphStore {
    store_with_edges(
        &["a", "b", "c", "x", "y", "z"],
        &[
            ("a", "b"),
            ("b", "c"),
            ("c", "a"),
            ("x", "y"),
            ("y", "z"),
            ("z", "x"),
        ],
    )
}

// ============================================================================
// Analysis snapshots
// ============================================================================

pub fn analysis_graph(ids: &[&str], pairs: &[(&str, &str)]) -> AnalysisGraph {
    let nodes: Vec<KnowledgeNode> = ids.iter().map(|id| node(id)).collect();
    let edges: Vec<KnowledgeEdge> = pairs.iter().map(|(f, t)| edge(f, t)).collect();
    AnalysisGraph::build(&nodes, &edges)
}

/// Ids `n0..n{len-1}`.
pub fn chain_ids(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("n{i}")).collect()
}

/// A center with `leaves` outgoing edges to `{center}_leaf_{i}`.
/// Returns (ids with the center first, edge pairs).
pub fn star_edges(center: &str, leaves: usize) -> (Vec<String>, Vec<(String, String)>) {
    let mut ids = vec![center.to_string()];
    let mut edges = Vec::with_capacity(leaves);
    for i in 0..leaves {
        let leaf = format!("{center}_leaf_{i}");
        edges.push((center.to_string(), leaf.clone()));
        ids.push(leaf);
    }
    (ids, edges)
}
