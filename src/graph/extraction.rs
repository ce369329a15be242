//! Store → petgraph extraction.
//!
//! Converts the nodes and edges held by `GraphStore` into an immutable
//! `petgraph::DiGraph` snapshot consumed by the metrics engine and the
//! pattern miner. The snapshot is built at the start of each analysis call
//! and never observes later mutations.
//!
//! Besides the graph itself, the snapshot precomputes insertion-ordered
//! adjacency lists so every algorithm walks neighbors in the same
//! deterministic order:
//! - **outgoing / incoming**: one entry per edge (multi-edges repeat)
//! - **successors / predecessors**: distinct neighbors per direction
//! - **neighbors**: distinct undirected neighbors, self excluded

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use super::models::{KnowledgeEdge, KnowledgeNode};

/// Node payload inside the analysis snapshot.
#[derive(Debug, Clone)]
pub struct AnalysisNode {
    pub id: String,
    pub node_type: String,
}

/// Edge payload inside the analysis snapshot.
#[derive(Debug, Clone)]
pub struct AnalysisEdge {
    pub edge_type: String,
    pub strength: f64,
}

/// Read-only graph snapshot with dense `usize` node positions.
///
/// Node positions follow store insertion order, so `index(i)` of the
/// underlying petgraph graph is the i-th node the store enumerated.
#[derive(Debug, Clone, Default)]
pub struct AnalysisGraph {
    pub graph: DiGraph<AnalysisNode, AnalysisEdge>,
    pub id_to_index: HashMap<String, NodeIndex>,
    outgoing: Vec<Vec<EdgeIndex>>,
    incoming: Vec<Vec<EdgeIndex>>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    neighbors: Vec<Vec<usize>>,
    neighbor_sets: Vec<HashSet<usize>>,
}

impl AnalysisGraph {
    /// Build a snapshot from node and edge lists.
    ///
    /// Edges whose endpoints are not in `nodes` are skipped.
    pub fn build(nodes: &[KnowledgeNode], edges: &[KnowledgeEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut id_to_index = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if id_to_index.contains_key(&node.id) {
                continue;
            }
            let idx = graph.add_node(AnalysisNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
            });
            id_to_index.insert(node.id.clone(), idx);
        }

        for edge in edges {
            let (Some(&from), Some(&to)) = (id_to_index.get(&edge.from), id_to_index.get(&edge.to))
            else {
                continue;
            };
            graph.add_edge(
                from,
                to,
                AnalysisEdge {
                    edge_type: edge.edge_type.clone(),
                    strength: edge.strength,
                },
            );
        }

        let n = graph.node_count();
        let mut outgoing = vec![Vec::new(); n];
        let mut incoming = vec![Vec::new(); n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut neighbor_sets: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        let mut succ_seen: Vec<HashSet<usize>> = vec![HashSet::new(); n];
        let mut pred_seen: Vec<HashSet<usize>> = vec![HashSet::new(); n];

        // edge_references() walks edges in index (= insertion) order
        for edge in graph.edge_references() {
            let s = edge.source().index();
            let t = edge.target().index();
            outgoing[s].push(edge.id());
            incoming[t].push(edge.id());
            if succ_seen[s].insert(t) {
                successors[s].push(t);
            }
            if pred_seen[t].insert(s) {
                predecessors[t].push(s);
            }
            if s != t {
                if neighbor_sets[s].insert(t) {
                    neighbors[s].push(t);
                }
                if neighbor_sets[t].insert(s) {
                    neighbors[t].push(s);
                }
            }
        }

        Self {
            graph,
            id_to_index,
            outgoing,
            incoming,
            successors,
            predecessors,
            neighbors,
            neighbor_sets,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Position of a node id, if present.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).map(|idx| idx.index())
    }

    pub fn node_id(&self, pos: usize) -> &str {
        &self.graph[NodeIndex::new(pos)].id
    }

    pub fn node_type(&self, pos: usize) -> &str {
        &self.graph[NodeIndex::new(pos)].node_type
    }

    /// Node ids in snapshot order.
    pub fn node_ids(&self) -> Vec<String> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Edges leaving `pos`, one entry per edge.
    pub fn out_edges(&self, pos: usize) -> &[EdgeIndex] {
        &self.outgoing[pos]
    }

    /// Edges entering `pos`, one entry per edge.
    pub fn in_edges(&self, pos: usize) -> &[EdgeIndex] {
        &self.incoming[pos]
    }

    pub fn out_degree(&self, pos: usize) -> usize {
        self.outgoing[pos].len()
    }

    pub fn in_degree(&self, pos: usize) -> usize {
        self.incoming[pos].len()
    }

    /// Total degree: multi-edges count individually, a self-loop counts twice.
    pub fn degree(&self, pos: usize) -> usize {
        self.outgoing[pos].len() + self.incoming[pos].len()
    }

    /// Distinct targets of `pos`'s outgoing edges (may include `pos`).
    pub fn successors(&self, pos: usize) -> &[usize] {
        &self.successors[pos]
    }

    /// Distinct sources of `pos`'s incoming edges (may include `pos`).
    pub fn predecessors(&self, pos: usize) -> &[usize] {
        &self.predecessors[pos]
    }

    /// Distinct undirected neighbors of `pos`, excluding `pos` itself.
    pub fn neighbors(&self, pos: usize) -> &[usize] {
        &self.neighbors[pos]
    }

    /// Whether `a` and `b` share at least one edge in either direction.
    pub fn adjacent(&self, a: usize, b: usize) -> bool {
        self.neighbor_sets[a].contains(&b)
    }

    /// `(source, target)` positions of an edge.
    pub fn endpoints(&self, edge: EdgeIndex) -> (usize, usize) {
        self.graph
            .edge_endpoints(edge)
            .map(|(s, t)| (s.index(), t.index()))
            .unwrap_or((0, 0))
    }

    pub fn edge(&self, edge: EdgeIndex) -> &AnalysisEdge {
        &self.graph[edge]
    }

    /// Edges from `from` to `to`, in insertion order.
    pub fn edges_between(&self, from: usize, to: usize) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.outgoing[from]
            .iter()
            .copied()
            .filter(move |&e| self.endpoints(e).1 == to)
    }
}

// ============================================================================
// Tests
// ============================================================================
