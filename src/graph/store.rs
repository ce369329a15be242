//! In-memory knowledge graph store.
//!
//! Nodes live in an arena keyed by id; edges live in a second arena keyed by
//! a synthetic `from,to,type,sequence` key. Two adjacency maps (outgoing and
//! incoming) index node id → edge keys. Nodes never hold references to
//! edges, so there are no ownership cycles.
//!
//! Every record handed out is a clone. Mutating a returned node or edge never
//! touches the store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{GraphError, Result};
use crate::events::{EventEmitter, GraphEntity};
use crate::metrics::{
    CentralNode, CentralityType, GraphMetrics, MetricsEngine, NodeMetrics, StructuralAnalysis,
    StructuralImportance,
};
use crate::patterns::{GraphPattern, MiningConfig, PatternMiner};
use crate::EngineConfig;

use super::extraction::AnalysisGraph;
use super::models::{
    clamp_strength, is_valid_label, EdgeDirection, KnowledgeEdge, KnowledgeNode, NodeUpdate,
};

#[derive(Debug, Clone)]
struct NodeEntry {
    seq: u64,
    node: KnowledgeNode,
}

#[derive(Debug, Clone)]
struct EdgeEntry {
    seq: u64,
    edge: KnowledgeEdge,
}

/// Owner of all nodes and edges.
///
/// Single-threaded by construction: every method runs to completion on the
/// caller's thread. Hosts sharing a store across threads must wrap it in a
/// single lock.
#[derive(Clone, Default)]
pub struct GraphStore {
    nodes: HashMap<String, NodeEntry>,
    edges: HashMap<String, EdgeEntry>,
    /// node id → keys of edges leaving it, in insertion order
    outgoing: HashMap<String, Vec<String>>,
    /// node id → keys of edges entering it, in insertion order
    incoming: HashMap<String, Vec<String>>,
    next_node_seq: u64,
    next_edge_seq: u64,
    config: EngineConfig,
    event_emitter: Option<Arc<dyn EventEmitter>>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("has_event_emitter", &self.event_emitter.is_some())
            .finish()
    }
}

impl GraphStore {
    /// Create an empty store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store using the given analytics configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config: config.sanitized(),
            ..Self::default()
        }
    }

    /// Attach an event sink (builder pattern).
    pub fn with_event_emitter(mut self, emitter: Arc<dyn EventEmitter>) -> Self {
        self.event_emitter = Some(emitter);
        self
    }

    pub fn set_event_emitter(&mut self, emitter: Option<Arc<dyn EventEmitter>>) {
        self.event_emitter = emitter;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config.sanitized();
    }

    fn emitter(&self) -> Option<&dyn EventEmitter> {
        self.event_emitter.as_deref()
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Store a copy of `node` and return its id.
    pub fn add_node(&mut self, node: KnowledgeNode) -> Result<String> {
        node.validate()?;
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }

        let id = node.id.clone();
        let seq = self.next_node_seq;
        self.next_node_seq += 1;

        if let Some(emitter) = self.emitter() {
            emitter.emit_created(
                GraphEntity::Node,
                &id,
                serde_json::to_value(&node).unwrap_or_default(),
            );
        }
        self.nodes.insert(id.clone(), NodeEntry { seq, node });
        debug!(node_id = %id, "Node added");
        Ok(id)
    }

    /// Return a copy of the node, or `None` if it does not exist.
    pub fn get_node(&self, id: &str) -> Option<KnowledgeNode> {
        self.nodes.get(id).map(|entry| entry.node.clone())
    }

    pub fn has_node(&self, id: &str) -> bool {
        is_valid_label(id) && self.nodes.contains_key(id)
    }

    /// Merge `update` into an existing node.
    ///
    /// Returns `false` when the node is absent or the merged node would be
    /// invalid; the stored node is left untouched in both cases.
    pub fn update_node(&mut self, id: &str, update: NodeUpdate) -> bool {
        let Some(entry) = self.nodes.get(id) else {
            return false;
        };
        let mut merged = entry.node.clone();
        update.apply_to(&mut merged);
        if let Err(e) = merged.validate() {
            tracing::warn!(node_id = %id, error = %e, "Rejected node update");
            return false;
        }

        if let Some(emitter) = self.emitter() {
            emitter.emit_updated(
                GraphEntity::Node,
                id,
                serde_json::to_value(&merged).unwrap_or_default(),
            );
        }
        if let Some(entry) = self.nodes.get_mut(id) {
            entry.node = merged;
        }
        debug!(node_id = %id, "Node updated");
        true
    }

    /// Remove a node and every edge that starts or ends at it.
    pub fn delete_node(&mut self, id: &str) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }

        let mut incident: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for key in self
            .outgoing
            .get(id)
            .into_iter()
            .chain(self.incoming.get(id))
            .flatten()
        {
            if seen.insert(key.as_str()) {
                incident.push(key.clone());
            }
        }
        let cascaded = incident.len();
        for key in incident {
            self.remove_edge_by_key(&key);
        }

        self.outgoing.remove(id);
        self.incoming.remove(id);
        if let Some(entry) = self.nodes.remove(id) {
            if let Some(emitter) = self.emitter() {
                emitter.emit_deleted(
                    GraphEntity::Node,
                    id,
                    serde_json::to_value(&entry.node).unwrap_or_default(),
                );
            }
        }
        debug!(node_id = %id, cascaded_edges = cascaded, "Node deleted");
        true
    }

    /// All nodes in insertion order.
    pub fn get_all_nodes(&self) -> Vec<KnowledgeNode> {
        self.sorted_node_entries()
            .into_iter()
            .map(|entry| entry.node.clone())
            .collect()
    }

    /// All nodes of the given type, in insertion order.
    pub fn get_nodes_by_type(&self, node_type: &str) -> Vec<KnowledgeNode> {
        self.sorted_node_entries()
            .into_iter()
            .filter(|entry| entry.node.node_type == node_type)
            .map(|entry| entry.node.clone())
            .collect()
    }

    /// All node ids in insertion order.
    pub fn node_ids(&self) -> Vec<String> {
        self.sorted_node_entries()
            .into_iter()
            .map(|entry| entry.node.id.clone())
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn sorted_node_entries(&self) -> Vec<&NodeEntry> {
        let mut entries: Vec<&NodeEntry> = self.nodes.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Store a copy of `edge` and return its synthetic key.
    ///
    /// The key has the form `from,to,type,sequence`; the sequence makes
    /// repeated edges of the same type distinguishable. `strength` is clamped
    /// into `[0, 1]`.
    pub fn add_edge(&mut self, mut edge: KnowledgeEdge) -> Result<String> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.has_node(endpoint) {
                return Err(GraphError::NodeNotFound(endpoint.clone()));
            }
        }
        if !is_valid_label(&edge.edge_type) {
            return Err(GraphError::InvalidEdge(format!(
                "edge {} -> {} has an empty type",
                edge.from, edge.to
            )));
        }
        edge.strength = clamp_strength(edge.strength);

        let seq = self.next_edge_seq;
        self.next_edge_seq += 1;
        let key = format!("{},{},{},{}", edge.from, edge.to, edge.edge_type, seq);

        self.outgoing
            .entry(edge.from.clone())
            .or_default()
            .push(key.clone());
        self.incoming
            .entry(edge.to.clone())
            .or_default()
            .push(key.clone());

        if let Some(emitter) = self.emitter() {
            emitter.emit_created(
                GraphEntity::Edge,
                &key,
                serde_json::to_value(&edge).unwrap_or_default(),
            );
        }
        self.edges.insert(key.clone(), EdgeEntry { seq, edge });
        debug!(edge_key = %key, "Edge added");
        Ok(key)
    }

    /// First edge (in insertion order) matching `from → to` and, if given,
    /// `edge_type`.
    pub fn get_edge(&self, from: &str, to: &str, edge_type: Option<&str>) -> Option<KnowledgeEdge> {
        self.matching_edge_keys(from, to, edge_type)
            .first()
            .and_then(|key| self.get_edge_by_key(key))
    }

    /// Every edge matching `from → to` and, if given, `edge_type`.
    pub fn get_edges(&self, from: &str, to: &str, edge_type: Option<&str>) -> Vec<KnowledgeEdge> {
        self.matching_edge_keys(from, to, edge_type)
            .iter()
            .filter_map(|key| self.get_edge_by_key(key))
            .collect()
    }

    pub fn get_edge_by_key(&self, key: &str) -> Option<KnowledgeEdge> {
        self.edges.get(key).map(|entry| entry.edge.clone())
    }

    pub fn has_edge(&self, from: &str, to: &str, edge_type: Option<&str>) -> bool {
        !self.matching_edge_keys(from, to, edge_type).is_empty()
    }

    /// Delete every edge matching `from → to` (and `edge_type` when given).
    ///
    /// Returns `true` if at least one edge was removed.
    pub fn delete_edge(&mut self, from: &str, to: &str, edge_type: Option<&str>) -> bool {
        let keys = self.matching_edge_keys(from, to, edge_type);
        if keys.is_empty() {
            return false;
        }
        for key in &keys {
            self.remove_edge_by_key(key);
        }
        debug!(from, to, edge_type = ?edge_type, removed = keys.len(), "Edges deleted");
        true
    }

    /// Edges incident to `node_id`. A self-loop is reported once even for
    /// `EdgeDirection::Both`.
    pub fn get_node_edges(&self, node_id: &str, direction: EdgeDirection) -> Vec<KnowledgeEdge> {
        self.incident_keys(node_id, direction)
            .iter()
            .filter_map(|key| self.get_edge_by_key(key))
            .collect()
    }

    /// Distinct neighbor ids of `node_id` in edge insertion order.
    pub fn get_neighbors(&self, node_id: &str, direction: EdgeDirection) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();
        for key in self.incident_keys(node_id, direction) {
            let Some(entry) = self.edges.get(&key) else {
                continue;
            };
            let other = if entry.edge.from == node_id {
                &entry.edge.to
            } else {
                &entry.edge.from
            };
            if seen.insert(other.clone()) {
                neighbors.push(other.clone());
            }
        }
        neighbors
    }

    /// All edges in insertion order.
    pub fn get_all_edges(&self) -> Vec<KnowledgeEdge> {
        let mut entries: Vec<&EdgeEntry> = self.edges.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries.into_iter().map(|entry| entry.edge.clone()).collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Remove everything. No events are emitted.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        debug!("Graph cleared");
    }

    /// Swap in the records of `other`, keeping this store's emitter and config.
    pub(crate) fn replace_contents(&mut self, other: GraphStore) {
        self.nodes = other.nodes;
        self.edges = other.edges;
        self.outgoing = other.outgoing;
        self.incoming = other.incoming;
        self.next_node_seq = other.next_node_seq;
        self.next_edge_seq = other.next_edge_seq;
    }

    fn matching_edge_keys(&self, from: &str, to: &str, edge_type: Option<&str>) -> Vec<String> {
        self.outgoing
            .get(from)
            .into_iter()
            .flatten()
            .filter(|key| {
                self.edges
                    .get(*key)
                    .is_some_and(|entry| entry.edge.matches(from, to, edge_type))
            })
            .cloned()
            .collect()
    }

    fn incident_keys(&self, node_id: &str, direction: EdgeDirection) -> Vec<String> {
        let out = self.outgoing.get(node_id).into_iter().flatten();
        let inc = self.incoming.get(node_id).into_iter().flatten();
        match direction {
            EdgeDirection::Out => out.cloned().collect(),
            EdgeDirection::In => inc.cloned().collect(),
            EdgeDirection::Both => {
                // A self-loop sits in both lists under the same key
                let mut seen = HashSet::new();
                out.chain(inc)
                    .filter(|key| seen.insert(key.as_str()))
                    .cloned()
                    .collect()
            }
        }
    }

    fn remove_edge_by_key(&mut self, key: &str) -> Option<KnowledgeEdge> {
        let entry = self.edges.remove(key)?;
        if let Some(keys) = self.outgoing.get_mut(&entry.edge.from) {
            keys.retain(|k| k != key);
        }
        if let Some(keys) = self.incoming.get_mut(&entry.edge.to) {
            keys.retain(|k| k != key);
        }
        if let Some(emitter) = self.emitter() {
            emitter.emit_deleted(
                GraphEntity::Edge,
                key,
                serde_json::to_value(&entry.edge).unwrap_or(Value::Null),
            );
        }
        Some(entry.edge)
    }

    // ========================================================================
    // Analysis dispatch
    // ========================================================================

    /// Extract a read-only analysis snapshot of the current graph.
    pub fn analysis_graph(&self) -> AnalysisGraph {
        AnalysisGraph::build(&self.get_all_nodes(), &self.get_all_edges())
    }

    /// Build a metrics engine over a fresh snapshot.
    pub fn metrics_engine(&self) -> MetricsEngine {
        MetricsEngine::new(self.analysis_graph(), self.config.metrics.clone())
    }

    pub fn calculate_graph_metrics(&self) -> GraphMetrics {
        self.metrics_engine().calculate_graph_metrics()
    }

    pub fn calculate_node_metrics(&self, node_id: &str) -> Option<NodeMetrics> {
        self.metrics_engine().calculate_node_metrics(node_id)
    }

    pub fn calculate_all_node_metrics(&self) -> Vec<NodeMetrics> {
        self.metrics_engine().calculate_all_node_metrics()
    }

    pub fn find_central_nodes(&self, count: usize, centrality: CentralityType) -> Vec<CentralNode> {
        self.metrics_engine().find_central_nodes(count, centrality)
    }

    pub fn analyze_structure(&self) -> StructuralAnalysis {
        self.metrics_engine().analyze_structure()
    }

    pub fn detect_structural_importance(&self) -> StructuralImportance {
        self.metrics_engine().detect_structural_importance()
    }

    /// Mine structural patterns with the store's configured miner settings.
    pub fn mine_patterns(&self) -> Vec<GraphPattern> {
        self.mine_patterns_with(&self.config.mining)
    }

    pub fn mine_patterns_with(&self, config: &MiningConfig) -> Vec<GraphPattern> {
        PatternMiner::new(config.clone()).mine(&self.analysis_graph())
    }
}

// ============================================================================
// Tests
// ============================================================================
