//! Snapshot import/export.
//!
//! A snapshot is the full node and edge set plus metadata whose counts must
//! match the arrays. Export always produces a consistent snapshot; import
//! checks the counts, validates every record into a scratch store and only
//! then swaps the scratch contents in, so a failed import leaves the store
//! untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GraphError, Result};

use super::models::{KnowledgeEdge, KnowledgeNode};
use super::store::GraphStore;

/// Format version written into exported snapshots.
pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub version: String,
    pub created: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Serializable image of a whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<KnowledgeNode>,
    pub edges: Vec<KnowledgeEdge>,
    pub metadata: SnapshotMetadata,
}

impl GraphSnapshot {
    /// Build a snapshot whose metadata matches the given records.
    pub fn new(nodes: Vec<KnowledgeNode>, edges: Vec<KnowledgeEdge>) -> Self {
        let metadata = SnapshotMetadata {
            version: SNAPSHOT_VERSION.to_string(),
            created: Utc::now(),
            node_count: nodes.len(),
            edge_count: edges.len(),
        };
        Self {
            nodes,
            edges,
            metadata,
        }
    }

    /// Check the declared counts against the arrays.
    pub fn verify(&self) -> Result<()> {
        if self.metadata.node_count != self.nodes.len() {
            return Err(GraphError::SnapshotMismatch {
                kind: "nodes",
                declared: self.metadata.node_count,
                actual: self.nodes.len(),
            });
        }
        if self.metadata.edge_count != self.edges.len() {
            return Err(GraphError::SnapshotMismatch {
                kind: "edges",
                declared: self.metadata.edge_count,
                actual: self.edges.len(),
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GraphStore {
    /// Capture every node and edge, in insertion order.
    pub fn export_snapshot(&self) -> Result<GraphSnapshot> {
        let snapshot = GraphSnapshot::new(self.get_all_nodes(), self.get_all_edges());
        snapshot.verify()?;
        debug!(
            node_count = snapshot.metadata.node_count,
            edge_count = snapshot.metadata.edge_count,
            "Snapshot exported"
        );
        Ok(snapshot)
    }

    /// Replace the store contents with `snapshot`.
    ///
    /// All-or-nothing: any count mismatch, invalid node, duplicate id or
    /// dangling edge aborts the import before the store changes. No change
    /// events are emitted for imported records.
    pub fn import_snapshot(&mut self, snapshot: GraphSnapshot) -> Result<()> {
        snapshot.verify()?;

        let mut scratch = GraphStore::new();
        for node in snapshot.nodes {
            scratch.add_node(node)?;
        }
        for edge in snapshot.edges {
            scratch.add_edge(edge)?;
        }

        info!(
            node_count = scratch.node_count(),
            edge_count = scratch.edge_count(),
            "Snapshot imported"
        );
        self.replace_contents(scratch);
        Ok(())
    }

    /// Export straight to a JSON string.
    pub fn export_json(&self) -> Result<String> {
        self.export_snapshot()?.to_json()
    }

    /// Import from a JSON string produced by [`GraphStore::export_json`].
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        self.import_snapshot(GraphSnapshot::from_json(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::test_helpers::{edge, node, store_with_edges};
    use serde_json::json;
    use std::sync::Arc;

    fn sample() -> GraphStore {
        let mut store = store_with_edges(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
        store.add_edge(edge("a", "b").with_strength(0.4)).unwrap();
        store.add_edge(edge("c", "c")).unwrap();
        store
    }

    #[test]
    fn test_export_metadata_matches() {
        let snapshot = sample().export_snapshot().unwrap();
        assert_eq!(snapshot.metadata.node_count, 3);
        assert_eq!(snapshot.metadata.edge_count, 4);
        assert_eq!(snapshot.metadata.version, SNAPSHOT_VERSION);
    }

    #[test]
    fn test_metadata_serializes_camel_case() {
        let snapshot = sample().export_snapshot().unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["metadata"]["nodeCount"], json!(3));
        assert_eq!(value["metadata"]["edgeCount"], json!(4));
        assert_eq!(value["nodes"][0]["type"], json!("concept"));
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let original = sample();
        let json = original.export_json().unwrap();

        let mut restored = GraphStore::new();
        restored.import_json(&json).unwrap();

        assert_eq!(restored.get_all_nodes(), original.get_all_nodes());
        assert_eq!(restored.get_all_edges(), original.get_all_edges());
        assert_eq!(restored.get_edges("a", "b", Some("links")).len(), 2);
    }

    #[test]
    fn test_import_rejects_count_mismatch() {
        let mut snapshot = sample().export_snapshot().unwrap();
        snapshot.metadata.edge_count = 99;

        let mut target = store_with_edges(&["keep"], &[]);
        let err = target.import_snapshot(snapshot).unwrap_err();
        assert!(matches!(
            err,
            GraphError::SnapshotMismatch { kind: "edges", declared: 99, actual: 4 }
        ));
        assert!(target.has_node("keep"));
    }

    #[test]
    fn test_import_is_atomic_on_dangling_edge() {
        let mut snapshot = sample().export_snapshot().unwrap();
        snapshot.edges.push(edge("a", "ghost"));
        snapshot.metadata.edge_count += 1;

        let mut target = store_with_edges(&["keep"], &[]);
        let err = target.import_snapshot(snapshot).unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(id) if id == "ghost"));
        assert_eq!(target.node_ids(), vec!["keep"]);
    }

    #[test]
    fn test_import_rejects_duplicate_nodes() {
        let snapshot = GraphSnapshot::new(vec![node("a"), node("a")], vec![]);
        let mut target = GraphStore::new();
        assert!(matches!(
            target.import_snapshot(snapshot),
            Err(GraphError::DuplicateId(_))
        ));
        assert_eq!(target.node_count(), 0);
    }

    #[test]
    fn test_import_keeps_emitter_and_stays_silent() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let mut target = GraphStore::new().with_event_emitter(bus.clone());

        target
            .import_snapshot(sample().export_snapshot().unwrap())
            .unwrap();
        assert!(rx.try_recv().is_err());

        target.add_node(node("d")).unwrap();
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_import_continues_sequence_numbers() {
        let mut target = GraphStore::new();
        target
            .import_snapshot(sample().export_snapshot().unwrap())
            .unwrap();
        let key = target.add_edge(edge("a", "b")).unwrap();
        assert_eq!(target.get_edges("a", "b", None).len(), 3);
        assert!(target.get_edge_by_key(&key).is_some());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            GraphSnapshot::from_json("{not json"),
            Err(GraphError::Serialization(_))
        ));
    }
}
