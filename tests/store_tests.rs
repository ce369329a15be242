//! Store-level integration tests: CRUD invariants, traversal scenarios and
//! snapshot round-trips through the public API.

use knowledge_graph::events::{ChangeAction, EventBus, GraphEntity};
use knowledge_graph::{
    EdgeDirection, EngineConfig, GraphError, GraphStore, KnowledgeEdge, KnowledgeNode, NodeUpdate,
};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn concept(id: &str) -> KnowledgeNode {
    KnowledgeNode::new(id, "concept", json!(format!("about {id}")))
}

fn store(ids: &[&str], pairs: &[(&str, &str)]) -> GraphStore {
    let mut store = GraphStore::new();
    for id in ids {
        store.add_node(concept(id)).unwrap();
    }
    for (from, to) in pairs {
        store.add_edge(KnowledgeEdge::new(*from, *to, "relates")).unwrap();
    }
    store
}

// ============================================================================
// CRUD
// ============================================================================

#[test]
fn test_cascade_delete_leaves_no_dangling_edges() {
    let mut g = store(
        &["a", "b", "c"],
        &[("a", "b"), ("b", "c"), ("c", "b"), ("b", "b"), ("a", "c")],
    );
    assert!(g.delete_node("b"));
    assert!(!g.delete_node("b"));

    let edges = g.get_all_edges();
    assert_eq!(edges.len(), 1);
    assert!(edges.iter().all(|e| e.from != "b" && e.to != "b"));
    assert!(g.get_node_edges("b", EdgeDirection::Both).is_empty());
    assert_eq!(g.get_neighbors("a", EdgeDirection::Out), vec!["c"]);
}

#[test]
fn test_self_loop_reported_once() {
    let g = store(&["a"], &[("a", "a")]);
    assert_eq!(g.get_node_edges("a", EdgeDirection::Both).len(), 1);
    assert_eq!(g.get_node_edges("a", EdgeDirection::Out).len(), 1);
    assert_eq!(g.get_node_edges("a", EdgeDirection::In).len(), 1);
}

#[test]
fn test_edge_to_missing_endpoint_rejected() {
    let mut g = store(&["a"], &[]);
    let err = g.add_edge(KnowledgeEdge::new("a", "nowhere", "relates")).unwrap_err();
    assert!(matches!(err, GraphError::NodeNotFound(id) if id == "nowhere"));
    assert_eq!(g.edge_count(), 0);
}

#[test]
fn test_update_keeps_id_and_orders_timestamps() {
    let mut g = store(&["a"], &[]);
    assert!(g.update_node(
        "a",
        NodeUpdate {
            content: Some(json!("revised")),
            ..Default::default()
        }
    ));
    let node = g.get_node("a").unwrap();
    assert_eq!(node.id, "a");
    assert_eq!(node.content, json!("revised"));
    assert!(node.modified >= node.created);
    assert!(!g.update_node("ghost", NodeUpdate::default()));
}

#[test]
fn test_mutations_are_broadcast() {
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let mut g = GraphStore::new().with_event_emitter(bus.clone());

    g.add_node(concept("a")).unwrap();
    g.add_node(concept("b")).unwrap();
    g.add_edge(KnowledgeEdge::new("a", "b", "relates")).unwrap();
    g.delete_node("a");

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push((event.entity, event.action));
    }
    assert_eq!(
        seen,
        vec![
            (GraphEntity::Node, ChangeAction::Created),
            (GraphEntity::Node, ChangeAction::Created),
            (GraphEntity::Edge, ChangeAction::Created),
            (GraphEntity::Edge, ChangeAction::Deleted),
            (GraphEntity::Node, ChangeAction::Deleted),
        ]
    );
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_shortest_path_to_self_and_unreachable() {
    let g = store(&["x", "y", "z"], &[("x", "y")]);
    assert_eq!(g.find_shortest_path("x", "x"), vec!["x"]);
    assert_eq!(g.find_shortest_path("x", "y"), vec!["x", "y"]);
    assert!(g.find_shortest_path("y", "x").is_empty());
    assert!(g.find_shortest_path("x", "z").is_empty());
    assert!(g.find_shortest_path("x", "ghost").is_empty());
}

#[test]
fn test_out_of_range_depth_uses_configured_default() {
    let ids: Vec<String> = (0..12).map(|i| format!("n{i}")).collect();
    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let pairs: Vec<(&str, &str)> = refs.windows(2).map(|w| (w[0], w[1])).collect();
    let g = store(&refs, &pairs);

    // 50 falls back to 5 nodes per path
    assert!(g.find_paths("n0", "n5", 50).is_empty());
    assert_eq!(g.find_paths("n0", "n4", 50).len(), 1);

    let mut config = EngineConfig::default();
    config.traversal.default_depth = 3;
    let mut g = g;
    g.set_config(config);
    assert!(g.find_paths("n0", "n3", 0).is_empty());
    assert_eq!(g.find_paths("n0", "n2", 0).len(), 1);
}

#[test]
fn test_subgraph_depth_zero_is_root_only() {
    let g = store(&["a", "b"], &[("a", "b")]);
    let entries = g.get_subgraph("a", 0);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].node.id, "a");
    assert_eq!(entries[0].depth, 0);
    assert_eq!(entries[0].edges.len(), 1);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_round_trip_preserves_everything() {
    let mut g = store(&["a", "b", "c"], &[("a", "b"), ("a", "b"), ("c", "c")]);
    g.add_edge(KnowledgeEdge::new("b", "c", "cites").with_strength(0.25))
        .unwrap();
    let mut meta = serde_json::Map::new();
    meta.insert("lang".into(), json!("en"));
    g.add_node(KnowledgeNode::new("d", "doc", json!({"title": "T"})).with_metadata(meta))
        .unwrap();

    let json = g.export_json().unwrap();
    let mut restored = GraphStore::new();
    restored.import_json(&json).unwrap();

    assert_eq!(restored.get_all_nodes(), g.get_all_nodes());
    assert_eq!(restored.get_all_edges(), g.get_all_edges());
    assert_eq!(restored.get_edges("a", "b", None).len(), 2);
}

#[test]
fn test_import_of_garbage_keeps_store() {
    let mut g = store(&["keep"], &[]);
    let err = g.import_json("{ not json").unwrap_err();
    assert!(matches!(err, GraphError::Serialization(_)));
    assert!(g.has_node("keep"));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_strength_always_clamped(strength in -10.0f64..10.0) {
        let mut g = store(&["a", "b"], &[]);
        g.add_edge(KnowledgeEdge::new("a", "b", "w").with_strength(strength)).unwrap();
        let stored = g.get_edge("a", "b", Some("w")).unwrap();
        prop_assert!((0.0..=1.0).contains(&stored.strength));
    }

    #[test]
    fn prop_round_trip_random_graph(
        n in 1usize..8,
        pairs in prop::collection::vec((0usize..8, 0usize..8), 0..20),
    ) {
        let ids: Vec<String> = (0..n).map(|i| format!("v{i}")).collect();
        let mut g = GraphStore::new();
        for id in &ids {
            g.add_node(concept(id)).unwrap();
        }
        for (f, t) in pairs {
            if f < n && t < n {
                g.add_edge(KnowledgeEdge::new(ids[f].clone(), ids[t].clone(), "r")).unwrap();
            }
        }
        let mut restored = GraphStore::new();
        restored.import_json(&g.export_json().unwrap()).unwrap();
        prop_assert_eq!(restored.get_all_nodes(), g.get_all_nodes());
        prop_assert_eq!(restored.get_all_edges(), g.get_all_edges());
    }
}
