//! Change event types emitted by the graph store

use serde::{Deserialize, Serialize};

/// The kind of graph record that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphEntity {
    Node,
    Edge,
}

/// The mutation performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

/// A change event emitted after a successful mutation.
///
/// Carries the full node or edge payload rather than a diff.
/// Must be Clone for `tokio::sync::broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEvent {
    pub entity: GraphEntity,
    pub action: ChangeAction,
    /// Node id, or synthetic edge key for edges
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
    /// ISO 8601 timestamp
    pub timestamp: String,
}

impl GraphEvent {
    /// Create a new GraphEvent with the current timestamp
    pub fn new(entity: GraphEntity, action: ChangeAction, entity_id: impl Into<String>) -> Self {
        Self {
            entity,
            action,
            entity_id: entity_id.into(),
            payload: serde_json::Value::Null,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Sink for graph change events.
///
/// Implementations must return promptly: the store calls `emit` inline
/// after each mutation and never waits for delivery.
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: GraphEvent);

    fn emit_created(&self, entity: GraphEntity, id: &str, payload: serde_json::Value) {
        self.emit(GraphEvent::new(entity, ChangeAction::Created, id).with_payload(payload));
    }

    fn emit_updated(&self, entity: GraphEntity, id: &str, payload: serde_json::Value) {
        self.emit(GraphEvent::new(entity, ChangeAction::Updated, id).with_payload(payload));
    }

    fn emit_deleted(&self, entity: GraphEntity, id: &str, payload: serde_json::Value) {
        self.emit(GraphEvent::new(entity, ChangeAction::Deleted, id).with_payload(payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_entity_serde_snake_case() {
        assert_eq!(serde_json::to_string(&GraphEntity::Node).unwrap(), "\"node\"");
        assert_eq!(serde_json::to_string(&GraphEntity::Edge).unwrap(), "\"edge\"");
        let back: GraphEntity = serde_json::from_str("\"edge\"").unwrap();
        assert_eq!(back, GraphEntity::Edge);
    }

    #[test]
    fn test_change_action_serde_roundtrip() {
        for action in [
            ChangeAction::Created,
            ChangeAction::Updated,
            ChangeAction::Deleted,
        ] {
            let json = serde_json::to_string(&action).unwrap();
            let back: ChangeAction = serde_json::from_str(&json).unwrap();
            assert_eq!(action, back);
        }
    }

    #[test]
    fn test_graph_event_null_payload_omitted() {
        let event = GraphEvent::new(GraphEntity::Node, ChangeAction::Deleted, "n1");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("\"payload\""));
        assert!(json.contains("\"entity_id\":\"n1\""));
    }

    #[test]
    fn test_graph_event_with_payload() {
        let event = GraphEvent::new(GraphEntity::Edge, ChangeAction::Created, "a,b,links,0")
            .with_payload(serde_json::json!({"from": "a", "to": "b"}));
        let json = serde_json::to_string(&event).unwrap();
        let back: GraphEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.action, ChangeAction::Created);
        assert_eq!(back.payload["from"], "a");
    }
}
