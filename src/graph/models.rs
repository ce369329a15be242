//! Knowledge graph data models.
//!
//! ## Stored records
//! - [`KnowledgeNode`] — a typed data node with opaque JSON content
//! - [`KnowledgeEdge`] — a typed, weighted, directed relationship
//! - [`NodeUpdate`] — partial field set merged by `GraphStore::update_node`
//!
//! ## Query types
//! - [`EdgeDirection`] — which incident edges a lookup returns
//! - [`SubgraphEntry`] — one visited node of a subgraph expansion
//!
//! ## Clustering output
//! - [`ClusterAlgorithm`] / [`Cluster`] — groups produced on demand

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GraphError, Result};

/// Default relationship strength when none is supplied.
pub const DEFAULT_EDGE_STRENGTH: f64 = 1.0;

/// Ids and type labels must contain at least one non-whitespace character.
pub(crate) fn is_valid_label(value: &str) -> bool {
    !value.trim().is_empty()
}

// ============================================================================
// Nodes
// ============================================================================

/// A typed data node.
///
/// `id` is immutable once stored. `content` is opaque to the store; only the
/// similarity clusterer looks inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeNode {
    pub id: String,
    #[serde(default)]
    pub content: Value,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl KnowledgeNode {
    /// Create a node stamped with the current time.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, content: Value) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content,
            node_type: node_type.into(),
            source: None,
            created: now,
            modified: now,
            metadata: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check the node invariants: non-blank id and type, `modified >= created`.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_label(&self.id) {
            return Err(GraphError::InvalidNode("id must not be empty".into()));
        }
        if !is_valid_label(&self.node_type) {
            return Err(GraphError::InvalidNode(format!(
                "node {} has an empty type",
                self.id
            )));
        }
        if self.modified < self.created {
            return Err(GraphError::InvalidNode(format!(
                "node {} was modified before it was created",
                self.id
            )));
        }
        Ok(())
    }
}

/// Partial update for a stored node.
///
/// No `id` field: a node's id cannot be changed. An `id` key in
/// deserialized input is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl NodeUpdate {
    /// Apply the present fields onto `node` and bump `modified`.
    pub(crate) fn apply_to(self, node: &mut KnowledgeNode) {
        if let Some(content) = self.content {
            node.content = content;
        }
        if let Some(node_type) = self.node_type {
            node.node_type = node_type;
        }
        if let Some(source) = self.source {
            node.source = Some(source);
        }
        if let Some(metadata) = self.metadata {
            node.metadata = Some(metadata);
        }
        // Never let clock skew break modified >= created
        node.modified = Utc::now().max(node.created);
    }
}

// ============================================================================
// Edges
// ============================================================================

fn default_strength() -> f64 {
    DEFAULT_EDGE_STRENGTH
}

/// A directed, typed relationship between two nodes.
///
/// Several edges may join the same ordered pair; the store tells them apart
/// with a synthetic key (see `GraphStore::add_edge`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl KnowledgeEdge {
    /// Create an edge with the default strength of 1.0.
    pub fn new(from: impl Into<String>, to: impl Into<String>, edge_type: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            edge_type: edge_type.into(),
            strength: DEFAULT_EDGE_STRENGTH,
            created: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// Whether this edge matches a `(from, to, type?)` address.
    pub(crate) fn matches(&self, from: &str, to: &str, edge_type: Option<&str>) -> bool {
        self.from == from && self.to == to && edge_type.map_or(true, |t| self.edge_type == t)
    }
}

/// Clamp a strength into `[0, 1]`. NaN becomes the default strength.
pub fn clamp_strength(strength: f64) -> f64 {
    if strength.is_nan() {
        DEFAULT_EDGE_STRENGTH
    } else {
        strength.clamp(0.0, 1.0)
    }
}

/// Which incident edges of a node to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDirection {
    In,
    Out,
    #[default]
    Both,
}

impl std::str::FromStr for EdgeDirection {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "incoming" => Ok(Self::In),
            "out" | "outgoing" => Ok(Self::Out),
            "both" | "all" => Ok(Self::Both),
            other => Err(GraphError::InvalidArgument(format!(
                "unknown edge direction: {other}"
            ))),
        }
    }
}

// ============================================================================
// Traversal output
// ============================================================================

/// One node reached by `GraphStore::get_subgraph`.
///
/// `edges` is the node's full incident edge list, not only the edge the
/// expansion arrived through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgraphEntry {
    pub node: KnowledgeNode,
    pub edges: Vec<KnowledgeEdge>,
    /// Hop distance from the expansion root
    pub depth: usize,
}

// ============================================================================
// Clusters
// ============================================================================

/// How a cluster was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    /// Undirected connected components of the edge structure
    #[default]
    Community,
    /// Agglomerative clustering over node content
    Similarity,
}

impl ClusterAlgorithm {
    /// Parse an algorithm name, falling back to `Community` for anything
    /// unrecognized.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "community" => Self::Community,
            "similarity" => Self::Similarity,
            other => {
                tracing::warn!(algorithm = other, "Unknown cluster algorithm, using community");
                Self::Community
            }
        }
    }
}

impl std::fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Community => write!(f, "community"),
            Self::Similarity => write!(f, "similarity"),
        }
    }
}

/// A group of nodes computed on demand. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    /// Member node ids (non-empty, no duplicates)
    pub nodes: Vec<String>,
    /// Representative member, if one was chosen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centroid: Option<String>,
    /// Internal consistency in [0, 1]
    pub coherence: f64,
    pub algorithm: ClusterAlgorithm,
    /// Newman modularity of the whole partition (community clusters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modularity: Option<f64>,
    /// Mean pairwise member similarity (similarity clusters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_similarity: Option<f64>,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n == node_id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_node_validate_ok() {
        let node = KnowledgeNode::new("n1", "concept", serde_json::json!("graph theory"));
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_node_validate_blank_id() {
        let node = KnowledgeNode::new("   ", "concept", Value::Null);
        assert!(matches!(node.validate(), Err(GraphError::InvalidNode(_))));
    }

    #[test]
    fn test_node_validate_blank_type() {
        let node = KnowledgeNode::new("n1", "", Value::Null);
        assert!(matches!(node.validate(), Err(GraphError::InvalidNode(_))));
    }

    #[test]
    fn test_node_validate_modified_before_created() {
        let mut node = KnowledgeNode::new("n1", "concept", Value::Null);
        node.modified = node.created - Duration::seconds(5);
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_node_serde_uses_type_key() {
        let node = KnowledgeNode::new("n1", "concept", serde_json::json!({"title": "x"}))
            .with_source("notes.md");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "concept");
        assert_eq!(json["source"], "notes.md");
        assert!(json.get("metadata").is_none());

        let back: KnowledgeNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_node_update_ignores_id_key() {
        let update: NodeUpdate =
            serde_json::from_value(serde_json::json!({"id": "other", "type": "topic"})).unwrap();
        let mut node = KnowledgeNode::new("n1", "concept", Value::Null);
        update.apply_to(&mut node);
        assert_eq!(node.id, "n1");
        assert_eq!(node.node_type, "topic");
        assert!(node.modified >= node.created);
    }

    #[test]
    fn test_edge_defaults_from_json() {
        let edge: KnowledgeEdge =
            serde_json::from_value(serde_json::json!({"from": "a", "to": "b", "type": "cites"}))
                .unwrap();
        assert!((edge.strength - 1.0).abs() < f64::EPSILON);
        assert!(edge.metadata.is_none());
    }

    #[test]
    fn test_clamp_strength() {
        assert_eq!(clamp_strength(1.7), 1.0);
        assert_eq!(clamp_strength(-0.2), 0.0);
        assert_eq!(clamp_strength(0.4), 0.4);
        assert_eq!(clamp_strength(f64::NAN), DEFAULT_EDGE_STRENGTH);
        assert_eq!(clamp_strength(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_edge_matches() {
        let edge = KnowledgeEdge::new("a", "b", "cites");
        assert!(edge.matches("a", "b", None));
        assert!(edge.matches("a", "b", Some("cites")));
        assert!(!edge.matches("a", "b", Some("refutes")));
        assert!(!edge.matches("b", "a", None));
    }

    #[test]
    fn test_edge_direction_from_str() {
        assert_eq!("in".parse::<EdgeDirection>().unwrap(), EdgeDirection::In);
        assert_eq!("OUT".parse::<EdgeDirection>().unwrap(), EdgeDirection::Out);
        assert_eq!("both".parse::<EdgeDirection>().unwrap(), EdgeDirection::Both);
        assert!("sideways".parse::<EdgeDirection>().is_err());
    }

    #[test]
    fn test_cluster_algorithm_parse_or_default() {
        assert_eq!(
            ClusterAlgorithm::parse_or_default("similarity"),
            ClusterAlgorithm::Similarity
        );
        assert_eq!(
            ClusterAlgorithm::parse_or_default("Community"),
            ClusterAlgorithm::Community
        );
        assert_eq!(
            ClusterAlgorithm::parse_or_default("louvain"),
            ClusterAlgorithm::Community
        );
        assert_eq!(ClusterAlgorithm::Similarity.to_string(), "similarity");
    }

    #[test]
    fn test_cluster_serde_omits_absent_scores() {
        let cluster = Cluster {
            id: "community_0".into(),
            nodes: vec!["a".into(), "b".into()],
            centroid: Some("a".into()),
            coherence: 1.0,
            algorithm: ClusterAlgorithm::Community,
            modularity: Some(0.5),
            avg_similarity: None,
        };
        let json = serde_json::to_string(&cluster).unwrap();
        assert!(json.contains("\"modularity\""));
        assert!(!json.contains("avg_similarity"));
        assert!(cluster.contains("b"));
        assert_eq!(cluster.size(), 2);
    }
}
