//! Error type for graph mutations and snapshot exchange.
//!
//! Only operations that can be *rejected* return errors. Lookups of absent
//! nodes or edges return `None` / `false` / empty collections, and the
//! analysis components never fail on a well-formed graph.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("node already exists: {0}")]
    DuplicateId(String),

    /// An edge endpoint does not exist (referential integrity).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("snapshot mismatch: metadata declares {declared} {kind}, found {actual}")]
    SnapshotMismatch {
        kind: &'static str,
        declared: usize,
        actual: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GraphError::DuplicateId("a".into()).to_string(),
            "node already exists: a"
        );
        let err = GraphError::SnapshotMismatch {
            kind: "edges",
            declared: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "snapshot mismatch: metadata declares 3 edges, found 2"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: GraphError = parse.unwrap_err().into();
        assert!(matches!(err, GraphError::Serialization(_)));
    }
}
