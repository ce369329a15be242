//! Graph metrics.
//!
//! Computes per-node centralities and whole-graph statistics over a
//! read-only [`AnalysisGraph`](crate::graph::AnalysisGraph) snapshot.
//!
//! ## Modules
//!
//! - [`models`] — Data structures (NodeMetrics, GraphMetrics, StructuralAnalysis, MetricsConfig)
//! - [`algorithms`] — Kernels (PageRank, eigenvector, bounded betweenness, closeness, clustering, components, modularity)
//! - [`engine`] — `MetricsEngine`, one snapshot plus cached kernel results

pub mod algorithms;
pub mod engine;
pub mod models;

pub use engine::MetricsEngine;
pub use models::{
    ArticulationPoint, BridgeEdge, CentralNode, CentralityType, GraphMetrics, Hub, MetricsConfig,
    NodeMetrics, StructuralAnalysis, StructuralImportance,
};
