//! Knowledge graph storage.
//!
//! An in-memory directed multigraph of typed nodes and typed, weighted
//! edges, plus the traversal primitives and analysis dispatch built on it.
//!
//! ## Architecture
//!
//! ```text
//! GraphStore (arena + adjacency maps)
//!      │
//!      ├── traversal ──► paths, subgraphs, components
//!      │
//!      ├── extraction ──► AnalysisGraph (petgraph::DiGraph snapshot)
//!      │                       │
//!      │              MetricsEngine / PatternMiner
//!      │
//!      ├── community ──► Cluster (components or SimilarityClusterer)
//!      │
//!      └── persistence ──► GraphSnapshot (JSON)
//! ```
//!
//! ## Modules
//!
//! - [`models`] — Records (KnowledgeNode, KnowledgeEdge, NodeUpdate, Cluster)
//! - [`store`] — `GraphStore` CRUD, adjacency and analysis dispatch
//! - [`traversal`] — Path enumeration, shortest path, subgraph, components
//! - [`extraction`] — Store → petgraph snapshot conversion
//! - [`community`] — Cluster dispatch
//! - [`persistence`] — Snapshot import/export

pub mod community;
pub mod extraction;
pub mod models;
pub mod persistence;
pub mod store;
pub mod traversal;

pub use extraction::{AnalysisEdge, AnalysisGraph, AnalysisNode};
pub use models::{
    clamp_strength, Cluster, ClusterAlgorithm, EdgeDirection, KnowledgeEdge, KnowledgeNode,
    NodeUpdate, SubgraphEntry, DEFAULT_EDGE_STRENGTH,
};
pub use persistence::{GraphSnapshot, SnapshotMetadata, SNAPSHOT_VERSION};
pub use store::GraphStore;
pub use traversal::{DEFAULT_TRAVERSAL_DEPTH, MAX_TRAVERSAL_DEPTH};
