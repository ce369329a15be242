//! Structural pattern mining.
//!
//! Detects seven pattern families (star, chain, cycle, tree, bridge,
//! cluster, hub) over a read-only [`AnalysisGraph`](crate::graph::AnalysisGraph)
//! and scores each with support, confidence, lift and conviction.
//!
//! ## Modules
//!
//! - [`models`] — GraphPattern, PatternType, MiningConfig, PatternSummary
//! - [`detectors`] — One detector per family
//! - [`miner`] — `PatternMiner`: run, merge, filter, score

pub mod detectors;
pub mod miner;
pub mod models;

pub use detectors::{hub_degree_threshold, Detection};
pub use miner::{pattern_id, PatternMiner};
pub use models::{
    GraphPattern, MiningConfig, PatternEdge, PatternSummary, PatternType,
    DEFAULT_EDGE_CONFIDENCE,
};
