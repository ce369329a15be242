//! Content-similarity clustering.
//!
//! Works on node lists only (content, type, metadata) and never reads edges.
//!
//! ## Modules
//!
//! - [`models`] — Configuration (SimilarityConfig, SimilarityMetric, SimilarityWeights)
//! - [`tokenizer`] — Content flattening and tokenization
//! - [`clusterer`] — Weighted pairwise similarity and agglomerative clustering

pub mod clusterer;
pub mod models;
pub mod tokenizer;

pub use clusterer::{metadata_similarity, set_similarity, SimilarityClusterer};
pub use models::{SimilarNode, SimilarityConfig, SimilarityMetric, SimilarityWeights};
pub use tokenizer::{content_text, tokenize, tokenize_content};
