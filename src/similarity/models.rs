//! Similarity configuration and results.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Set-overlap measure applied to content tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMetric {
    /// |A ∩ B| / |A ∪ B|
    #[default]
    Jaccard,
    /// |A ∩ B| / sqrt(|A| · |B|)
    Cosine,
    /// 2 |A ∩ B| / (|A| + |B|)
    Dice,
}

impl SimilarityMetric {
    /// Parse a metric name, falling back to Jaccard for unknown names.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "jaccard" => Self::Jaccard,
            "cosine" => Self::Cosine,
            "dice" => Self::Dice,
            other => {
                warn!(metric = other, "Unknown similarity metric, using jaccard");
                Self::Jaccard
            }
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jaccard => write!(f, "jaccard"),
            Self::Cosine => write!(f, "cosine"),
            Self::Dice => write!(f, "dice"),
        }
    }
}

/// Weights of the three similarity components. They are used as given and
/// not renormalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityWeights {
    pub content: f64,
    pub node_type: f64,
    pub metadata: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            content: 0.6,
            node_type: 0.3,
            metadata: 0.1,
        }
    }
}

/// Tuning parameters for the similarity clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Clusters stop merging once the best average-linkage score falls
    /// below this value (default: 0.5)
    pub threshold: f64,
    pub metric: SimilarityMetric,
    pub weights: SimilarityWeights,
    /// Score matching node types (default: true)
    pub consider_type: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            metric: SimilarityMetric::default(),
            weights: SimilarityWeights::default(),
            consider_type: true,
        }
    }
}

impl SimilarityConfig {
    /// Clamp the threshold into [0, 1] and reset negative or NaN weights.
    pub fn sanitized(mut self) -> Self {
        if self.threshold.is_nan() {
            warn!("Similarity threshold is NaN, using default");
            self.threshold = Self::default().threshold;
        } else if !(0.0..=1.0).contains(&self.threshold) {
            warn!(value = self.threshold, "Similarity threshold out of range, clamping");
            self.threshold = self.threshold.clamp(0.0, 1.0);
        }
        let defaults = SimilarityWeights::default();
        for (weight, fallback, name) in [
            (&mut self.weights.content, defaults.content, "content"),
            (&mut self.weights.node_type, defaults.node_type, "node_type"),
            (&mut self.weights.metadata, defaults.metadata, "metadata"),
        ] {
            if weight.is_nan() || *weight < 0.0 {
                warn!(weight = name, value = *weight, "Invalid similarity weight, using default");
                *weight = fallback;
            }
        }
        self
    }
}

/// A candidate ranked by similarity to a target node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarNode {
    pub node_id: String,
    pub similarity: f64,
}
