//! Pattern mining data models.
//!
//! - [`PatternType`] — the seven structural pattern families
//! - [`GraphPattern`] — one scored detection
//! - [`MiningConfig`] — thresholds, size cap and enabled families
//! - [`PatternSummary`] — per-family counts of a mining run

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Pattern families
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    Star,
    Chain,
    Cycle,
    Tree,
    Bridge,
    Cluster,
    Hub,
}

impl PatternType {
    pub const ALL: [PatternType; 7] = [
        Self::Star,
        Self::Chain,
        Self::Cycle,
        Self::Tree,
        Self::Bridge,
        Self::Cluster,
        Self::Hub,
    ];

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "star" => Some(Self::Star),
            "chain" => Some(Self::Chain),
            "cycle" => Some(Self::Cycle),
            "tree" => Some(Self::Tree),
            "bridge" => Some(Self::Bridge),
            "cluster" => Some(Self::Cluster),
            "hub" => Some(Self::Hub),
            _ => None,
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Star => write!(f, "star"),
            Self::Chain => write!(f, "chain"),
            Self::Cycle => write!(f, "cycle"),
            Self::Tree => write!(f, "tree"),
            Self::Bridge => write!(f, "bridge"),
            Self::Cluster => write!(f, "cluster"),
            Self::Hub => write!(f, "hub"),
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// Confidence contribution of an edge whose strength is unknown.
pub const DEFAULT_EDGE_CONFIDENCE: f64 = 0.7;

/// An edge participating in a pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEdge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

/// One structural pattern found by the miner. Recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphPattern {
    /// UUIDv5 of the pattern type and ordered node list
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub nodes: Vec<String>,
    pub edges: Vec<PatternEdge>,
    /// Number of detections merged into this pattern
    pub frequency: usize,
    /// Mean edge strength
    pub confidence: f64,
    /// Fraction of the graph's nodes covered
    pub support: f64,
    pub lift: f64,
    pub conviction: f64,
    pub contexts: Vec<String>,
    pub last_seen: DateTime<Utc>,
}

impl GraphPattern {
    pub fn size(&self) -> usize {
        self.nodes.len()
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning parameters for the pattern miner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Patterns below this support are dropped (default: 0.0)
    pub min_support: f64,
    /// Patterns below this confidence are dropped (default: 0.0)
    pub min_confidence: f64,
    /// No pattern holds more nodes than this (default: 10)
    pub max_pattern_size: usize,
    /// Families to run (default: all)
    pub enabled: BTreeSet<PatternType>,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            min_support: 0.0,
            min_confidence: 0.0,
            max_pattern_size: 10,
            enabled: PatternType::ALL.into_iter().collect(),
        }
    }
}

impl MiningConfig {
    /// Run only the given families.
    pub fn only(types: impl IntoIterator<Item = PatternType>) -> Self {
        Self {
            enabled: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, pattern_type: PatternType) -> bool {
        self.enabled.contains(&pattern_type)
    }

    /// Clamp thresholds into [0, 1] and reset a size cap below 2.
    pub fn sanitized(mut self) -> Self {
        for (value, name) in [
            (&mut self.min_support, "min_support"),
            (&mut self.min_confidence, "min_confidence"),
        ] {
            if value.is_nan() {
                warn!(field = name, "Mining threshold is NaN, using 0");
                *value = 0.0;
            } else if !(0.0..=1.0).contains(value) {
                warn!(field = name, value = *value, "Mining threshold out of range, clamping");
                *value = value.clamp(0.0, 1.0);
            }
        }
        if self.max_pattern_size < 2 {
            warn!(
                value = self.max_pattern_size,
                "max_pattern_size below 2, using default"
            );
            self.max_pattern_size = Self::default().max_pattern_size;
        }
        self
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Pattern counts of one mining run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub total: usize,
    pub by_type: BTreeMap<PatternType, usize>,
    /// Mean confidence over all patterns (0 when there are none)
    pub average_confidence: f64,
}

impl PatternSummary {
    pub fn from_patterns(patterns: &[GraphPattern]) -> Self {
        let mut by_type = BTreeMap::new();
        for pattern in patterns {
            *by_type.entry(pattern.pattern_type).or_insert(0) += 1;
        }
        let average_confidence = if patterns.is_empty() {
            0.0
        } else {
            patterns.iter().map(|p| p.confidence).sum::<f64>() / patterns.len() as f64
        };
        Self {
            total: patterns.len(),
            by_type,
            average_confidence,
        }
    }

    pub fn count(&self, pattern_type: PatternType) -> usize {
        self.by_type.get(&pattern_type).copied().unwrap_or(0)
    }
}
