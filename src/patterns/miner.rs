//! Pattern miner.
//!
//! Runs the enabled detectors over one snapshot, merges detections that
//! cover the same node list, filters by support and confidence and scores
//! the survivors.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::detectors::{detect, Detection};
use super::models::{
    GraphPattern, MiningConfig, PatternEdge, PatternSummary, PatternType,
    DEFAULT_EDGE_CONFIDENCE,
};
use crate::graph::AnalysisGraph;

/// Stateless per run; holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct PatternMiner {
    config: MiningConfig,
}

impl PatternMiner {
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Mine every enabled family, in family order.
    pub fn mine(&self, graph: &AnalysisGraph) -> Vec<GraphPattern> {
        if graph.is_empty() {
            return vec![];
        }
        let start = Instant::now();
        let max_size = self.config.max_pattern_size;

        let mut detections = Vec::new();
        for &pattern_type in &self.config.enabled {
            let found = detect(pattern_type, graph, max_size);
            debug!(
                pattern_type = %pattern_type,
                detections = found.len(),
                "Detector finished"
            );
            detections.extend(found);
        }

        let merged = merge(detections);
        let last_seen = Utc::now();
        let patterns: Vec<GraphPattern> = merged
            .into_iter()
            .map(|(detection, frequency)| build_pattern(graph, detection, frequency))
            .filter(|p| {
                p.support >= self.config.min_support && p.confidence >= self.config.min_confidence
            })
            .map(|mut p| {
                score(&mut p);
                p.last_seen = last_seen;
                p
            })
            .collect();

        debug!(
            node_count = graph.node_count(),
            pattern_count = patterns.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Patterns mined"
        );
        patterns
    }

    /// Mine and count per family.
    pub fn summarize(&self, graph: &AnalysisGraph) -> PatternSummary {
        PatternSummary::from_patterns(&self.mine(graph))
    }
}

/// Collapse detections with the same family and node list, keeping the first
/// one's edges and the union of contexts. Returns each survivor with the
/// number of detections it absorbed, in first-seen order.
fn merge(detections: Vec<Detection>) -> Vec<(Detection, usize)> {
    let mut merged: Vec<(Detection, usize)> = Vec::new();
    let mut slots: HashMap<(PatternType, Vec<usize>), usize> = HashMap::new();
    for detection in detections {
        let key = (detection.pattern_type, detection.nodes.clone());
        match slots.get(&key) {
            Some(&slot) => {
                let (kept, frequency) = &mut merged[slot];
                *frequency += 1;
                for context in detection.contexts {
                    if !kept.contexts.contains(&context) {
                        kept.contexts.push(context);
                    }
                }
            }
            None => {
                slots.insert(key, merged.len());
                merged.push((detection, 1));
            }
        }
    }
    merged
}

/// Deterministic id from the family and the ordered node list.
pub fn pattern_id(pattern_type: PatternType, nodes: &[String]) -> String {
    let name = format!("{pattern_type}:{}", nodes.join("\u{1f}"));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

fn build_pattern(graph: &AnalysisGraph, detection: Detection, frequency: usize) -> GraphPattern {
    let nodes: Vec<String> = detection
        .nodes
        .iter()
        .map(|&pos| graph.node_id(pos).to_string())
        .collect();

    let edges: Vec<PatternEdge> = detection
        .edges
        .iter()
        .map(|&e| {
            let (s, t) = graph.endpoints(e);
            let data = graph.edge(e);
            PatternEdge {
                from: graph.node_id(s).to_string(),
                to: graph.node_id(t).to_string(),
                edge_type: data.edge_type.clone(),
                strength: Some(data.strength),
            }
        })
        .collect();

    let confidence = if edges.is_empty() {
        DEFAULT_EDGE_CONFIDENCE
    } else {
        edges
            .iter()
            .map(|e| e.strength.unwrap_or(DEFAULT_EDGE_CONFIDENCE))
            .sum::<f64>()
            / edges.len() as f64
    };
    let support = (nodes.len() as f64 / graph.node_count() as f64).min(1.0);

    let node_types: BTreeSet<&str> = detection.nodes.iter().map(|&p| graph.node_type(p)).collect();
    let mut contexts = detection.contexts;
    contexts.extend(node_types.into_iter().map(|t| format!("node_type:{t}")));

    GraphPattern {
        id: pattern_id(detection.pattern_type, &nodes),
        pattern_type: detection.pattern_type,
        nodes,
        edges,
        frequency,
        confidence,
        support,
        lift: 1.0,
        conviction: 1.0,
        contexts,
        last_seen: Utc::now(),
    }
}

/// Fill in lift and conviction from frequency, support and confidence.
fn score(pattern: &mut GraphPattern) {
    let denominator = pattern.support * pattern.confidence;
    pattern.lift = if denominator > 0.0 {
        pattern.frequency as f64 / denominator
    } else {
        1.0
    };
    pattern.conviction = if pattern.confidence >= 1.0 {
        1.0
    } else {
        (1.0 - pattern.support) / (1.0 - pattern.confidence)
    };
}

// ============================================================================
// Tests
// ============================================================================
