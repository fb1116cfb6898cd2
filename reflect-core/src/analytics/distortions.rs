//! Cognitive distortion aggregation
//!
//! Flattens the distortions of all analyzed entries in a window into
//! per-kind statistics with capped example lists.

use crate::analytics::round2;
use crate::types::{DistortionKind, JournalEntry};
use serde::Serialize;
use std::collections::BTreeMap;

/// An example occurrence of a distortion kind
#[derive(Debug, Clone, Serialize)]
pub struct DistortionExample {
    pub sentence: String,
    pub explanation: String,
    pub confidence: f64,
}

/// Aggregate statistics for one distortion kind
#[derive(Debug, Clone, Serialize)]
pub struct DistortionStat {
    pub kind: DistortionKind,
    /// Human-readable name
    pub name: &'static str,
    /// Total occurrences across all analyzed entries
    pub count: i64,
    /// Number of distinct entries containing this kind
    pub affected_entries: i64,
    /// Mean provider confidence, two decimal places
    pub avg_confidence: f64,
    /// Highest-confidence examples, capped
    pub examples: Vec<DistortionExample>,
}

/// Aggregated distortion report for a window
#[derive(Debug, Clone, Serialize)]
pub struct DistortionReport {
    /// Total distortion instances across analyzed entries
    pub total_distortions: i64,
    /// Entries whose analysis has completed
    pub analyzed_entries: i64,
    /// The kind with the highest count, if any
    pub most_common: Option<DistortionKind>,
    /// Per-kind stats, sorted by count descending (ties by kind)
    pub distortions: Vec<DistortionStat>,
}

/// Aggregate distortions across a window of entries.
///
/// Only entries whose analysis completed participate; unanalyzed entries
/// are invisible here. Examples are ordered by confidence descending and
/// capped at `max_examples` per kind.
pub fn aggregate_distortions(entries: &[JournalEntry], max_examples: usize) -> DistortionReport {
    struct Acc {
        count: i64,
        affected_entries: i64,
        confidence_sum: f64,
        examples: Vec<DistortionExample>,
    }

    let mut groups: BTreeMap<DistortionKind, Acc> = BTreeMap::new();
    let mut analyzed_entries = 0;

    for entry in entries {
        if !entry.analysis.processed {
            continue;
        }
        analyzed_entries += 1;

        let mut kinds_in_entry = std::collections::BTreeSet::new();
        for distortion in &entry.analysis.distortions {
            let acc = groups.entry(distortion.kind).or_insert(Acc {
                count: 0,
                affected_entries: 0,
                confidence_sum: 0.0,
                examples: Vec::new(),
            });
            acc.count += 1;
            acc.confidence_sum += distortion.confidence;
            acc.examples.push(DistortionExample {
                sentence: distortion.sentence.clone(),
                explanation: distortion.explanation.clone(),
                confidence: distortion.confidence,
            });
            kinds_in_entry.insert(distortion.kind);
        }
        for kind in kinds_in_entry {
            if let Some(acc) = groups.get_mut(&kind) {
                acc.affected_entries += 1;
            }
        }
    }

    let mut stats: Vec<DistortionStat> = groups
        .into_iter()
        .map(|(kind, mut acc)| {
            acc.examples.sort_by(|a, b| {
                b.confidence
                    .partial_cmp(&a.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            acc.examples.truncate(max_examples);

            DistortionStat {
                kind,
                name: kind.name(),
                count: acc.count,
                affected_entries: acc.affected_entries,
                avg_confidence: round2(acc.confidence_sum / acc.count as f64),
                examples: acc.examples,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.kind.cmp(&b.kind)));

    DistortionReport {
        total_distortions: stats.iter().map(|s| s.count).sum(),
        analyzed_entries,
        most_common: stats.first().map(|s| s.kind),
        distortions: stats,
    }
}
