//! Progress indicators across adjacent time windows
//!
//! Compares the current window of entries against the immediately
//! preceding window of equal length and classifies the direction of
//! change per indicator.

use crate::analytics::{percent_change, round1, round2};
use crate::types::JournalEntry;
use serde::Serialize;

/// Direction of change for an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
    NeedsAttention,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
            Trend::NeedsAttention => "needs-attention",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One indicator: current value, previous value, and direction
#[derive(Debug, Clone, Serialize)]
pub struct Indicator {
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
    pub trend: Trend,
}

impl Indicator {
    fn new(current: f64, previous: f64, trend: Trend) -> Self {
        Indicator {
            current,
            previous,
            percent_change: percent_change(current, previous),
            trend,
        }
    }
}

/// Progress comparison report across two adjacent windows
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub window_days: u32,
    pub journaling_consistency: Indicator,
    pub mood_stability: Indicator,
    pub cognitive_health: Indicator,
    pub problem_resolution: Indicator,
    pub positivity_ratio: Indicator,
}

fn avg_mood_intensity(entries: &[JournalEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let sum: u32 = entries.iter().map(|e| e.mood_intensity as u32).sum();
    round1(sum as f64 / entries.len() as f64)
}

// Unanalyzed entries count as zero distortions, which biases the
// average downward for windows with a processing backlog.
fn avg_distortions_per_entry(entries: &[JournalEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let total: usize = entries.iter().map(|e| e.analysis.distortions.len()).sum();
    round2(total as f64 / entries.len() as f64)
}

fn resolved_pct(entries: &[JournalEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let resolved = entries.iter().filter(|e| e.is_resolved).count();
    round1(resolved as f64 / entries.len() as f64 * 100.0)
}

fn positive_pct(entries: &[JournalEntry]) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }
    let positive = entries.iter().filter(|e| e.mood.is_positive()).count();
    round1(positive as f64 / entries.len() as f64 * 100.0)
}

/// Compare the current window against the previous one.
///
/// Each indicator carries its own fallback label when the value did not
/// move in the improving direction: fewer entries is declining, lower
/// mood and resolution and positivity are stable, and more distortions
/// per entry needs attention.
pub fn compare_progress(
    current: &[JournalEntry],
    previous: &[JournalEntry],
    days: u32,
) -> ProgressReport {
    let cur_count = current.len() as f64;
    let prev_count = previous.len() as f64;

    let cur_mood = avg_mood_intensity(current);
    let prev_mood = avg_mood_intensity(previous);

    let cur_distortions = avg_distortions_per_entry(current);
    let prev_distortions = avg_distortions_per_entry(previous);

    let cur_resolved = resolved_pct(current);
    let prev_resolved = resolved_pct(previous);

    let cur_positive = positive_pct(current);
    let prev_positive = positive_pct(previous);

    ProgressReport {
        window_days: days,
        journaling_consistency: Indicator::new(
            cur_count,
            prev_count,
            if cur_count > prev_count {
                Trend::Improving
            } else {
                Trend::Declining
            },
        ),
        mood_stability: Indicator::new(
            cur_mood,
            prev_mood,
            if cur_mood > prev_mood {
                Trend::Improving
            } else {
                Trend::Stable
            },
        ),
        cognitive_health: Indicator::new(
            cur_distortions,
            prev_distortions,
            if cur_distortions < prev_distortions {
                Trend::Improving
            } else {
                Trend::NeedsAttention
            },
        ),
        problem_resolution: Indicator::new(
            cur_resolved,
            prev_resolved,
            if cur_resolved > prev_resolved {
                Trend::Improving
            } else {
                Trend::Stable
            },
        ),
        positivity_ratio: Indicator::new(
            cur_positive,
            prev_positive,
            if cur_positive > prev_positive {
                Trend::Improving
            } else {
                Trend::Stable
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Distortion, DistortionKind, Mood, NewEntry};

    fn entry(mood: Mood, intensity: u8, resolved: bool) -> JournalEntry {
        NewEntry {
            title: "t".to_string(),
            content: "c".to_string(),
            mood,
            mood_intensity: intensity,
            tags: vec![],
            is_important: false,
            is_resolved: resolved,
        }
        .into_entry("owner-1")
        .unwrap()
    }

    #[test]
    fn test_more_entries_improving() {
        let current = vec![
            entry(Mood::Content, 6, false),
            entry(Mood::Sad, 4, false),
            entry(Mood::Happy, 7, false),
        ];
        let previous = vec![entry(Mood::Neutral, 5, false)];

        let report = compare_progress(&current, &previous, 30);
        assert_eq!(report.journaling_consistency.current, 3.0);
        assert_eq!(report.journaling_consistency.previous, 1.0);
        assert_eq!(report.journaling_consistency.percent_change, 200.0);
        assert_eq!(report.journaling_consistency.trend, Trend::Improving);
    }

    #[test]
    fn test_fewer_entries_declining() {
        let current = vec![entry(Mood::Neutral, 5, false)];
        let previous = vec![
            entry(Mood::Neutral, 5, false),
            entry(Mood::Neutral, 5, false),
        ];

        let report = compare_progress(&current, &previous, 7);
        assert_eq!(report.journaling_consistency.trend, Trend::Declining);
        assert_eq!(report.journaling_consistency.percent_change, -50.0);
    }

    #[test]
    fn test_equal_counts_fall_to_fallback() {
        let current = vec![entry(Mood::Neutral, 5, false)];
        let previous = vec![entry(Mood::Neutral, 5, false)];

        let report = compare_progress(&current, &previous, 7);
        assert_eq!(report.journaling_consistency.trend, Trend::Declining);
        assert_eq!(report.mood_stability.trend, Trend::Stable);
        assert_eq!(report.cognitive_health.trend, Trend::NeedsAttention);
    }

    #[test]
    fn test_fewer_distortions_improving() {
        let mut noisy = entry(Mood::Anxious, 4, false);
        noisy.analysis.distortions = vec![
            Distortion {
                kind: DistortionKind::Catastrophizing,
                sentence: "s".to_string(),
                explanation: "e".to_string(),
                confidence: 0.8,
            },
            Distortion {
                kind: DistortionKind::MindReading,
                sentence: "s".to_string(),
                explanation: "e".to_string(),
                confidence: 0.6,
            },
        ];
        noisy.analysis.mark_processed();

        let report = compare_progress(&[entry(Mood::Content, 6, false)], &[noisy], 30);
        assert_eq!(report.cognitive_health.current, 0.0);
        assert_eq!(report.cognitive_health.previous, 2.0);
        assert_eq!(report.cognitive_health.trend, Trend::Improving);
        assert_eq!(report.cognitive_health.percent_change, -100.0);
    }

    #[test]
    fn test_zero_previous_is_zero_change() {
        let current = vec![entry(Mood::Hopeful, 7, true)];
        let previous = vec![entry(Mood::Sad, 3, false)];

        let report = compare_progress(&current, &previous, 30);
        assert_eq!(report.problem_resolution.current, 100.0);
        assert_eq!(report.problem_resolution.previous, 0.0);
        assert_eq!(report.problem_resolution.percent_change, 0.0);
        assert_eq!(report.problem_resolution.trend, Trend::Improving);
    }

    #[test]
    fn test_both_windows_empty() {
        let report = compare_progress(&[], &[], 30);
        assert_eq!(report.problem_resolution.current, 0.0);
        assert_eq!(report.problem_resolution.percent_change, 0.0);
        assert_eq!(report.problem_resolution.trend, Trend::Stable);
        assert_eq!(report.positivity_ratio.trend, Trend::Stable);
    }

    #[test]
    fn test_positivity_ratio() {
        let current = vec![
            entry(Mood::Grateful, 8, false),
            entry(Mood::Happy, 7, false),
            entry(Mood::Anxious, 4, false),
            entry(Mood::Sad, 3, false),
        ];
        let previous = vec![entry(Mood::Angry, 6, false)];

        let report = compare_progress(&current, &previous, 30);
        assert_eq!(report.positivity_ratio.current, 50.0);
        assert_eq!(report.positivity_ratio.previous, 0.0);
        assert_eq!(report.positivity_ratio.trend, Trend::Improving);
    }
}
