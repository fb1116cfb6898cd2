//! Journal stats and dashboard overview

use crate::analytics::{percent_change, round1};
use crate::types::{EntrySummary, JournalEntry, Mood};
use serde::Serialize;
use std::collections::HashMap;

/// Headline numbers for the journal
#[derive(Debug, Clone, Serialize)]
pub struct JournalStats {
    pub total_entries: i64,
    /// Mean mood intensity in the current window, one decimal
    pub avg_mood_score: f64,
    pub streak_days: u32,
    /// Percent change of mean mood intensity vs the previous window
    pub improvement_rate: f64,
}

/// Compute headline stats from the current and previous window.
pub fn journal_stats(
    current: &[JournalEntry],
    previous: &[JournalEntry],
    streak_days: u32,
) -> JournalStats {
    let avg = |entries: &[JournalEntry]| -> f64 {
        if entries.is_empty() {
            return 0.0;
        }
        let sum: u32 = entries.iter().map(|e| e.mood_intensity as u32).sum();
        sum as f64 / entries.len() as f64
    };

    let cur_avg = avg(current);
    JournalStats {
        total_entries: current.len() as i64,
        avg_mood_score: round1(cur_avg),
        streak_days,
        improvement_rate: percent_change(cur_avg, avg(previous)),
    }
}

/// Snapshot counters for the dashboard window
#[derive(Debug, Clone, Serialize)]
pub struct QuickStats {
    pub total_entries: i64,
    pub avg_mood_intensity: f64,
    pub total_distortions: i64,
    pub processed_entries: i64,
}

/// Mood with its entry count in the window
#[derive(Debug, Clone, Serialize)]
pub struct MoodShare {
    pub mood: Mood,
    pub count: i64,
}

/// Dashboard payload: recent entries plus window counters
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub recent: Vec<EntrySummary>,
    pub quick_stats: QuickStats,
    /// Mood counts, descending
    pub mood_distribution: Vec<MoodShare>,
    pub streak_days: u32,
}

/// Build the dashboard from the most recent entries and the window.
pub fn dashboard(
    recent_entries: &[JournalEntry],
    window_entries: &[JournalEntry],
    streak_days: u32,
) -> Dashboard {
    let total_entries = window_entries.len() as i64;
    let avg_mood_intensity = if window_entries.is_empty() {
        0.0
    } else {
        let sum: u32 = window_entries.iter().map(|e| e.mood_intensity as u32).sum();
        round1(sum as f64 / window_entries.len() as f64)
    };
    let total_distortions = window_entries
        .iter()
        .filter(|e| e.analysis.processed)
        .map(|e| e.analysis.distortions.len() as i64)
        .sum();
    let processed_entries = window_entries
        .iter()
        .filter(|e| e.analysis.processed)
        .count() as i64;

    let mut mood_counts: HashMap<Mood, i64> = HashMap::new();
    for entry in window_entries {
        *mood_counts.entry(entry.mood).or_insert(0) += 1;
    }
    let mut mood_distribution: Vec<MoodShare> = mood_counts
        .into_iter()
        .map(|(mood, count)| MoodShare { mood, count })
        .collect();
    mood_distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mood.cmp(&b.mood)));

    Dashboard {
        recent: recent_entries.iter().map(|e| e.summary()).collect(),
        quick_stats: QuickStats {
            total_entries,
            avg_mood_intensity,
            total_distortions,
            processed_entries,
        },
        mood_distribution,
        streak_days,
    }
}
