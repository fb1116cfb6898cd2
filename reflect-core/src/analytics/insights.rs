//! Writing habit insights
//!
//! Descriptive statistics about how and when the owner writes: volume,
//! weekday habits, recurring tags, and sentiment spread.

use crate::analytics::round1;
use crate::types::{JournalEntry, Mood, Sentiment};
use chrono::Datelike;
use serde::Serialize;
use std::collections::HashMap;

/// Tag with its usage count
#[derive(Debug, Clone, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Sentiment with its entry count
#[derive(Debug, Clone, Serialize)]
pub struct SentimentCount {
    pub sentiment: Sentiment,
    pub count: i64,
}

/// Writing habit report for a window of entries
#[derive(Debug, Clone, Serialize)]
pub struct WritingInsights {
    pub total_entries: i64,
    pub total_words: i64,
    pub avg_words_per_entry: f64,
    pub entries_with_distortions: i64,
    pub important_entries: i64,
    pub resolved_entries: i64,
    pub most_common_mood: Option<Mood>,
    /// Entry counts per weekday, index 0 = Sunday
    pub weekday_frequency: [i64; 7],
    /// Most used tags, count descending, capped at ten
    pub top_tags: Vec<TagCount>,
    /// Sentiment counts over analyzed entries, count descending
    pub sentiment_distribution: Vec<SentimentCount>,
}

/// Compute writing insights over a window of entries.
pub fn writing_insights(entries: &[JournalEntry]) -> WritingInsights {
    let total_entries = entries.len() as i64;
    let total_words: i64 = entries.iter().map(|e| e.word_count as i64).sum();

    let mut mood_counts: HashMap<Mood, i64> = HashMap::new();
    let mut tag_counts: HashMap<String, i64> = HashMap::new();
    let mut sentiment_counts: HashMap<Sentiment, i64> = HashMap::new();
    let mut weekday_frequency = [0i64; 7];
    let mut entries_with_distortions = 0;
    let mut important_entries = 0;
    let mut resolved_entries = 0;

    for entry in entries {
        *mood_counts.entry(entry.mood).or_insert(0) += 1;
        for tag in &entry.tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
        weekday_frequency[entry.created_at.weekday().num_days_from_sunday() as usize] += 1;
        if entry.analysis.processed && !entry.analysis.distortions.is_empty() {
            entries_with_distortions += 1;
        }
        if let Some(sentiment) = entry.analysis.sentiment {
            if entry.analysis.processed {
                *sentiment_counts.entry(sentiment).or_insert(0) += 1;
            }
        }
        if entry.is_important {
            important_entries += 1;
        }
        if entry.is_resolved {
            resolved_entries += 1;
        }
    }

    let most_common_mood = mood_counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(mood, _)| *mood);

    let mut top_tags: Vec<TagCount> = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();
    top_tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    top_tags.truncate(10);

    let mut sentiment_distribution: Vec<SentimentCount> = sentiment_counts
        .into_iter()
        .map(|(sentiment, count)| SentimentCount { sentiment, count })
        .collect();
    sentiment_distribution.sort_by(|a, b| b.count.cmp(&a.count));

    WritingInsights {
        total_entries,
        total_words,
        avg_words_per_entry: if total_entries > 0 {
            round1(total_words as f64 / total_entries as f64)
        } else {
            0.0
        },
        entries_with_distortions,
        important_entries,
        resolved_entries,
        most_common_mood,
        weekday_frequency,
        top_tags,
        sentiment_distribution,
    }
}
