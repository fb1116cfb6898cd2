//! Mood trends over time
//!
//! Groups entries into calendar buckets and reports per-mood counts and
//! average intensities for each bucket.

use crate::analytics::round1;
use crate::types::{JournalEntry, Mood};
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Calendar bucket granularity for trend queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bucket {
    #[default]
    Day,
    Week,
    Month,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Day => "day",
            Bucket::Week => "week",
            Bucket::Month => "month",
        }
    }

    /// Bucket key for a timestamp, in UTC.
    ///
    /// Days are `YYYY-MM-DD`, weeks use the ISO week year (`GGGG-Www`),
    /// months are `YYYY-MM`. Keys sort lexicographically in time order.
    pub fn key(&self, ts: DateTime<Utc>) -> String {
        match self {
            Bucket::Day => ts.format("%Y-%m-%d").to_string(),
            Bucket::Week => {
                let iso = ts.iso_week();
                format!("{}-W{:02}", iso.year(), iso.week())
            }
            Bucket::Month => ts.format("%Y-%m").to_string(),
        }
    }
}

impl std::str::FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Bucket::Day),
            "week" => Ok(Bucket::Week),
            "month" => Ok(Bucket::Month),
            _ => Err(format!("unknown bucket: {}", s)),
        }
    }
}

/// Per-mood stats within one bucket
#[derive(Debug, Clone, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: i64,
    /// Average mood intensity, one decimal place
    pub avg_intensity: f64,
}

/// One bucket of the mood trend series
#[derive(Debug, Clone, Serialize)]
pub struct MoodTrendPoint {
    /// Bucket key (day, ISO week, or month)
    pub bucket: String,
    /// Total entries in this bucket
    pub total: i64,
    /// Per-mood breakdown, sorted by count descending
    pub moods: Vec<MoodCount>,
}

/// Group entries into buckets and summarize moods per bucket.
///
/// Two passes: first group by (bucket, mood) accumulating counts and
/// intensity sums, then map groups into the output series. Buckets are
/// ascending; the per-bucket totals sum to the entry count.
pub fn mood_trends(entries: &[JournalEntry], bucket: Bucket) -> Vec<MoodTrendPoint> {
    let mut groups: BTreeMap<String, BTreeMap<Mood, (i64, i64)>> = BTreeMap::new();

    for entry in entries {
        let key = bucket.key(entry.created_at);
        let (count, intensity_sum) = groups
            .entry(key)
            .or_default()
            .entry(entry.mood)
            .or_insert((0, 0));
        *count += 1;
        *intensity_sum += entry.mood_intensity as i64;
    }

    groups
        .into_iter()
        .map(|(key, moods)| {
            let total = moods.values().map(|(count, _)| count).sum();
            let mut moods: Vec<MoodCount> = moods
                .into_iter()
                .map(|(mood, (count, intensity_sum))| MoodCount {
                    mood,
                    count,
                    avg_intensity: round1(intensity_sum as f64 / count as f64),
                })
                .collect();
            moods.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mood.cmp(&b.mood)));

            MoodTrendPoint {
                bucket: key,
                total,
                moods,
            }
        })
        .collect()
}
