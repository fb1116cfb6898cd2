//! Analytics module for reflect
//!
//! Pure in-process reductions over journal entries. Each aggregator takes
//! the entries for one owner and one lookback window (fetched by the
//! repository) and groups them in memory; nothing here touches SQL.
//!
//! Conventions shared by every aggregator:
//! - Windows are `[now - days, now)` in UTC, `days` clamped to 1..=365
//! - Empty windows produce empty or zero-valued results, never errors
//! - Percentages are rounded to one decimal place

pub mod distortions;
pub mod insights;
pub mod overview;
pub mod progress;
pub mod streak;
pub mod trends;

pub use distortions::{aggregate_distortions, DistortionReport, DistortionStat};
pub use insights::{writing_insights, WritingInsights};
pub use overview::{dashboard, journal_stats, Dashboard, JournalStats};
pub use progress::{compare_progress, Indicator, ProgressReport, Trend};
pub use streak::current_streak;
pub use trends::{mood_trends, Bucket, MoodTrendPoint};

use chrono::{DateTime, Duration, Utc};

/// A half-open lookback window `[since, until)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    /// The last `days` days ending at `until`
    pub fn last_days(days: u32, until: DateTime<Utc>) -> Self {
        Self {
            since: until - Duration::days(days as i64),
            until,
        }
    }

    /// The window of equal length immediately before this one
    pub fn previous(&self) -> Self {
        let len = self.until - self.since;
        Self {
            since: self.since - len,
            until: self.since,
        }
    }
}

/// Clamp a requested window size to 1..=365 days, falling back to the
/// default when absent. Malformed values are the caller's problem; they
/// should arrive here already parsed or defaulted.
pub fn clamp_days(days: Option<u32>, default: u32) -> u32 {
    days.unwrap_or(default).clamp(1, 365)
}

/// Percent change from `previous` to `current`, one decimal place.
///
/// A zero or missing baseline yields 0 rather than a blow-up: "no prior
/// data" reads as "no change".
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        round1((current - previous) / previous * 100.0)
    }
}

/// Round to one decimal place
pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to two decimal places
pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
