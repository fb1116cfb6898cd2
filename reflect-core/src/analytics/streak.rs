//! Journaling streak calculation

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

/// Current journaling streak in days.
///
/// Collapses timestamps to UTC calendar days and walks backward from
/// `today`, stopping at the first inactive day. A day with no entry today
/// means the streak is 0: do it today or lose it. Multiple entries on the
/// same day count once.
pub fn current_streak(timestamps: &[DateTime<Utc>], today: NaiveDate) -> u32 {
    let active_days: HashSet<NaiveDate> = timestamps.iter().map(|ts| ts.date_naive()).collect();

    let mut streak = 0;
    let mut day = today;
    while active_days.contains(&day) {
        streak += 1;
        day -= chrono::Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(days_ago: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap() - Duration::days(days_ago)
    }

    fn today() -> NaiveDate {
        ts(0).date_naive()
    }

    #[test]
    fn test_three_consecutive_days() {
        let stamps = vec![ts(0), ts(1), ts(2)];
        assert_eq!(current_streak(&stamps, today()), 3);
    }

    #[test]
    fn test_no_entry_today_is_zero() {
        let stamps = vec![ts(2)];
        assert_eq!(current_streak(&stamps, today()), 0);
    }

    #[test]
    fn test_gap_breaks_streak() {
        // Active today and yesterday, gap at T-2, active again at T-3
        let stamps = vec![ts(0), ts(1), ts(3), ts(4)];
        assert_eq!(current_streak(&stamps, today()), 2);
    }

    #[test]
    fn test_multiple_entries_same_day_count_once() {
        let stamps = vec![ts(0), ts(0), ts(0), ts(1)];
        assert_eq!(current_streak(&stamps, today()), 2);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(current_streak(&[], today()), 0);
    }
}
