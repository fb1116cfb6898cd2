//! Analytics report handlers
//!
//! Each handler loads a window of entries and delegates to the
//! aggregators in reflect-core. Window sizes are clamped; malformed
//! query values fall back to defaults.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use reflect_core::analytics::{
    self, Bucket, Dashboard, DistortionReport, JournalStats, MoodTrendPoint, ProgressReport,
    TimeWindow, WritingInsights,
};
use serde::Deserialize;

use super::{ApiError, AppState, OwnerId};

const DASHBOARD_DAYS: u32 = 7;
const DASHBOARD_RECENT: usize = 5;
const STREAK_LOOKBACK_DAYS: i64 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    days: Option<String>,
    group_by: Option<String>,
    examples: Option<String>,
}

impl WindowQuery {
    fn days(&self, default: u32) -> u32 {
        analytics::clamp_days(self.days.as_deref().and_then(|s| s.parse().ok()), default)
    }

    fn bucket(&self) -> Bucket {
        self.group_by
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// `examples=false` requests the summary shape without example
    /// sentences
    fn with_examples(&self) -> bool {
        self.examples
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(true)
    }
}

fn window(state: &AppState, query: &WindowQuery) -> (TimeWindow, u32) {
    let days = query.days(state.config.analytics.default_window_days);
    (TimeWindow::last_days(days, Utc::now()), days)
}

/// GET /api/analytics/mood-trends
pub async fn mood_trends(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<MoodTrendPoint>>, ApiError> {
    let (win, _) = window(&state, &query);
    let entries = state.db.entries_in_window(&owner, win.since, win.until)?;
    Ok(Json(analytics::mood_trends(&entries, query.bucket())))
}

/// GET /api/analytics/distortions
pub async fn distortions(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<DistortionReport>, ApiError> {
    let (win, _) = window(&state, &query);
    let entries = state.db.entries_in_window(&owner, win.since, win.until)?;
    let max_examples = if query.with_examples() {
        state.config.analytics.max_examples
    } else {
        0
    };
    Ok(Json(analytics::aggregate_distortions(&entries, max_examples)))
}

/// GET /api/analytics/progress
pub async fn progress(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ProgressReport>, ApiError> {
    let (win, days) = window(&state, &query);
    let prev = win.previous();

    let current = state.db.entries_in_window(&owner, win.since, win.until)?;
    let previous = state.db.entries_in_window(&owner, prev.since, prev.until)?;

    Ok(Json(analytics::compare_progress(&current, &previous, days)))
}

/// GET /api/analytics/insights
pub async fn insights(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<WritingInsights>, ApiError> {
    let (win, _) = window(&state, &query);
    let entries = state.db.entries_in_window(&owner, win.since, win.until)?;
    Ok(Json(analytics::writing_insights(&entries)))
}

/// GET /api/analytics/stats
pub async fn stats(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<JournalStats>, ApiError> {
    let (win, _) = window(&state, &query);
    let prev = win.previous();

    let current = state.db.entries_in_window(&owner, win.since, win.until)?;
    let previous = state.db.entries_in_window(&owner, prev.since, prev.until)?;

    let timestamps = state
        .db
        .entry_timestamps(&owner, Utc::now() - Duration::days(STREAK_LOOKBACK_DAYS))?;
    let streak = analytics::current_streak(&timestamps, Utc::now().date_naive());

    Ok(Json(analytics::journal_stats(&current, &previous, streak)))
}

/// GET /api/analytics/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Dashboard>, ApiError> {
    let days = query.days(DASHBOARD_DAYS);
    let win = TimeWindow::last_days(days, Utc::now());

    let recent = state.db.recent_entries(&owner, DASHBOARD_RECENT)?;
    let entries = state.db.entries_in_window(&owner, win.since, win.until)?;

    let timestamps = state
        .db
        .entry_timestamps(&owner, Utc::now() - Duration::days(STREAK_LOOKBACK_DAYS))?;
    let streak = analytics::current_streak(&timestamps, Utc::now().date_naive());

    Ok(Json(analytics::dashboard(&recent, &entries, streak)))
}
