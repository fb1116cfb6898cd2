//! Entry CRUD handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use reflect_core::db::EntryFilter;
use reflect_core::types::{EntryPatch, JournalEntry, NewEntry};
use serde::{Deserialize, Serialize};

use super::{ai, ApiError, AppState, OwnerId};

/// Query parameters for entry listing.
///
/// Everything arrives as a string and is parsed leniently; malformed
/// values fall back to defaults rather than rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    mood: Option<String>,
    tag: Option<String>,
    search: Option<String>,
    since: Option<String>,
    until: Option<String>,
    is_important: Option<String>,
    is_resolved: Option<String>,
    sort: Option<String>,
    dir: Option<String>,
    page: Option<String>,
    per_page: Option<String>,
}

fn parse_time(value: &Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl ListQuery {
    fn into_filter(self) -> EntryFilter {
        EntryFilter {
            mood: self.mood.as_deref().and_then(|s| s.parse().ok()),
            tag: self.tag,
            search: self.search,
            since: parse_time(&self.since),
            until: parse_time(&self.until),
            is_important: self.is_important.as_deref().and_then(|s| s.parse().ok()),
            is_resolved: self.is_resolved.as_deref().and_then(|s| s.parse().ok()),
            sort: self
                .sort
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            dir: self
                .dir
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            page: self
                .page
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1),
            per_page: self
                .per_page
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

/// Pagination envelope for entry listings
#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub entries: Vec<JournalEntry>,
    pub total: i64,
    pub page: usize,
    pub per_page: usize,
}

/// POST /api/entries
pub async fn create(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(input): Json<NewEntry>,
) -> Result<(StatusCode, Json<JournalEntry>), ApiError> {
    let entry = input.into_entry(&owner)?;
    state.db.insert_entry(&entry)?;

    tracing::info!(id = %entry.id, words = entry.word_count, "Entry created");

    // Analysis runs in the background; the entry is persisted either way.
    if state.provider.is_some() {
        tokio::spawn(ai::analyze_in_background(
            state.clone(),
            owner,
            entry.clone(),
        ));
    }

    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/entries
pub async fn list(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Query(query): Query<ListQuery>,
) -> Result<Json<EntryListResponse>, ApiError> {
    let filter = query.into_filter();
    let page = filter.page();
    let per_page = filter.per_page();
    let result = state.db.list_entries(&owner, &filter)?;

    Ok(Json(EntryListResponse {
        entries: result.entries,
        total: result.total,
        page,
        per_page,
    }))
}

/// GET /api/entries/{id}
pub async fn fetch(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
) -> Result<Json<JournalEntry>, ApiError> {
    state
        .db
        .get_entry(&owner, &id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("entry {} not found", id)))
}

/// PUT /api/entries/{id}
pub async fn update(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
    Json(patch): Json<EntryPatch>,
) -> Result<Json<JournalEntry>, ApiError> {
    let mut entry = state
        .db
        .get_entry(&owner, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("entry {} not found", id)))?;

    let content_changed = patch.apply(&mut entry)?;
    state.db.update_entry(&entry)?;

    if content_changed {
        tracing::info!(id = %entry.id, "Content changed, analysis reset");
        if state.provider.is_some() {
            tokio::spawn(ai::analyze_in_background(
                state.clone(),
                owner,
                entry.clone(),
            ));
        }
    }

    Ok(Json(entry))
}

/// DELETE /api/entries/{id}
pub async fn delete(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.db.delete_entry(&owner, &id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("entry {} not found", id)))
    }
}

/// Tag with its usage count
#[derive(Debug, Serialize)]
pub struct TagInfo {
    pub tag: String,
    pub count: i64,
}

/// GET /api/entries/tags
pub async fn tags(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
) -> Result<Json<Vec<TagInfo>>, ApiError> {
    let tags = state
        .db
        .distinct_tags(&owner)?
        .into_iter()
        .map(|(tag, count)| TagInfo { tag, count })
        .collect();
    Ok(Json(tags))
}
