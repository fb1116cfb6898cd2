//! Analysis endpoints
//!
//! On-demand and batch analysis plus provider introspection. Analysis
//! failures are recorded on the entry and never corrupt stored content.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use reflect_core::provider::MoodDetection;
use reflect_core::types::{DistortionKind, JournalEntry};
use serde::{Deserialize, Serialize};

use super::{ApiError, AppState, OwnerId};

const MAX_BATCH_LIMIT: usize = 20;

/// Skip re-analysis when the last run is this recent
fn reanalyze_cooldown() -> Duration {
    Duration::hours(1)
}

/// Run analysis for an entry and persist the outcome.
///
/// On provider failure the error is recorded on the entry's analysis and
/// propagated to the caller.
async fn analyze_and_store(
    state: &AppState,
    owner: &str,
    entry: &JournalEntry,
) -> Result<JournalEntry, ApiError> {
    let provider = state
        .provider
        .as_ref()
        .ok_or_else(|| ApiError::ProviderUnavailable("no provider configured".to_string()))?;

    // The store is guarded on updated_at: if the entry was edited while
    // the provider ran, the result describes text that no longer exists
    // and is discarded.
    match provider
        .analyze(&entry.title, &entry.content, entry.mood)
        .await
    {
        Ok(analysis) => {
            let stored =
                state
                    .db
                    .store_analysis_if_current(owner, &entry.id, &analysis, entry.updated_at)?;
            if !stored {
                tracing::debug!(id = %entry.id, "Entry changed during analysis, result discarded");
                return Ok(entry.clone());
            }
            tracing::info!(
                id = %entry.id,
                distortions = analysis.distortions.len(),
                "Entry analyzed"
            );
            let mut updated = entry.clone();
            updated.analysis = analysis;
            Ok(updated)
        }
        Err(e) => {
            let mut failed = entry.analysis.clone();
            failed.mark_failed(e.to_string());
            state
                .db
                .store_analysis_if_current(owner, &entry.id, &failed, entry.updated_at)?;
            tracing::warn!(id = %entry.id, error = %e, "Analysis failed");
            Err(ApiError::ProviderFailed(e.to_string()))
        }
    }
}

/// Background analysis task spawned after entry writes.
///
/// Failures are recorded on the entry; the write itself already
/// succeeded.
pub async fn analyze_in_background(state: Arc<AppState>, owner: String, entry: JournalEntry) {
    if let Err(e) = analyze_and_store(&state, &owner, &entry).await {
        tracing::debug!(id = %entry.id, "Background analysis did not complete: {:?}", e);
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeQuery {
    force: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub entry: JournalEntry,
    pub skipped: bool,
}

/// POST /api/ai/analyze/{id}
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Path(id): Path<String>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let entry = state
        .db
        .get_entry(&owner, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("entry {} not found", id)))?;

    let force = query
        .force
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(false);

    if !force && entry.analysis.processed {
        let recent = entry
            .analysis
            .processed_at
            .map(|at| Utc::now() - at < reanalyze_cooldown())
            .unwrap_or(false);
        if recent {
            tracing::debug!(id = %entry.id, "Analysis still fresh, skipping");
            return Ok(Json(AnalyzeResponse {
                entry,
                skipped: true,
            }));
        }
    }

    let entry = analyze_and_store(&state, &owner, &entry).await?;
    Ok(Json(AnalyzeResponse {
        entry,
        skipped: false,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct BatchRequest {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub requested: usize,
    pub analyzed: usize,
    pub results: Vec<BatchItem>,
}

/// POST /api/ai/batch-analyze
///
/// Analyzes the oldest unprocessed entries first. Individual failures
/// are reported per entry; the batch keeps going.
pub async fn batch_analyze(
    State(state): State<Arc<AppState>>,
    OwnerId(owner): OwnerId,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    if state.provider.is_none() {
        return Err(ApiError::ProviderUnavailable(
            "no provider configured".to_string(),
        ));
    }

    let limit = request
        .limit
        .unwrap_or(state.config.analytics.max_batch_size)
        .clamp(1, MAX_BATCH_LIMIT);

    let pending = state.db.unprocessed_entries(&owner, limit)?;
    let requested = pending.len();

    let mut results = Vec::with_capacity(requested);
    let mut analyzed = 0;
    for entry in &pending {
        match analyze_and_store(&state, &owner, entry).await {
            Ok(_) => {
                analyzed += 1;
                results.push(BatchItem {
                    id: entry.id.clone(),
                    ok: true,
                    error: None,
                });
            }
            Err(ApiError::ProviderFailed(msg)) => results.push(BatchItem {
                id: entry.id.clone(),
                ok: false,
                error: Some(msg),
            }),
            Err(other) => return Err(other),
        }
    }

    Ok(Json(BatchResponse {
        requested,
        analyzed,
        results,
    }))
}

/// Shortest content accepted for mood classification
const MIN_MOOD_CONTENT_CHARS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct DetectMoodRequest {
    pub content: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// POST /api/ai/detect-mood
///
/// Classifies draft text before the entry is saved, so clients can
/// pre-fill the mood selector.
pub async fn detect_mood(
    State(state): State<Arc<AppState>>,
    OwnerId(_owner): OwnerId,
    Json(request): Json<DetectMoodRequest>,
) -> Result<Json<MoodDetection>, ApiError> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest(
            "content is required for mood detection".to_string(),
        ));
    }
    if content.chars().count() < MIN_MOOD_CONTENT_CHARS {
        return Err(ApiError::BadRequest(
            "content too short for reliable mood detection".to_string(),
        ));
    }

    let provider = state
        .provider
        .as_ref()
        .ok_or_else(|| ApiError::ProviderUnavailable("no provider configured".to_string()))?;

    let detection = provider
        .detect_mood(content, request.title.as_deref().unwrap_or(""))
        .await
        .map_err(|e| ApiError::ProviderFailed(e.to_string()))?;

    Ok(Json(detection))
}

#[derive(Debug, Serialize)]
pub struct DistortionEntry {
    pub kind: DistortionKind,
    pub name: &'static str,
    pub description: &'static str,
}

/// GET /api/ai/distortions
pub async fn distortion_info() -> Json<Vec<DistortionEntry>> {
    let kinds = DistortionKind::all()
        .iter()
        .map(|k| DistortionEntry {
            kind: *k,
            name: k.name(),
            description: k.description(),
        })
        .collect();
    Json(kinds)
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub provider: Option<&'static str>,
    pub configured: bool,
    pub healthy: bool,
}

/// GET /api/ai/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    match &state.provider {
        Some(provider) => {
            let healthy = provider.health().await.unwrap_or(false);
            Json(StatusResponse {
                provider: Some(provider.name()),
                configured: true,
                healthy,
            })
        }
        None => Json(StatusResponse {
            provider: None,
            configured: false,
            healthy: false,
        }),
    }
}
