//! Integration tests for the HTTP API
//!
//! These drive the router directly with `tower::ServiceExt::oneshot`
//! against an in-memory database and a scripted analysis provider.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use reflect_core::provider::{AnalysisProvider, MoodDetection};
use reflect_core::types::{Analysis, Distortion, DistortionKind, JournalEntry, Mood, NewEntry, Sentiment};
use reflect_core::{Config, Database};
use reflect_server::api::{self, AppState};
use tower::util::ServiceExt;

const OWNER: &str = "owner-1";

/// Provider that always finds one catastrophizing distortion
struct ScriptedProvider;

#[async_trait]
impl AnalysisProvider for ScriptedProvider {
    async fn analyze(
        &self,
        _title: &str,
        content: &str,
        _mood: Mood,
    ) -> reflect_core::Result<Analysis> {
        let mut analysis = Analysis {
            distortions: vec![Distortion {
                kind: DistortionKind::Catastrophizing,
                sentence: content.chars().take(50).collect(),
                explanation: "worst-case framing".to_string(),
                confidence: 0.9,
            }],
            sentiment: Some(Sentiment::Negative),
            ..Default::default()
        };
        analysis.mark_processed();
        Ok(analysis)
    }

    async fn detect_mood(
        &self,
        _content: &str,
        _title: &str,
    ) -> reflect_core::Result<MoodDetection> {
        Ok(MoodDetection {
            mood: Mood::Hopeful,
            confidence: 0.8,
            explanation: "forward-looking language".to_string(),
        })
    }

    async fn health(&self) -> reflect_core::Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Provider that always fails
struct FailingProvider;

#[async_trait]
impl AnalysisProvider for FailingProvider {
    async fn analyze(
        &self,
        _title: &str,
        _content: &str,
        _mood: Mood,
    ) -> reflect_core::Result<Analysis> {
        Err(reflect_core::Error::Provider(
            "model unavailable".to_string(),
        ))
    }

    async fn detect_mood(
        &self,
        _content: &str,
        _title: &str,
    ) -> reflect_core::Result<MoodDetection> {
        Err(reflect_core::Error::Provider(
            "model unavailable".to_string(),
        ))
    }

    async fn health(&self) -> reflect_core::Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn setup(provider: Option<Arc<dyn AnalysisProvider>>) -> (Router, Arc<AppState>) {
    let db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let state = Arc::new(AppState {
        db,
        provider,
        config: Config::default(),
    });
    (api::router(state.clone()), state)
}

/// Insert an entry directly, bypassing the HTTP layer
fn seed_entry(state: &AppState, title: &str) -> JournalEntry {
    let entry = NewEntry {
        title: title.to_string(),
        content: "today everything went wrong and it always will".to_string(),
        mood: Mood::Anxious,
        mood_intensity: 4,
        tags: vec!["work".to_string(), "sleep".to_string()],
        is_important: false,
        is_resolved: false,
    }
    .into_entry(OWNER)
    .unwrap();
    state.db.insert_entry(&entry).unwrap();
    entry
}

fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-owner-id", OWNER);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn new_entry_json(title: &str) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "content": "today everything went wrong and it always will",
        "mood": "anxious",
        "mood_intensity": 4,
        "tags": ["Work ", "sleep"]
    })
}

// ============================================
// Entry CRUD
// ============================================

#[tokio::test]
async fn test_health() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_owner_header_is_unauthorized() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(Request::get("/api/entries").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("x-owner-id"));
}

#[tokio::test]
async fn test_create_and_fetch_entry() {
    let (app, _) = setup(None);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/entries",
            Some(new_entry_json("rough day")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = json_body(response).await;
    assert_eq!(created["title"], "rough day");
    assert_eq!(created["word_count"], 8);
    assert_eq!(created["tags"], serde_json::json!(["work", "sleep"]));
    assert_eq!(created["analysis"]["processed"], false);

    let id = created["id"].as_str().unwrap();
    let response = app
        .oneshot(request("GET", &format!("/api/entries/{}", id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_rejects_empty_title() {
    let (app, _) = setup(None);
    let mut body = new_entry_json("x");
    body["title"] = serde_json::json!("   ");

    let response = app
        .oneshot(request("POST", "/api/entries", Some(body)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_envelope() {
    let (app, state) = setup(None);

    for i in 0..12 {
        seed_entry(&state, &format!("entry {}", i));
    }

    let response = app
        .oneshot(request("GET", "/api/entries?per_page=10&page=2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 12);
    assert_eq!(body["page"], 2);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_other_owner_cannot_see_entry() {
    let (app, state) = setup(None);
    let entry = seed_entry(&state, "mine");

    let response = app
        .oneshot(
            Request::get(format!("/api/entries/{}", entry.id))
                .header("x-owner-id", "other-owner")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete() {
    let (app, state) = setup(None);
    let entry = seed_entry(&state, "before");

    let response = app
        .clone()
        .oneshot(request(
            "PUT",
            &format!("/api/entries/{}", entry.id),
            Some(serde_json::json!({"title": "after", "is_resolved": true})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "after");
    assert_eq!(updated["is_resolved"], true);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/api/entries/{}", entry.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request("GET", &format!("/api/entries/{}", entry.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_edit_resets_analysis() {
    let (app, state) = setup(None);
    let mut entry = seed_entry(&state, "analyzed");
    entry.analysis.mark_processed();
    state
        .db
        .store_analysis(OWNER, &entry.id, &entry.analysis)
        .unwrap();

    let response = app
        .oneshot(request(
            "PUT",
            &format!("/api/entries/{}", entry.id),
            Some(serde_json::json!({"content": "a completely different reflection"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["analysis"]["processed"], false);
    assert_eq!(body["word_count"], 4);
}

#[tokio::test]
async fn test_tags_endpoint() {
    let (app, state) = setup(None);
    seed_entry(&state, "a");
    seed_entry(&state, "b");

    let response = app
        .oneshot(request("GET", "/api/entries/tags", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let tags = body.as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["count"], 2);
}

// ============================================
// Analysis Endpoints
// ============================================

#[tokio::test]
async fn test_analyze_entry_on_demand() {
    let (app, state) = setup(Some(Arc::new(ScriptedProvider)));
    let entry = seed_entry(&state, "worry");

    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/ai/analyze/{}", entry.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["skipped"], false);
    assert_eq!(body["entry"]["analysis"]["processed"], true);
    assert_eq!(
        body["entry"]["analysis"]["distortions"][0]["kind"],
        "catastrophizing"
    );

    // A second run within the cooldown is skipped
    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/ai/analyze/{}", entry.id), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["skipped"], true);

    // force=true reruns
    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/ai/analyze/{}?force=true", entry.id),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["skipped"], false);
}

#[tokio::test]
async fn test_analyze_failure_recorded_as_bad_gateway() {
    let (app, state) = setup(Some(Arc::new(FailingProvider)));
    let entry = seed_entry(&state, "x");

    let response = app
        .clone()
        .oneshot(request("POST", &format!("/api/ai/analyze/{}", entry.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // The failure is recorded on the entry without flipping processed
    let response = app
        .oneshot(request("GET", &format!("/api/entries/{}", entry.id), None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["analysis"]["processed"], false);
    assert!(body["analysis"]["processing_error"]
        .as_str()
        .unwrap()
        .contains("model unavailable"));
}

#[tokio::test]
async fn test_analyze_without_provider() {
    let (app, state) = setup(None);
    let entry = seed_entry(&state, "x");

    let response = app
        .oneshot(request("POST", &format!("/api/ai/analyze/{}", entry.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_batch_analyze_without_provider() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(request(
            "POST",
            "/api/ai/batch-analyze",
            Some(serde_json::json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_batch_analyze_respects_limit() {
    let (app, state) = setup(Some(Arc::new(ScriptedProvider)));
    for i in 0..3 {
        seed_entry(&state, &format!("entry {}", i));
    }

    let response = app
        .oneshot(request(
            "POST",
            "/api/ai/batch-analyze",
            Some(serde_json::json!({"limit": 2})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["requested"], 2);
    assert_eq!(body["analyzed"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"][0]["ok"], true);
}

#[tokio::test]
async fn test_detect_mood() {
    let (app, _) = setup(Some(Arc::new(ScriptedProvider)));

    let response = app
        .oneshot(request(
            "POST",
            "/api/ai/detect-mood",
            Some(serde_json::json!({
                "content": "tomorrow feels like a fresh start",
                "title": "looking ahead"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["mood"], "hopeful");
    assert_eq!(body["confidence"], 0.8);
    assert!(body["explanation"].as_str().is_some());
}

#[tokio::test]
async fn test_detect_mood_rejects_short_content() {
    let (app, _) = setup(Some(Arc::new(ScriptedProvider)));

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/ai/detect-mood",
            Some(serde_json::json!({"content": "meh"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request(
            "POST",
            "/api/ai/detect-mood",
            Some(serde_json::json!({"content": "   "})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_detect_mood_without_provider() {
    let (app, _) = setup(None);

    let response = app
        .oneshot(request(
            "POST",
            "/api/ai/detect-mood",
            Some(serde_json::json!({"content": "a long enough piece of text"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_distortion_catalog() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(request("GET", "/api/ai/distortions", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let kinds = body.as_array().unwrap();
    assert_eq!(kinds.len(), 12);
    assert!(kinds.iter().any(|k| k["kind"] == "all-or-nothing"));
}

#[tokio::test]
async fn test_provider_status() {
    let (app, _) = setup(Some(Arc::new(ScriptedProvider)));
    let response = app
        .oneshot(request("GET", "/api/ai/status", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["configured"], true);
    assert_eq!(body["healthy"], true);
    assert_eq!(body["provider"], "scripted");

    let (app, _) = setup(None);
    let response = app
        .oneshot(request("GET", "/api/ai/status", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["configured"], false);
}

// ============================================
// Analytics Endpoints
// ============================================

#[tokio::test]
async fn test_dashboard_on_empty_journal() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(request("GET", "/api/analytics/dashboard", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["quick_stats"]["total_entries"], 0);
    assert_eq!(body["streak_days"], 0);
    assert!(body["recent"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analytics_reports_after_writes() {
    let (app, state) = setup(None);
    for i in 0..4 {
        seed_entry(&state, &format!("entry {}", i));
    }

    let response = app
        .clone()
        .oneshot(request("GET", "/api/analytics/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total_entries"], 4);
    assert_eq!(body["avg_mood_score"], 4.0);
    assert_eq!(body["streak_days"], 1);

    let response = app
        .clone()
        .oneshot(request(
            "GET",
            "/api/analytics/mood-trends?group_by=day",
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body[0]["total"], 4);
    assert_eq!(body[0]["moods"][0]["mood"], "anxious");

    let response = app
        .clone()
        .oneshot(request("GET", "/api/analytics/progress", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["journaling_consistency"]["current"], 4.0);
    assert_eq!(body["journaling_consistency"]["trend"], "improving");

    let response = app
        .oneshot(request("GET", "/api/analytics/insights", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total_entries"], 4);
    assert_eq!(body["most_common_mood"], "anxious");
}

#[tokio::test]
async fn test_distortions_summary_without_examples() {
    let (app, state) = setup(None);
    let mut entry = seed_entry(&state, "analyzed");
    entry.analysis.distortions = vec![Distortion {
        kind: DistortionKind::Catastrophizing,
        sentence: "everything went wrong".to_string(),
        explanation: "worst-case framing".to_string(),
        confidence: 0.9,
    }];
    entry.analysis.mark_processed();
    state
        .db
        .store_analysis(OWNER, &entry.id, &entry.analysis)
        .unwrap();

    // Default shape carries examples
    let response = app
        .clone()
        .oneshot(request("GET", "/api/analytics/distortions", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["distortions"][0]["count"], 1);
    assert_eq!(body["distortions"][0]["examples"].as_array().unwrap().len(), 1);

    // examples=false returns the summary shape
    let response = app
        .oneshot(request("GET", "/api/analytics/distortions?examples=false", None))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total_distortions"], 1);
    assert_eq!(body["distortions"][0]["count"], 1);
    assert!(body["distortions"][0]["examples"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_days_falls_back_to_default() {
    let (app, _) = setup(None);
    let response = app
        .oneshot(request(
            "GET",
            "/api/analytics/mood-trends?days=banana",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
