//! Gemini-backed analysis provider
//!
//! Calls the Gemini generateContent REST API with a prompt embedding the
//! cognitive distortion catalog, then validates and cleans the model's
//! JSON before it reaches storage.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::types::{
    Analysis, Distortion, DistortionKind, Mood, Reframe, Sentiment, MAX_KEY_THEMES, MAX_THEME_LEN,
};

use super::{AnalysisProvider, MoodDetection};

const MAX_DISTORTIONS: usize = 10;
const MAX_SENTENCE_LEN: usize = 200;
const MAX_EXPLANATION_LEN: usize = 500;
const MAX_TECHNIQUE_LEN: usize = 100;

/// Analysis provider backed by the Gemini generateContent API
pub struct GeminiProvider {
    config: ProviderConfig,
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Create a provider from configuration.
    ///
    /// Returns an error if no API key is configured.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let api_key = config
            .resolved_api_key()
            .ok_or_else(|| Error::Config("provider.api_key is required".to_string()))?;

        let base_url = config.endpoint.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key)
                .map_err(|e| Error::Config(format!("invalid api_key: {}", e)))?,
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
            api_key,
        })
    }

    fn analysis_prompt(title: &str, content: &str, mood: Mood) -> String {
        let catalog = DistortionKind::all()
            .iter()
            .map(|k| format!("- {}: {}", k.as_str(), k.description()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a supportive listener reviewing a journal entry for cognitive distortions.

COGNITIVE DISTORTIONS TO DETECT:
{catalog}

INSTRUCTIONS:
1. Read the journal entry carefully.
2. For each distortion found, quote the specific sentence, explain why it fits, and give a confidence score between 0.0 and 1.0.
3. Suggest 1-3 healthier reframes using CBT techniques.
4. Determine the overall sentiment (very-negative, negative, neutral, positive, very-positive).
5. Identify up to 5 key themes.

RESPONSE FORMAT (JSON only, no extra text):
{{
  "distortions": [
    {{"kind": "distortion-key", "sentence": "...", "explanation": "...", "confidence": 0.9}}
  ],
  "reframes": [
    {{"original": "...", "reframed": "...", "technique": "..."}}
  ],
  "sentiment": "...",
  "key_themes": ["..."]
}}

JOURNAL ENTRY

Title: {title}
Reported mood: {mood}
Content: {content}

Return only valid JSON."#,
        )
    }

    fn mood_prompt(content: &str, title: &str) -> String {
        let catalog = Mood::all()
            .iter()
            .map(|m| format!("- {}", m.as_str()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"Classify the dominant mood of this journal text.

ALLOWED MOODS (use exactly one of these identifiers):
{catalog}

RESPONSE FORMAT (JSON only, no extra text):
{{"mood": "mood-identifier", "confidence": 0.8, "explanation": "..."}}

JOURNAL TEXT

Title: {title}
Content: {content}

Return only valid JSON."#,
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.config.model
        );

        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 2048,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let result: GenerateResponse = response
                .json()
                .await
                .map_err(|e| Error::Provider(format!("failed to parse response: {}", e)))?;
            result
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().next())
                .map(|p| p.text)
                .ok_or_else(|| Error::Provider("empty model response".to_string()))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Provider(format!(
                "API error ({}): {}",
                status, error_text
            )))
        }
    }

    async fn generate_with_retry(&self, prompt: &str) -> Result<String> {
        let mut last_error = None;
        let mut delay = Duration::from_millis(500);

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tracing::debug!(
                    "Retrying generateContent (attempt {}/{}), waiting {:?}",
                    attempt + 1,
                    self.config.max_retries + 1,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(30));
            }

            match self.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if is_retryable_error(&e) {
                        tracing::warn!("Transient provider error: {}", e);
                        last_error = Some(e);
                        continue;
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Provider("max retries exceeded".to_string())))
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    async fn analyze(&self, title: &str, content: &str, mood: Mood) -> Result<Analysis> {
        let prompt = Self::analysis_prompt(title, content, mood);
        let text = self.generate_with_retry(&prompt).await?;

        let raw: RawAnalysis = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| Error::Provider(format!("model returned invalid JSON: {}", e)))?;

        let mut analysis = clean_analysis(raw);
        analysis.mark_processed();
        Ok(analysis)
    }

    async fn detect_mood(&self, content: &str, title: &str) -> Result<MoodDetection> {
        let prompt = Self::mood_prompt(content, title);
        let text = self.generate_with_retry(&prompt).await?;

        let raw: RawMoodDetection = serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| Error::Provider(format!("model returned invalid JSON: {}", e)))?;

        Ok(clean_mood_detection(raw))
    }

    async fn health(&self) -> Result<bool> {
        let url = format!(
            "{}/models/{}?key={}",
            self.base_url, self.config.model, self.api_key
        );

        match self.http_client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ============================================
// Wire types
// ============================================

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// The model's JSON before validation. Everything is optional and
/// loosely typed; cleaning decides what survives.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    distortions: Vec<RawDistortion>,
    #[serde(default)]
    reframes: Vec<RawReframe>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    key_themes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDistortion {
    #[serde(default)]
    kind: String,
    #[serde(default)]
    sentence: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct RawMoodDetection {
    #[serde(default)]
    mood: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct RawReframe {
    #[serde(default)]
    original: String,
    #[serde(default)]
    reframed: String,
    #[serde(default)]
    technique: String,
}

// ============================================
// Response cleaning
// ============================================

/// Strip optional markdown code fences from model output
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Validate the raw model output against the domain model.
///
/// Unknown distortion kinds are dropped, confidence is clamped to
/// [0, 1], text fields are length-capped, and themes are limited to
/// five.
fn clean_analysis(raw: RawAnalysis) -> Analysis {
    let distortions: Vec<Distortion> = raw
        .distortions
        .into_iter()
        .filter_map(|d| {
            let kind: DistortionKind = d.kind.parse().ok()?;
            Some(Distortion {
                kind,
                sentence: truncate_chars(&d.sentence, MAX_SENTENCE_LEN),
                explanation: truncate_chars(&d.explanation, MAX_EXPLANATION_LEN),
                confidence: d.confidence.clamp(0.0, 1.0),
            })
        })
        .take(MAX_DISTORTIONS)
        .collect();

    let reframes: Vec<Reframe> = raw
        .reframes
        .into_iter()
        .filter(|r| !r.original.trim().is_empty() && !r.reframed.trim().is_empty())
        .map(|r| Reframe {
            original: truncate_chars(&r.original, MAX_EXPLANATION_LEN),
            reframed: truncate_chars(&r.reframed, MAX_EXPLANATION_LEN),
            technique: truncate_chars(&r.technique, MAX_TECHNIQUE_LEN),
        })
        .collect();

    let sentiment = raw
        .sentiment
        .as_deref()
        .and_then(|s| s.parse::<Sentiment>().ok())
        .unwrap_or(Sentiment::Neutral);

    let key_themes: Vec<String> = raw
        .key_themes
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| truncate_chars(t.trim(), MAX_THEME_LEN))
        .take(MAX_KEY_THEMES)
        .collect();

    Analysis {
        processed: false,
        distortions,
        reframes,
        sentiment: Some(sentiment),
        key_themes,
        processed_at: None,
        processing_error: None,
    }
}

/// Validate a raw mood classification.
///
/// An unknown mood identifier falls back to neutral at 0.5 confidence
/// rather than failing the request.
fn clean_mood_detection(raw: RawMoodDetection) -> MoodDetection {
    match raw.mood.parse::<Mood>() {
        Ok(mood) => MoodDetection {
            mood,
            confidence: raw.confidence.clamp(0.0, 1.0),
            explanation: truncate_chars(&raw.explanation, MAX_EXPLANATION_LEN),
        },
        Err(_) => MoodDetection::neutral("could not determine a clear mood"),
    }
}

/// Check if an error is transient and worth retrying
fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Provider(msg) => {
            // Retry on 5xx and rate limiting
            (msg.contains("API error") && (msg.contains("50") || msg.contains("429")))
                // Retry on network/timeout errors
                || msg.contains("timeout")
                || msg.contains("connection")
                || msg.contains("request failed")
        }
        _ => false,
    }
}
