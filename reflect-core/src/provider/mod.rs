//! Analysis providers
//!
//! An [`AnalysisProvider`] takes a journal entry and produces an
//! [`Analysis`]: detected cognitive distortions, suggested reframes,
//! overall sentiment, and key themes. The only shipping implementation
//! talks to the Gemini API; tests substitute their own.

pub mod gemini;

pub use gemini::GeminiProvider;

use crate::types::{Analysis, Mood};
use async_trait::async_trait;
use serde::Serialize;

/// A mood classification for a piece of journal text
#[derive(Debug, Clone, Serialize)]
pub struct MoodDetection {
    pub mood: Mood,
    /// Classifier confidence in [0, 1]
    pub confidence: f64,
    pub explanation: String,
}

impl MoodDetection {
    /// The neutral fallback used when classification is inconclusive
    pub fn neutral(explanation: impl Into<String>) -> Self {
        MoodDetection {
            mood: Mood::Neutral,
            confidence: 0.5,
            explanation: explanation.into(),
        }
    }
}

/// A backend capable of analyzing journal entries
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Analyze an entry and return the completed analysis.
    ///
    /// Implementations must return an error rather than a partially
    /// populated analysis; the caller records failures on the entry.
    async fn analyze(&self, title: &str, content: &str, mood: Mood) -> crate::Result<Analysis>;

    /// Classify the mood of journal text before the entry is saved.
    async fn detect_mood(&self, content: &str, title: &str) -> crate::Result<MoodDetection>;

    /// Check whether the provider is reachable and configured.
    async fn health(&self) -> crate::Result<bool>;

    /// Provider identifier for status reporting
    fn name(&self) -> &'static str;
}
