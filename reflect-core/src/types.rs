//! Core domain types for reflect
//!
//! These types represent the canonical data model for journal entries and
//! the AI analysis attached to them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Entry** | A single journal entry written by an owner |
//! | **Owner** | The account an entry belongs to (identity comes from upstream auth) |
//! | **Mood** | Self-reported emotional label attached to an entry |
//! | **Distortion** | A cognitive distortion detected in entry text by the provider |
//! | **Reframe** | A suggested healthier rephrasing of a distorted thought |
//! | **Analysis** | The full provider output attached to an entry |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum content length in characters
pub const MAX_CONTENT_LEN: usize = 10_000;
/// Maximum tag length in characters
pub const MAX_TAG_LEN: usize = 30;
/// Maximum number of key themes kept per analysis
pub const MAX_KEY_THEMES: usize = 5;
/// Maximum key theme length in characters
pub const MAX_THEME_LEN: usize = 50;

// ============================================
// Mood
// ============================================

/// Self-reported mood attached to a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mood {
    VeryHappy,
    Happy,
    Content,
    Neutral,
    Anxious,
    Stressed,
    Sad,
    VerySad,
    Angry,
    Frustrated,
    Excited,
    Grateful,
    Hopeful,
    Overwhelmed,
    Confused,
    Lonely,
}

impl Mood {
    /// Returns the identifier used in database storage and the API
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::VeryHappy => "very-happy",
            Mood::Happy => "happy",
            Mood::Content => "content",
            Mood::Neutral => "neutral",
            Mood::Anxious => "anxious",
            Mood::Stressed => "stressed",
            Mood::Sad => "sad",
            Mood::VerySad => "very-sad",
            Mood::Angry => "angry",
            Mood::Frustrated => "frustrated",
            Mood::Excited => "excited",
            Mood::Grateful => "grateful",
            Mood::Hopeful => "hopeful",
            Mood::Overwhelmed => "overwhelmed",
            Mood::Confused => "confused",
            Mood::Lonely => "lonely",
        }
    }

    /// Moods counted toward the positivity ratio
    pub fn is_positive(&self) -> bool {
        matches!(
            self,
            Mood::VeryHappy
                | Mood::Happy
                | Mood::Content
                | Mood::Grateful
                | Mood::Hopeful
                | Mood::Excited
        )
    }

    /// All moods, in display order
    pub fn all() -> &'static [Mood] {
        &[
            Mood::VeryHappy,
            Mood::Happy,
            Mood::Content,
            Mood::Neutral,
            Mood::Anxious,
            Mood::Stressed,
            Mood::Sad,
            Mood::VerySad,
            Mood::Angry,
            Mood::Frustrated,
            Mood::Excited,
            Mood::Grateful,
            Mood::Hopeful,
            Mood::Overwhelmed,
            Mood::Confused,
            Mood::Lonely,
        ]
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very-happy" => Ok(Mood::VeryHappy),
            "happy" => Ok(Mood::Happy),
            "content" => Ok(Mood::Content),
            "neutral" => Ok(Mood::Neutral),
            "anxious" => Ok(Mood::Anxious),
            "stressed" => Ok(Mood::Stressed),
            "sad" => Ok(Mood::Sad),
            "very-sad" => Ok(Mood::VerySad),
            "angry" => Ok(Mood::Angry),
            "frustrated" => Ok(Mood::Frustrated),
            "excited" => Ok(Mood::Excited),
            "grateful" => Ok(Mood::Grateful),
            "hopeful" => Ok(Mood::Hopeful),
            "overwhelmed" => Ok(Mood::Overwhelmed),
            "confused" => Ok(Mood::Confused),
            "lonely" => Ok(Mood::Lonely),
            _ => Err(format!("unknown mood: {}", s)),
        }
    }
}

// ============================================
// Cognitive Distortions
// ============================================

/// The cognitive distortion taxonomy the provider detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistortionKind {
    AllOrNothing,
    Overgeneralization,
    MentalFilter,
    DiscountingPositive,
    JumpingToConclusions,
    Magnification,
    EmotionalReasoning,
    ShouldStatements,
    Labeling,
    Personalization,
    Catastrophizing,
    MindReading,
}

impl DistortionKind {
    /// Returns the identifier used in database storage and the API
    pub fn as_str(&self) -> &'static str {
        match self {
            DistortionKind::AllOrNothing => "all-or-nothing",
            DistortionKind::Overgeneralization => "overgeneralization",
            DistortionKind::MentalFilter => "mental-filter",
            DistortionKind::DiscountingPositive => "discounting-positive",
            DistortionKind::JumpingToConclusions => "jumping-to-conclusions",
            DistortionKind::Magnification => "magnification",
            DistortionKind::EmotionalReasoning => "emotional-reasoning",
            DistortionKind::ShouldStatements => "should-statements",
            DistortionKind::Labeling => "labeling",
            DistortionKind::Personalization => "personalization",
            DistortionKind::Catastrophizing => "catastrophizing",
            DistortionKind::MindReading => "mind-reading",
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            DistortionKind::AllOrNothing => "All-or-Nothing Thinking",
            DistortionKind::Overgeneralization => "Overgeneralization",
            DistortionKind::MentalFilter => "Mental Filter",
            DistortionKind::DiscountingPositive => "Discounting the Positive",
            DistortionKind::JumpingToConclusions => "Jumping to Conclusions",
            DistortionKind::Magnification => "Magnification",
            DistortionKind::EmotionalReasoning => "Emotional Reasoning",
            DistortionKind::ShouldStatements => "Should Statements",
            DistortionKind::Labeling => "Labeling",
            DistortionKind::Personalization => "Personalization",
            DistortionKind::Catastrophizing => "Catastrophizing",
            DistortionKind::MindReading => "Mind Reading",
        }
    }

    /// Short description used in prompts and the distortion info endpoint
    pub fn description(&self) -> &'static str {
        match self {
            DistortionKind::AllOrNothing => {
                "Seeing things in black-and-white categories with no middle ground"
            }
            DistortionKind::Overgeneralization => {
                "Viewing a single negative event as a never-ending pattern of defeat"
            }
            DistortionKind::MentalFilter => {
                "Dwelling on a single negative detail while filtering out the positives"
            }
            DistortionKind::DiscountingPositive => {
                "Rejecting positive experiences by insisting they don't count"
            }
            DistortionKind::JumpingToConclusions => {
                "Making negative interpretations without supporting facts"
            }
            DistortionKind::Magnification => {
                "Exaggerating the importance of problems or shortcomings"
            }
            DistortionKind::EmotionalReasoning => {
                "Assuming that negative emotions reflect the way things really are"
            }
            DistortionKind::ShouldStatements => {
                "Motivating yourself with shoulds and shouldn'ts, leading to guilt"
            }
            DistortionKind::Labeling => {
                "Attaching a negative label to yourself instead of describing the event"
            }
            DistortionKind::Personalization => {
                "Seeing yourself as the cause of external negative events"
            }
            DistortionKind::Catastrophizing => {
                "Expecting the worst possible outcome of a situation"
            }
            DistortionKind::MindReading => {
                "Assuming you know what others are thinking without evidence"
            }
        }
    }

    /// All distortion kinds, in taxonomy order
    pub fn all() -> &'static [DistortionKind] {
        &[
            DistortionKind::AllOrNothing,
            DistortionKind::Overgeneralization,
            DistortionKind::MentalFilter,
            DistortionKind::DiscountingPositive,
            DistortionKind::JumpingToConclusions,
            DistortionKind::Magnification,
            DistortionKind::EmotionalReasoning,
            DistortionKind::ShouldStatements,
            DistortionKind::Labeling,
            DistortionKind::Personalization,
            DistortionKind::Catastrophizing,
            DistortionKind::MindReading,
        ]
    }
}

impl std::fmt::Display for DistortionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DistortionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-or-nothing" => Ok(DistortionKind::AllOrNothing),
            "overgeneralization" => Ok(DistortionKind::Overgeneralization),
            "mental-filter" => Ok(DistortionKind::MentalFilter),
            "discounting-positive" => Ok(DistortionKind::DiscountingPositive),
            "jumping-to-conclusions" => Ok(DistortionKind::JumpingToConclusions),
            "magnification" => Ok(DistortionKind::Magnification),
            "emotional-reasoning" => Ok(DistortionKind::EmotionalReasoning),
            "should-statements" => Ok(DistortionKind::ShouldStatements),
            "labeling" => Ok(DistortionKind::Labeling),
            "personalization" => Ok(DistortionKind::Personalization),
            "catastrophizing" => Ok(DistortionKind::Catastrophizing),
            "mind-reading" => Ok(DistortionKind::MindReading),
            _ => Err(format!("unknown distortion kind: {}", s)),
        }
    }
}

// ============================================
// Sentiment
// ============================================

/// Overall sentiment of an entry as judged by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sentiment {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::VeryNegative => "very-negative",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Positive => "positive",
            Sentiment::VeryPositive => "very-positive",
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "very-negative" => Ok(Sentiment::VeryNegative),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "positive" => Ok(Sentiment::Positive),
            "very-positive" => Ok(Sentiment::VeryPositive),
            _ => Err(format!("unknown sentiment: {}", s)),
        }
    }
}

// ============================================
// Analysis
// ============================================

/// A single cognitive distortion detected in entry text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distortion {
    /// Which distortion from the taxonomy
    pub kind: DistortionKind,
    /// The sentence where the distortion appears
    pub sentence: String,
    /// Why the provider flagged it
    pub explanation: String,
    /// Provider confidence in [0, 1]
    pub confidence: f64,
}

/// A suggested rephrasing of a distorted thought
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reframe {
    /// The original distorted thought
    pub original: String,
    /// The suggested healthier version
    pub reframed: String,
    /// CBT technique used (e.g., "evidence examination")
    pub technique: String,
}

/// Full provider output attached to an entry.
///
/// `processed` is the gate every aggregator checks: an entry whose analysis
/// failed keeps `processed = false` with the failure in `processing_error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Analysis {
    /// Whether analysis completed successfully
    #[serde(default)]
    pub processed: bool,
    /// Detected distortions
    #[serde(default)]
    pub distortions: Vec<Distortion>,
    /// Suggested reframes
    #[serde(default)]
    pub reframes: Vec<Reframe>,
    /// Overall sentiment
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    /// Key themes, at most [`MAX_KEY_THEMES`]
    #[serde(default)]
    pub key_themes: Vec<String>,
    /// When analysis completed
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    /// Last failure message, if analysis failed
    #[serde(default)]
    pub processing_error: Option<String>,
}

impl Analysis {
    /// Record a successful analysis as of now
    pub fn mark_processed(&mut self) {
        self.processed = true;
        self.processed_at = Some(Utc::now());
        self.processing_error = None;
    }

    /// Record a failed analysis attempt without touching prior results
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.processed = false;
        self.processing_error = Some(error.into());
    }
}

// ============================================
// Journal Entries
// ============================================

/// A journal entry with its attached analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// Owner this entry belongs to
    pub owner_id: String,
    /// Entry title
    pub title: String,
    /// Entry body
    pub content: String,
    /// Self-reported mood
    pub mood: Mood,
    /// Mood intensity from 1 to 10
    pub mood_intensity: u8,
    /// Normalized tags (lowercase, trimmed)
    pub tags: Vec<String>,
    /// Flagged as important by the owner
    pub is_important: bool,
    /// Marked as a resolved problem
    pub is_resolved: bool,
    /// Whitespace-separated word count, computed on write
    pub word_count: u32,
    /// Estimated reading time in minutes (200 wpm)
    pub reading_time_min: u32,
    /// Provider analysis (unprocessed until the provider runs)
    pub analysis: Analysis,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// When the entry was last modified
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Shortened form for list views and the dashboard
    pub fn summary(&self) -> EntrySummary {
        let mut preview: String = self.content.chars().take(150).collect();
        if self.content.chars().count() > 150 {
            preview.push('…');
        }
        EntrySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            preview,
            mood: self.mood,
            mood_intensity: self.mood_intensity,
            tags: self.tags.clone(),
            is_important: self.is_important,
            created_at: self.created_at,
        }
    }
}

/// Shortened entry for list views
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntrySummary {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub mood: Mood,
    pub mood_intensity: u8,
    pub tags: Vec<String>,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
}

/// Count whitespace-separated words
pub fn count_words(content: &str) -> u32 {
    content.split_whitespace().count() as u32
}

/// Estimated reading time in minutes at 200 words per minute
pub fn reading_time_min(word_count: u32) -> u32 {
    word_count.div_ceil(200)
}

/// Normalize a raw tag list: trim, lowercase, drop empties and overlong
/// tags, dedupe while preserving first-seen order.
pub fn normalize_tags(raw: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut tags = Vec::new();
    for tag in raw {
        let t = tag.trim().to_lowercase();
        if t.is_empty() || t.chars().count() > MAX_TAG_LEN {
            continue;
        }
        if seen.insert(t.clone()) {
            tags.push(t);
        }
    }
    tags
}

/// Input for creating a new entry
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    pub title: String,
    pub content: String,
    pub mood: Mood,
    #[serde(default = "default_mood_intensity")]
    pub mood_intensity: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub is_resolved: bool,
}

fn default_mood_intensity() -> u8 {
    5
}

impl NewEntry {
    /// Validate and build a full entry for the given owner
    pub fn into_entry(self, owner_id: &str) -> crate::Result<JournalEntry> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(crate::Error::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(crate::Error::Validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if self.content.trim().is_empty() {
            return Err(crate::Error::Validation("content is required".to_string()));
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(crate::Error::Validation(format!(
                "content must be at most {} characters",
                MAX_CONTENT_LEN
            )));
        }
        if !(1..=10).contains(&self.mood_intensity) {
            return Err(crate::Error::Validation(
                "mood_intensity must be between 1 and 10".to_string(),
            ));
        }

        let word_count = count_words(&self.content);
        let now = Utc::now();

        Ok(JournalEntry {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title,
            content: self.content,
            mood: self.mood,
            mood_intensity: self.mood_intensity,
            tags: normalize_tags(&self.tags),
            is_important: self.is_important,
            is_resolved: self.is_resolved,
            word_count,
            reading_time_min: reading_time_min(word_count),
            analysis: Analysis::default(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for an existing entry.
///
/// Absent fields are left untouched. A content change invalidates any
/// existing analysis.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub mood: Option<Mood>,
    pub mood_intensity: Option<u8>,
    pub tags: Option<Vec<String>>,
    pub is_important: Option<bool>,
    pub is_resolved: Option<bool>,
}

impl EntryPatch {
    /// Apply this patch to an entry, revalidating changed fields.
    ///
    /// Returns true if the content was modified (and analysis was reset).
    pub fn apply(self, entry: &mut JournalEntry) -> crate::Result<bool> {
        if let Some(title) = self.title {
            let title = title.trim().to_string();
            if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
                return Err(crate::Error::Validation(format!(
                    "title must be 1 to {} characters",
                    MAX_TITLE_LEN
                )));
            }
            entry.title = title;
        }

        let mut content_changed = false;
        if let Some(content) = self.content {
            if content.trim().is_empty() || content.chars().count() > MAX_CONTENT_LEN {
                return Err(crate::Error::Validation(format!(
                    "content must be 1 to {} characters",
                    MAX_CONTENT_LEN
                )));
            }
            if content != entry.content {
                entry.content = content;
                entry.word_count = count_words(&entry.content);
                entry.reading_time_min = reading_time_min(entry.word_count);
                entry.analysis = Analysis::default();
                content_changed = true;
            }
        }

        if let Some(mood) = self.mood {
            entry.mood = mood;
        }
        if let Some(intensity) = self.mood_intensity {
            if !(1..=10).contains(&intensity) {
                return Err(crate::Error::Validation(
                    "mood_intensity must be between 1 and 10".to_string(),
                ));
            }
            entry.mood_intensity = intensity;
        }
        if let Some(tags) = self.tags {
            entry.tags = normalize_tags(&tags);
        }
        if let Some(important) = self.is_important {
            entry.is_important = important;
        }
        if let Some(resolved) = self.is_resolved {
            entry.is_resolved = resolved;
        }

        entry.updated_at = Utc::now();
        Ok(content_changed)
    }
}
