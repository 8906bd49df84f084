//! Domain types for the comic generation pipeline.
//!
//! These are the values passed between the pipeline stages: the premise a
//! run starts from, the structured output of the script parser, the
//! classification of image backend outcomes, and the per-run state labels.

pub mod comic;
pub mod events;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use comic::{ComicFilter, ComicRecord, NewComic};

/// Number of panels in every comic.
pub const PANEL_COUNT: usize = 3;

/// Caption used when the script does not carry a summary for a panel.
pub const PLACEHOLDER_SUMMARY: &str = "No summary available for this panel.";

/// Textual input that seeds one pipeline run.
///
/// A premise is built once at the start of a run and never changed
/// afterwards; the builder methods consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Premise {
    pub title: Option<String>,
    pub story: String,
    pub location: String,
    pub style: Option<String>,
    pub source_url: Option<String>,
    /// Title only names the record; the script prompt is the story alone
    #[serde(default)]
    pub untitled_prompt: bool,
}

impl Premise {
    #[must_use]
    pub fn new(story: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            title: None,
            story: story.into(),
            location: location.into(),
            style: None,
            source_url: None,
            untitled_prompt: false,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Keeps the title out of [`Premise::script_prompt`]. Media titles are
    /// file names, which say nothing about the scene.
    #[must_use]
    pub fn without_title_in_prompt(mut self) -> Self {
        self.untitled_prompt = true;
        self
    }

    #[must_use]
    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style.filter(|s| !s.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url.filter(|s| !s.trim().is_empty());
        self
    }

    /// Title used for file names and the persisted record.
    #[must_use]
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Text handed to the script service.
    #[must_use]
    pub fn script_prompt(&self) -> String {
        match self.title.as_ref().filter(|_| !self.untitled_prompt) {
            Some(title) => format!(
                "Generate a comic script for this event: {title}. {}",
                self.story
            ),
            None => format!("Generate a comic script for this event: {}", self.story),
        }
    }
}

/// Exactly [`PANEL_COUNT`] human-readable panel captions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSummaries([String; PANEL_COUNT]);

impl PanelSummaries {
    /// Builds summaries from captions in the order given, padding with
    /// [`PLACEHOLDER_SUMMARY`] and dropping anything past the third.
    pub fn from_captions<I, S>(captions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = captions.into_iter().map(Into::into);
        Self(std::array::from_fn(|_| {
            iter.next()
                .unwrap_or_else(|| PLACEHOLDER_SUMMARY.to_string())
        }))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0.into()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Visual fields recovered from one panel block of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelFields {
    pub frame: Option<String>,
    pub setting: Option<String>,
    pub characters: Option<String>,
    pub action: Option<String>,
    pub dialogue: Option<String>,
}

impl PanelFields {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frame.is_none()
            && self.setting.is_none()
            && self.characters.is_none()
            && self.action.is_none()
            && self.dialogue.is_none()
    }
}

/// Which text an image prompt was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptVariant {
    PrimaryScript,
    OriginalStory,
    GenericFallback,
}

impl PromptVariant {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryScript => "primary_script",
            Self::OriginalStory => "original_story",
            Self::GenericFallback => "generic_fallback",
        }
    }
}

/// Classified reason an image backend call did not produce an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    ContentRejected,
    Other,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ContentRejected => "content_rejected",
            Self::Other => "other_error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    ContentRejected,
    OtherError,
}

impl AttemptOutcome {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RateLimited => "rate_limited",
            Self::ContentRejected => "content_rejected",
            Self::OtherError => "other_error",
        }
    }
}

impl From<FailureKind> for AttemptOutcome {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::RateLimited => Self::RateLimited,
            FailureKind::ContentRejected => Self::ContentRejected,
            FailureKind::Other => Self::OtherError,
        }
    }
}

/// One image backend call for one panel. Kept in memory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationAttempt {
    pub backend: String,
    pub panel: usize,
    pub prompt_variant: PromptVariant,
    pub outcome: AttemptOutcome,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Daily,
    Custom,
    Media,
}

impl TaskKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Custom => "custom",
            Self::Media => "media",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl MediaKind {
    #[must_use]
    pub const fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Video => &["mp4", "avi", "mov"],
            Self::Image => &["jpg", "jpeg", "png"],
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }

    /// Whether `path` carries one of this kind's extensions (case-insensitive).
    #[must_use]
    pub fn matches(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(Self::Video),
            "image" => Ok(Self::Image),
            other => Err(format!("Unknown media type: {other}")),
        }
    }
}

/// Per-item state of a pipeline run.
///
/// `Failed` is reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Started,
    SourceAcquired,
    DuplicateChecked,
    Scripted,
    Parsed,
    ImagesGenerated,
    AudioGenerated,
    Persisted,
    Completed,
    Failed,
}

impl RunState {
    /// Stage label shown to the caller for progress emitted on entering this state.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Started => Stage::Preparation,
            Self::SourceAcquired => Stage::EventFetching,
            Self::DuplicateChecked => Stage::DatabaseCheck,
            Self::Scripted | Self::Parsed => Stage::TextGeneration,
            Self::ImagesGenerated => Stage::ImageGeneration,
            Self::AudioGenerated => Stage::AudioGeneration,
            Self::Persisted => Stage::DatabaseUpdate,
            Self::Completed | Self::Failed => Stage::Finalization,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    #[serde(rename = "Preparation")]
    Preparation,
    #[serde(rename = "Event Fetching")]
    EventFetching,
    #[serde(rename = "Database Check")]
    DatabaseCheck,
    #[serde(rename = "Text Generation")]
    TextGeneration,
    #[serde(rename = "Image Generation")]
    ImageGeneration,
    #[serde(rename = "Audio Generation")]
    AudioGeneration,
    #[serde(rename = "Database Update")]
    DatabaseUpdate,
    #[serde(rename = "Finalization")]
    Finalization,
}

impl Stage {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Preparation => "Preparation",
            Self::EventFetching => "Event Fetching",
            Self::DatabaseCheck => "Database Check",
            Self::TextGeneration => "Text Generation",
            Self::ImageGeneration => "Image Generation",
            Self::AudioGeneration => "Audio Generation",
            Self::DatabaseUpdate => "Database Update",
            Self::Finalization => "Finalization",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
