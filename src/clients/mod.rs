//! External collaborators of the generation pipeline.
//!
//! Each collaborator is a small async capability trait with one or more HTTP
//! implementations in this module. The pipeline only ever talks to the
//! traits, so runs can be driven by in-process fakes.

pub mod diffusion;
pub mod elevenlabs;
pub mod news;
pub mod ollama;
pub mod openai;
pub mod vision;

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::domain::FailureKind;

/// Errors from collaborators other than image backends.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} API error: {status} - {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{0} returned no content")]
    Empty(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for CollaboratorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Script text plus its summary section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    pub script: String,
    pub summary: String,
}

#[async_trait::async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Writes a three-panel script for `premise`.
    ///
    /// # Errors
    ///
    /// - Returns [`CollaboratorError::Empty`] when the model produced no text
    async fn generate_script(
        &self,
        premise: &str,
        location: &str,
        style: &str,
    ) -> Result<GeneratedScript, CollaboratorError>;
}

/// Generated image, either inline or as a URL still to be fetched.
#[derive(Clone, PartialEq, Eq)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    Url(String),
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Url(url) => write!(f, "Url({url})"),
        }
    }
}

/// Classified failure of one image backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ImageFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ImageFailure {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn content_rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ContentRejected,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ImageFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
            Self::rate_limited(err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait ImageBackend: Send + Sync {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &str;

    /// Generates one image for `prompt`.
    ///
    /// # Errors
    ///
    /// - Returns an [`ImageFailure`] classified as rate-limited,
    ///   content-rejected or other
    async fn generate_image(&self, prompt: &str) -> Result<ImagePayload, ImageFailure>;
}

#[async_trait::async_trait]
pub trait NarrationService: Send + Sync {
    /// Synthesizes `text` as speech and returns the encoded audio.
    async fn synthesize_speech(
        &self,
        text: &str,
        voice_hint: &str,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// A news item from the event source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsEvent {
    pub title: String,
    pub story: String,
    #[serde(default, alias = "full_story_source_url")]
    pub source_url: Option<String>,
}

#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// Recent events for `location`. An empty list is a valid answer.
    async fn fetch_events(&self, location: &str) -> Result<Vec<NewsEvent>, CollaboratorError>;
}

#[async_trait::async_trait]
pub trait MediaDescriber: Send + Sync {
    async fn describe_video(&self, path: &Path) -> Result<String, CollaboratorError>;

    async fn describe_image(&self, path: &Path) -> Result<String, CollaboratorError>;
}

/// Reads a non-success response into a [`CollaboratorError::Status`].
pub(crate) async fn status_error(
    service: &'static str,
    response: reqwest::Response,
) -> CollaboratorError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CollaboratorError::Status {
        service,
        status,
        body,
    }
}
