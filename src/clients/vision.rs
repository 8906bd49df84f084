use base64::Engine;
use std::path::Path;
use tracing::{debug, warn};

use super::ollama::{ChatMessage, OllamaClient};
use super::{CollaboratorError, MediaDescriber};
use crate::services::MediaService;

const CAPTION_PROMPT: &str = "Describe this picture in two or three vivid sentences for a comic \
writer: who is in it, what they are doing, and where it takes place.";

const VIDEO_SUMMARY_PROMPT: &str = "These are descriptions of frames taken in order from one \
video. Write a short story (one paragraph) describing what happens in the video.";

/// Media describer backed by a vision chat model.
///
/// Images are captioned directly. Videos are reduced to a handful of frames,
/// each frame is captioned, and the captions are summarized into one story.
#[derive(Clone)]
pub struct VisionDescriber {
    chat: OllamaClient,
    media: MediaService,
    frames_per_video: u32,
}

impl VisionDescriber {
    #[must_use]
    pub const fn new(chat: OllamaClient, media: MediaService, frames_per_video: u32) -> Self {
        Self {
            chat,
            media,
            frames_per_video,
        }
    }

    async fn caption(&self, path: &Path) -> Result<String, CollaboratorError> {
        let bytes = tokio::fs::read(path).await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        debug!(path = %path.display(), "Captioning image");

        self.chat
            .chat(vec![
                ChatMessage::user(CAPTION_PROMPT).with_images(vec![encoded]),
            ])
            .await
    }
}

/// Scratch directory for extracted frames, deleted when dropped.
fn frame_dir() -> std::io::Result<tempfile::TempDir> {
    tempfile::Builder::new().prefix("comicforge-frames-").tempdir()
}

#[async_trait::async_trait]
impl MediaDescriber for VisionDescriber {
    async fn describe_image(&self, path: &Path) -> Result<String, CollaboratorError> {
        self.caption(path).await
    }

    async fn describe_video(&self, path: &Path) -> Result<String, CollaboratorError> {
        let work_dir = frame_dir()?;
        let frames = self
            .media
            .extract_frames(path, self.frames_per_video, work_dir.path())
            .await?;

        let mut captions = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            match self.caption(frame).await {
                Ok(caption) => captions.push(format!("Frame {}: {caption}", i + 1)),
                Err(e) => warn!(frame = i + 1, error = %e, "Frame caption failed"),
            }
        }
        if captions.is_empty() {
            return Err(CollaboratorError::Empty("Vision model"));
        }

        debug!(frames = captions.len(), "Summarizing video frames");
        self.chat
            .chat(vec![
                ChatMessage::system(VIDEO_SUMMARY_PROMPT),
                ChatMessage::user(captions.join("\n")),
            ])
            .await
    }
}
