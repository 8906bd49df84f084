//! Progress records emitted by pipeline runs.
//!
//! A run writes [`ProgressUpdate`]s into its task channel; the streaming
//! endpoint serializes each one as a single JSON line. The stream always
//! ends with exactly one [`ProgressUpdate::Finished`].

use serde::Serialize;

use super::{ComicRecord, PanelSummaries, Stage, TaskKind};

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum ProgressUpdate {
    Progress {
        progress: u8,
        message: String,
        stage: Stage,
    },
    Finished {
        success: bool,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<RunReport>,
    },
}

impl ProgressUpdate {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    #[must_use]
    pub const fn percent(&self) -> u8 {
        match self {
            Self::Progress { progress, .. } => *progress,
            Self::Finished { .. } => 100,
        }
    }
}

/// Result payload carried by a successful terminal update.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub kind: TaskKind,
    pub comics: Vec<GeneratedComic>,
    /// Items dropped because they were duplicates or failed
    pub skipped: usize,
    /// Set when the event source had nothing for the location
    pub no_current_events: bool,
}

/// One comic produced (or reused) by a run.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedComic {
    /// Store id; absent for the unpersisted "no current events" stand-in
    pub id: Option<i64>,
    pub title: String,
    pub location: String,
    pub story: String,
    pub source_url: Option<String>,
    pub script: String,
    pub panel_summaries: PanelSummaries,
    pub image_paths: Vec<String>,
    pub audio_path: Option<String>,
    /// True when an existing record was returned instead of regenerating
    pub reused: bool,
}

impl GeneratedComic {
    #[must_use]
    pub fn from_record(record: &ComicRecord, panel_summaries: PanelSummaries, reused: bool) -> Self {
        Self {
            id: Some(record.id),
            title: record.title.clone(),
            location: record.location.clone(),
            story: record.original_story.clone(),
            source_url: record.source_url.clone(),
            script: record.script.clone(),
            panel_summaries,
            image_paths: record.image_paths.clone(),
            audio_path: record.audio_path.clone(),
            reused,
        }
    }
}
