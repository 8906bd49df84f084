//! End-to-end comic generation runs.
//!
//! A run takes one or more premises (news events, a user story, or media
//! descriptions) through duplicate checking, scripting, image generation,
//! optional narration and persistence. Failures are absorbed per panel, then
//! per item; a run only fails when it produced nothing.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::clients::{EventSource, MediaDescriber, NarrationService, NewsEvent, ScriptGenerator};
use crate::db::ComicStore;
use crate::domain::events::{GeneratedComic, RunReport};
use crate::domain::{
    ComicFilter, ComicRecord, MediaKind, NewComic, PanelSummaries, Premise, RunState, Stage,
    TaskKind,
};
use crate::parser::{parse_summaries, safe_title};
use crate::services::artifacts::ArtifactWriter;
use crate::services::dedup::DuplicateDetector;
use crate::services::images::ImageFallbackHandler;
use crate::services::media::MediaService;
use crate::services::tasks::ProgressReporter;

pub const NO_EVENTS_TITLE: &str = "No Current News Events";
pub const NO_EVENTS_STORY: &str =
    "There are no significant news events to report for this area in the past 7 days.";
pub const NO_EVENTS_SOURCE: &str = "Local news monitoring";
const NO_EVENTS_SUMMARIES: [&str; 3] = [
    "No news events to report",
    "Area is currently quiet",
    "Check back later for updates",
];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch events for {location}: {message}")]
    EventSource { location: String, message: String },

    #[error("No valid media files found")]
    NoMediaFiles,

    #[error("No comics were generated: {0}")]
    NothingGenerated(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRequest {
    pub location: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRequest {
    pub title: String,
    pub story: String,
    pub location: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    pub media_type: MediaKind,
    pub path: PathBuf,
    pub location: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RunRequest {
    Daily(DailyRequest),
    Custom(CustomRequest),
    Media(MediaRequest),
}

impl RunRequest {
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::Daily(_) => TaskKind::Daily,
            Self::Custom(_) => TaskKind::Custom,
            Self::Media(_) => TaskKind::Media,
        }
    }
}

/// Everything a pipeline needs, assembled by the caller.
pub struct PipelineParts {
    pub store: Arc<dyn ComicStore>,
    pub script: Arc<dyn ScriptGenerator>,
    pub events: Arc<dyn EventSource>,
    pub describer: Arc<dyn MediaDescriber>,
    pub narration: Option<Arc<dyn NarrationService>>,
    pub images: Arc<ImageFallbackHandler>,
    pub artifacts: ArtifactWriter,
    pub media: MediaService,
    pub detector: DuplicateDetector,
    pub default_style: String,
}

/// Progress window of one item inside a batch run.
#[derive(Debug, Clone, Copy)]
struct ItemWindow {
    base: u8,
    span: u8,
}

impl ItemWindow {
    /// Window of item `index` out of `count` in the 10..90 band.
    fn for_item(index: usize, count: usize) -> Self {
        let count = count.max(1);
        let base = 10 + index * 80 / count;
        let span = 80 / count;
        Self {
            base: u8::try_from(base).unwrap_or(90),
            span: u8::try_from(span).unwrap_or(80),
        }
    }

    /// Position `offset` on the 0..80 item scale.
    fn at(self, offset: u8) -> u8 {
        let scaled = u16::from(offset) * u16::from(self.span) / 80;
        self.base
            .saturating_add(u8::try_from(scaled).unwrap_or(self.span))
    }
}

/// How an item's duplicate hit is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuplicatePolicy {
    /// Drop the item
    Skip,
    /// Return the stored record instead of generating
    Reuse,
}

/// Artifacts of one drawn comic, ready to persist.
struct Rendered {
    script: String,
    summary: String,
    summaries: PanelSummaries,
    image_paths: Vec<String>,
    audio_path: Option<String>,
    date: NaiveDate,
}

enum ItemOutcome {
    Generated(GeneratedComic),
    Reused(GeneratedComic),
    Skipped(String),
}

/// Per-item inputs beyond the premise.
struct ItemContext<'a> {
    kind: TaskKind,
    owner_id: Option<i64>,
    duplicates: DuplicatePolicy,
    file_stem: String,
    progress: &'a ProgressReporter,
    window: ItemWindow,
}

impl ItemContext<'_> {
    fn enter(&self, state: RunState, offset: u8, message: impl Into<String>) {
        self.progress.report(self.window.at(offset), message, state.stage());
    }
}

pub struct ComicPipeline {
    store: Arc<dyn ComicStore>,
    script: Arc<dyn ScriptGenerator>,
    events: Arc<dyn EventSource>,
    describer: Arc<dyn MediaDescriber>,
    narration: Option<Arc<dyn NarrationService>>,
    images: Arc<ImageFallbackHandler>,
    artifacts: ArtifactWriter,
    media: MediaService,
    detector: DuplicateDetector,
    default_style: String,
}

impl ComicPipeline {
    #[must_use]
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            store: parts.store,
            script: parts.script,
            events: parts.events,
            describer: parts.describer,
            narration: parts.narration,
            images: parts.images,
            artifacts: parts.artifacts,
            media: parts.media,
            detector: parts.detector,
            default_style: parts.default_style,
        }
    }

    fn style(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.default_style.as_str())
            .to_string()
    }

    /// Runs `request` to completion and always ends `progress` with a
    /// terminal update.
    pub async fn run(&self, request: &RunRequest, progress: &ProgressReporter) -> Option<RunReport> {
        let kind = request.kind();
        let result = match request {
            RunRequest::Daily(req) => self.run_daily(req, progress).await,
            RunRequest::Custom(req) => self.run_custom(req, progress).await,
            RunRequest::Media(req) => self.run_media(req, progress).await,
        };

        match result {
            Ok(report) => {
                let outcome = if report.no_current_events {
                    "no_events"
                } else {
                    "success"
                };
                metrics::counter!("comic_runs_total", "kind" => kind.as_str(), "outcome" => outcome)
                    .increment(1);

                let message = completion_message(&report);
                info!(kind = kind.as_str(), comics = report.comics.len(), skipped = report.skipped, "Run completed");
                progress.report(100, message.clone(), Stage::Finalization);
                progress.finish(true, message, Some(report.clone()));
                Some(report)
            }
            Err(e) => {
                metrics::counter!("comic_runs_total", "kind" => kind.as_str(), "outcome" => "failure")
                    .increment(1);
                warn!(kind = kind.as_str(), error = %e, "Run failed");
                progress.report(100, e.to_string(), Stage::Finalization);
                progress.finish(false, e.to_string(), None);
                None
            }
        }
    }

    /// Generates one comic per recent news event for a location.
    pub async fn run_daily(
        &self,
        request: &DailyRequest,
        progress: &ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let location = request.location.trim();
        let style = self.style(request.style.as_deref());

        progress.report(0, "Fetching local events", RunState::Started.stage());
        let events = self
            .events
            .fetch_events(location)
            .await
            .map_err(|e| PipelineError::EventSource {
                location: location.to_string(),
                message: e.to_string(),
            })?;

        if events.is_empty() {
            info!(location, "No current events");
            progress.report(10, "No current events found", RunState::SourceAcquired.stage());
            return Ok(self.render_no_events(location, &style, progress).await);
        }

        let count = events.len();
        progress.report(
            10,
            format!("Found {count} events"),
            RunState::SourceAcquired.stage(),
        );

        let mut comics = Vec::new();
        let mut skipped = 0;
        for (i, event) in events.into_iter().enumerate() {
            let NewsEvent {
                title,
                story,
                source_url,
            } = event;
            if story.trim().is_empty() {
                info!(title = %title, "Event skipped: empty story");
                skipped += 1;
                continue;
            }
            let premise = Premise::new(story, location)
                .with_title(title)
                .with_style(Some(style.clone()))
                .with_source_url(source_url);

            let ctx = ItemContext {
                kind: TaskKind::Daily,
                owner_id: request.user_id,
                duplicates: DuplicatePolicy::Skip,
                file_stem: safe_title(premise.display_title()),
                progress,
                window: ItemWindow::for_item(i, count),
            };
            ctx.enter(
                RunState::SourceAcquired,
                0,
                format!("Processing event {}/{count}: {}", i + 1, premise.display_title()),
            );

            match self.process_item(&premise, &ctx).await {
                ItemOutcome::Generated(comic) | ItemOutcome::Reused(comic) => comics.push(comic),
                ItemOutcome::Skipped(reason) => {
                    info!(title = premise.display_title(), %reason, "Event skipped");
                    skipped += 1;
                }
            }
        }

        if comics.is_empty() {
            return Err(PipelineError::NothingGenerated(format!(
                "all {count} events were skipped"
            )));
        }

        progress.report(95, "Creating final summary", Stage::Finalization);
        let dir = ArtifactWriter::comic_dir(location, Local::now().date_naive());
        let entries: Vec<_> = comics
            .iter()
            .map(|c| (c.title.clone(), c.panel_summaries.clone()))
            .collect();
        if let Err(e) = self
            .artifacts
            .save_final_summary(&dir, location, &entries)
            .await
        {
            warn!(location, error = %e, "Failed to write final summary");
        }

        Ok(RunReport {
            kind: TaskKind::Daily,
            comics,
            skipped,
            no_current_events: false,
        })
    }

    /// Generates one comic from a user story, or returns the stored comic
    /// for a near-identical story by the same owner.
    pub async fn run_custom(
        &self,
        request: &CustomRequest,
        progress: &ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let premise = Premise::new(request.story.trim(), request.location.trim())
            .with_title(request.title.trim())
            .with_style(Some(self.style(request.style.as_deref())));

        progress.report(0, "Preparing custom comic", RunState::Started.stage());
        let ctx = ItemContext {
            kind: TaskKind::Custom,
            owner_id: request.user_id,
            duplicates: DuplicatePolicy::Reuse,
            file_stem: safe_title(premise.display_title()),
            progress,
            window: ItemWindow::for_item(0, 1),
        };
        ctx.enter(
            RunState::SourceAcquired,
            0,
            format!("Processing story: {}", premise.display_title()),
        );

        match self.process_item(&premise, &ctx).await {
            ItemOutcome::Generated(comic) | ItemOutcome::Reused(comic) => Ok(RunReport {
                kind: TaskKind::Custom,
                comics: vec![comic],
                skipped: 0,
                no_current_events: false,
            }),
            ItemOutcome::Skipped(reason) => Err(PipelineError::NothingGenerated(reason)),
        }
    }

    /// Generates one comic per media file, each premise being the file's
    /// description.
    pub async fn run_media(
        &self,
        request: &MediaRequest,
        progress: &ProgressReporter,
    ) -> Result<RunReport, PipelineError> {
        let kind = request.media_type;
        let location = request.location.trim();
        let style = self.style(request.style.as_deref());

        progress.report(
            0,
            format!("Collecting {} files", kind.as_str()),
            RunState::Started.stage(),
        );
        let files = self
            .media
            .collect_media_files(&request.path, kind)
            .await
            .inspect_err(|e| warn!(path = %request.path.display(), error = %e, "Media scan failed"))
            .unwrap_or_default();
        if files.is_empty() {
            return Err(PipelineError::NoMediaFiles);
        }

        let count = files.len();
        progress.report(
            10,
            format!("Found {count} {} files", kind.as_str()),
            RunState::Started.stage(),
        );

        let mut comics = Vec::new();
        let mut skipped = 0;
        for (i, file) in files.iter().enumerate() {
            let file_name = file
                .file_name()
                .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
            let window = ItemWindow::for_item(i, count);
            progress.report(
                window.at(0),
                format!("Describing {} {}/{count}: {file_name}", kind.as_str(), i + 1),
                RunState::Started.stage(),
            );

            let description = match self.describe(kind, file).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    warn!(file = %file_name, "Empty media description");
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Media description failed");
                    skipped += 1;
                    continue;
                }
            };

            let premise = Premise::new(description, location)
                .with_title(file_name.clone())
                .without_title_in_prompt()
                .with_style(Some(style.clone()));
            let ctx = ItemContext {
                kind: TaskKind::Media,
                owner_id: request.user_id,
                duplicates: DuplicatePolicy::Reuse,
                file_stem: format!("{}_comic_{}", kind.as_str(), safe_title(&file_name)),
                progress,
                window,
            };
            ctx.enter(
                RunState::SourceAcquired,
                5,
                format!("Described {file_name}"),
            );

            match self.process_item(&premise, &ctx).await {
                ItemOutcome::Generated(comic) | ItemOutcome::Reused(comic) => comics.push(comic),
                ItemOutcome::Skipped(reason) => {
                    info!(file = %file_name, %reason, "Media file skipped");
                    skipped += 1;
                }
            }
        }

        if comics.is_empty() {
            return Err(PipelineError::NothingGenerated(format!(
                "all {count} media files were skipped"
            )));
        }

        Ok(RunReport {
            kind: TaskKind::Media,
            comics,
            skipped,
            no_current_events: false,
        })
    }

    async fn describe(
        &self,
        kind: MediaKind,
        path: &Path,
    ) -> Result<String, crate::clients::CollaboratorError> {
        match kind {
            MediaKind::Video => self.describer.describe_video(path).await,
            MediaKind::Image => self.describer.describe_image(path).await,
        }
    }

    /// Looks for a stored comic the premise duplicates.
    ///
    /// Daily items match exactly by story, then by similarity within the
    /// location. Custom and media items match by similarity within the
    /// owner's comics. Store errors are logged and treated as no match.
    async fn find_duplicate(&self, premise: &Premise, ctx: &ItemContext<'_>) -> Option<ComicRecord> {
        match self.lookup_duplicate(premise, ctx).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(title = premise.display_title(), error = %e, "Duplicate check failed");
                None
            }
        }
    }

    async fn lookup_duplicate(
        &self,
        premise: &Premise,
        ctx: &ItemContext<'_>,
    ) -> anyhow::Result<Option<ComicRecord>> {
        let corpus = if ctx.kind == TaskKind::Daily {
            if let Some(hit) = self.store.find_by_story(&premise.story).await? {
                return Ok(Some(hit));
            }
            let filter = ComicFilter {
                location: Some(premise.location.clone()),
                ..ComicFilter::default()
            };
            self.store.list_by_filter(&filter).await?
        } else {
            self.store.list_by_owner(ctx.owner_id).await?
        };

        Ok(self.detector.find_duplicate(&premise.story, &corpus).cloned())
    }

    async fn process_item(&self, premise: &Premise, ctx: &ItemContext<'_>) -> ItemOutcome {
        let title = premise.display_title();

        if let Some(existing) = self.find_duplicate(premise, ctx).await {
            ctx.enter(
                RunState::DuplicateChecked,
                5,
                format!("Comic already exists for: {title}"),
            );
            return match ctx.duplicates {
                DuplicatePolicy::Skip => ItemOutcome::Skipped("duplicate story".to_string()),
                DuplicatePolicy::Reuse => {
                    info!(title, id = existing.id, "Reusing existing comic");
                    let summaries = parse_summaries(&existing.summary);
                    ItemOutcome::Reused(GeneratedComic::from_record(&existing, summaries, true))
                }
            };
        }

        let rendered = match self.render(premise, ctx).await {
            Ok(rendered) => rendered,
            Err(reason) => return ItemOutcome::Skipped(reason),
        };

        ctx.enter(
            RunState::Persisted,
            70,
            format!("Saving to database: {title}"),
        );
        let comic = NewComic {
            owner_id: ctx.owner_id,
            title: title.to_string(),
            location: premise.location.clone(),
            original_story: premise.story.clone(),
            script: rendered.script,
            summary: rendered.summary,
            source_url: premise.source_url.clone(),
            image_paths: rendered.image_paths,
            audio_path: rendered.audio_path,
            date: rendered.date,
        };

        let record = match self.store.insert(&comic).await {
            Ok(record) => record,
            Err(e) => {
                warn!(title, error = %e, "Failed to persist comic");
                return ItemOutcome::Skipped(format!("persistence failed: {e}"));
            }
        };

        ctx.enter(RunState::Completed, 80, format!("Comic created: {title}"));
        info!(title, id = record.id, panels = record.image_paths.len(), "Comic created");
        ItemOutcome::Generated(GeneratedComic::from_record(&record, rendered.summaries, false))
    }

    /// Scripts, draws, saves and narrates one premise without touching the
    /// store. The error is the reason the item was dropped.
    async fn render(&self, premise: &Premise, ctx: &ItemContext<'_>) -> Result<Rendered, String> {
        let title = premise.display_title();
        let style = premise.style.as_deref().unwrap_or(self.default_style.as_str());

        ctx.enter(
            RunState::DuplicateChecked,
            5,
            format!("Generating comic script for: {title}"),
        );
        let generated = match self
            .script
            .generate_script(&premise.script_prompt(), &premise.location, style)
            .await
        {
            Ok(generated) if !generated.script.trim().is_empty() => generated,
            Ok(_) => {
                warn!(title, "Script service returned an empty script");
                return Err("empty script".to_string());
            }
            Err(e) => {
                warn!(title, error = %e, "Script generation failed");
                return Err(format!("script generation failed: {e}"));
            }
        };
        ctx.enter(RunState::Scripted, 5, format!("Script ready for: {title}"));

        let summaries = if generated.summary.trim().is_empty() {
            parse_summaries(&generated.script)
        } else {
            parse_summaries(&generated.summary)
        };
        ctx.enter(RunState::Parsed, 10, format!("Generating images for: {title}"));

        let images = self
            .images
            .generate_panel_images(&generated.script, &premise.story, style)
            .await;
        if images.is_empty() {
            warn!(title, attempts = images.attempts.len(), "No panel images generated");
            return Err("No comic images were generated".to_string());
        }
        ctx.enter(
            RunState::ImagesGenerated,
            50,
            format!("Saving comic: {title}"),
        );

        let date = Local::now().date_naive();
        let dir = ArtifactWriter::comic_dir(&premise.location, date);
        let stem = ArtifactWriter::unique_stem(&ctx.file_stem);
        let image_paths = self
            .artifacts
            .save_panel_images(&dir, &stem, &images.panels)
            .await;
        if image_paths.is_empty() {
            return Err("No comic images could be saved".to_string());
        }
        if let Err(e) = self
            .artifacts
            .save_summary(
                &dir,
                &stem,
                title,
                &premise.story,
                premise.source_url.as_deref(),
                &summaries,
            )
            .await
        {
            warn!(title, error = %e, "Failed to write summary file");
        }

        let audio_path = if let Some(narration) = &self.narration {
            ctx.enter(
                RunState::AudioGenerated,
                60,
                format!("Generating audio for: {title}"),
            );
            self.narrate(narration.as_ref(), premise, &dir, &stem).await
        } else {
            None
        };

        let summary = if generated.summary.trim().is_empty() {
            summaries_text(&summaries)
        } else {
            generated.summary
        };
        Ok(Rendered {
            script: generated.script,
            summary,
            summaries,
            image_paths,
            audio_path,
            date,
        })
    }

    /// Draws the stand-in comic for a location with no current events. It is
    /// never stored; when drawing fails the caller still gets the captions.
    async fn render_no_events(&self, location: &str, style: &str, progress: &ProgressReporter) -> RunReport {
        let premise = Premise::new(NO_EVENTS_STORY, location)
            .with_title(NO_EVENTS_TITLE)
            .with_style(Some(style.to_string()))
            .with_source_url(Some(NO_EVENTS_SOURCE.to_string()));
        let ctx = ItemContext {
            kind: TaskKind::Daily,
            owner_id: None,
            duplicates: DuplicatePolicy::Skip,
            file_stem: safe_title(NO_EVENTS_TITLE),
            progress,
            window: ItemWindow::for_item(0, 1),
        };

        let mut report = no_events_report(location);
        match self.render(&premise, &ctx).await {
            Ok(rendered) => {
                let comic = &mut report.comics[0];
                comic.script = rendered.script;
                comic.image_paths = rendered.image_paths;
                comic.audio_path = rendered.audio_path;
            }
            Err(reason) => warn!(location, %reason, "Stand-in comic could not be drawn"),
        }
        report
    }

    async fn narrate(
        &self,
        narration: &dyn NarrationService,
        premise: &Premise,
        dir: &str,
        stem: &str,
    ) -> Option<String> {
        let title = premise.display_title();
        let audio = match narration.synthesize_speech(&premise.story, "").await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(title, error = %e, "Narration failed");
                return None;
            }
        };
        self.artifacts
            .save_audio(dir, stem, &audio)
            .await
            .inspect_err(|e| warn!(title, error = %e, "Failed to save narration"))
            .ok()
    }
}

fn summaries_text(summaries: &PanelSummaries) -> String {
    summaries
        .as_slice()
        .iter()
        .enumerate()
        .map(|(i, caption)| format!("Panel {}: {caption}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn no_events_report(location: &str) -> RunReport {
    RunReport {
        kind: TaskKind::Daily,
        comics: vec![GeneratedComic {
            id: None,
            title: NO_EVENTS_TITLE.to_string(),
            location: location.to_string(),
            story: NO_EVENTS_STORY.to_string(),
            source_url: Some(NO_EVENTS_SOURCE.to_string()),
            script: String::new(),
            panel_summaries: PanelSummaries::from_captions(NO_EVENTS_SUMMARIES),
            image_paths: Vec::new(),
            audio_path: None,
            reused: false,
        }],
        skipped: 0,
        no_current_events: true,
    }
}

fn completion_message(report: &RunReport) -> String {
    if report.no_current_events {
        return "No current events to report".to_string();
    }
    match report.comics.as_slice() {
        [comic] if comic.reused => format!("Comic already exists: {}", comic.title),
        [comic] => format!("Comic generated: {}", comic.title),
        comics => format!("Generated {} comics", comics.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_windows_cover_the_batch_band() {
        let first = ItemWindow::for_item(0, 1);
        assert_eq!((first.at(0), first.at(5), first.at(70), first.at(80)), (10, 15, 80, 90));

        let windows: Vec<_> = (0..3).map(|i| ItemWindow::for_item(i, 3)).collect();
        assert_eq!(windows.iter().map(|w| w.base).collect::<Vec<_>>(), [10, 36, 63]);
        for pair in windows.windows(2) {
            assert!(pair[0].at(80) <= pair[1].at(0));
        }
    }

    #[test]
    fn no_events_report_is_renderable() {
        let report = no_events_report("Nowhere, BC");
        assert!(report.no_current_events);
        let comic = &report.comics[0];
        assert_eq!(comic.title, NO_EVENTS_TITLE);
        assert_eq!(comic.panel_summaries.as_slice()[1], "Area is currently quiet");
        assert!(comic.id.is_none());
        assert_eq!(completion_message(&report), "No current events to report");
    }

    #[test]
    fn run_request_is_tagged() {
        let request: RunRequest = serde_json::from_value(serde_json::json!({
            "kind": "custom",
            "title": "Bear",
            "story": "Bear sighted downtown",
            "location": "Lillooet"
        }))
        .unwrap();
        assert_eq!(request.kind(), TaskKind::Custom);
    }
}
