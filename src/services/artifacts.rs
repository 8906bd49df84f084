use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::ImagePayload;
use crate::domain::PanelSummaries;
use crate::parser::location_dir;
use crate::services::images::PanelImage;

/// Writes generated comics to the output directory.
///
/// Files for one location and day live in
/// `<output_dir>/<location>_comics/<YYYY_MM_DD>/`. Returned paths are
/// relative to the output directory with `/` separators, which is how they
/// are stored and served.
#[derive(Clone)]
pub struct ArtifactWriter {
    client: reqwest::Client,
    output_dir: PathBuf,
}

impl ArtifactWriter {
    #[must_use]
    pub fn new(client: reqwest::Client, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Relative directory for a location and day.
    #[must_use]
    pub fn comic_dir(location: &str, date: NaiveDate) -> String {
        format!("{}/{}", location_dir(location), date.format("%Y_%m_%d"))
    }

    /// `stem` plus a random suffix, so comics sharing a title, location and
    /// day never overwrite each other's files.
    #[must_use]
    pub fn unique_stem(stem: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        format!("{stem}_{}", &id[..8])
    }

    async fn ensure_dir(&self, relative_dir: &str) -> Result<PathBuf> {
        let dir = self.output_dir.join(relative_dir);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(dir)
    }

    /// Saves each generated panel as `<stem>_<n>.png` and returns the paths
    /// of the files written, in panel order. Panels that are missing or fail
    /// to save are left out.
    pub async fn save_panel_images(
        &self,
        relative_dir: &str,
        stem: &str,
        panels: &[Option<PanelImage>],
    ) -> Vec<String> {
        let dir = match self.ensure_dir(relative_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                warn!(error = %e, "Could not create comic directory");
                return Vec::new();
            }
        };

        let mut saved = Vec::new();
        for (i, panel) in panels.iter().enumerate() {
            let Some(panel) = panel else { continue };
            let file_name = format!("{stem}_{}.png", i + 1);

            match self.write_payload(&dir.join(&file_name), &panel.payload).await {
                Ok(()) => saved.push(format!("{relative_dir}/{file_name}")),
                Err(e) => {
                    warn!(panel = i + 1, backend = %panel.backend, error = %e, "Failed to save panel image");
                }
            }
        }

        info!(dir = relative_dir, saved = saved.len(), "Saved panel images");
        saved
    }

    async fn write_payload(&self, path: &Path, payload: &ImagePayload) -> Result<()> {
        let bytes = match payload {
            ImagePayload::Bytes(bytes) => bytes.clone(),
            ImagePayload::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()
                    .with_context(|| format!("Image download failed for {url}"))?;
                response.bytes().await?.to_vec()
            }
        };

        fs::write(path, bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", path.display()))
    }

    pub async fn save_audio(&self, relative_dir: &str, stem: &str, audio: &[u8]) -> Result<String> {
        let dir = self.ensure_dir(relative_dir).await?;
        let file_name = format!("{stem}.mp3");
        let path = dir.join(&file_name);
        fs::write(&path, audio)
            .await
            .with_context(|| format!("Failed to write audio to {}", path.display()))?;
        Ok(format!("{relative_dir}/{file_name}"))
    }

    /// Writes the `<stem>_summary.txt` record for one comic.
    pub async fn save_summary(
        &self,
        relative_dir: &str,
        stem: &str,
        title: &str,
        story: &str,
        source: Option<&str>,
        summaries: &PanelSummaries,
    ) -> Result<String> {
        let dir = self.ensure_dir(relative_dir).await?;
        let file_name = format!("{stem}_summary.txt");

        let mut text = format!("Title: {title}\n\nStory: {story}\n\n");
        if let Some(source) = source {
            let _ = writeln!(text, "Source: {source}\n");
        }
        text.push_str("Summary:\n");
        for (i, caption) in summaries.as_slice().iter().enumerate() {
            let _ = writeln!(text, "Panel {}: {caption}", i + 1);
        }

        fs::write(dir.join(&file_name), text)
            .await
            .with_context(|| format!("Failed to write summary {file_name}"))?;
        Ok(format!("{relative_dir}/{file_name}"))
    }

    /// Writes `final_summary.txt` listing every comic of a daily run.
    pub async fn save_final_summary(
        &self,
        relative_dir: &str,
        location: &str,
        comics: &[(String, PanelSummaries)],
    ) -> Result<String> {
        let dir = self.ensure_dir(relative_dir).await?;

        let mut text = format!("Today's Events in {location}:\n\n");
        for (title, summaries) in comics {
            let _ = writeln!(text, "{title}");
            for caption in summaries.as_slice() {
                let _ = writeln!(text, "- {caption}");
            }
            text.push('\n');
        }

        fs::write(dir.join("final_summary.txt"), text)
            .await
            .context("Failed to write final summary")?;
        Ok(format!("{relative_dir}/final_summary.txt"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PromptVariant;

    fn panel(bytes: &[u8]) -> Option<PanelImage> {
        Some(PanelImage {
            payload: ImagePayload::Bytes(bytes.to_vec()),
            backend: "test".to_string(),
            prompt_variant: PromptVariant::PrimaryScript,
        })
    }

    #[test]
    fn unique_stems_differ_for_one_title() {
        let first = ArtifactWriter::unique_stem("Bear_Visit");
        let second = ArtifactWriter::unique_stem("Bear_Visit");
        assert!(first.starts_with("Bear_Visit_"));
        assert_eq!(first.len(), "Bear_Visit_".len() + 8);
        assert_ne!(first, second);
    }

    #[test]
    fn comic_dir_layout() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            ArtifactWriter::comic_dir("Lillooet, BC", date),
            "Lillooet__BC_comics/2024_05_01"
        );
    }

    #[tokio::test]
    async fn missing_panels_keep_their_numbers() {
        let out = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(reqwest::Client::new(), out.path());

        let saved = writer
            .save_panel_images("X_comics/2024_05_01", "Bear", &[panel(b"1"), None, panel(b"3")])
            .await;

        assert_eq!(
            saved,
            ["X_comics/2024_05_01/Bear_1.png", "X_comics/2024_05_01/Bear_3.png"]
        );
        let written = std::fs::read(out.path().join("X_comics/2024_05_01/Bear_3.png")).unwrap();
        assert_eq!(written, b"3");
    }

    #[tokio::test]
    async fn summary_files_contain_captions() {
        let out = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(reqwest::Client::new(), out.path());
        let summaries = PanelSummaries::from_captions(["A bear", "A baker"]);

        let path = writer
            .save_summary("d", "Bear", "Bear", "A bear story", Some("https://news"), &summaries)
            .await
            .unwrap();
        let text = std::fs::read_to_string(out.path().join(path)).unwrap();
        assert!(text.contains("Source: https://news"));
        assert!(text.contains("Panel 2: A baker"));
        assert!(text.contains("Panel 3: No summary available for this panel."));

        let path = writer
            .save_final_summary("d", "Lillooet", &[("Bear".to_string(), summaries)])
            .await
            .unwrap();
        let text = std::fs::read_to_string(out.path().join(path)).unwrap();
        assert!(text.starts_with("Today's Events in Lillooet:"));
        assert!(text.contains("- A bear"));
    }
}
