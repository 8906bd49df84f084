use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::domain::MediaKind;

/// File-system side of the media variant: finding input files and pulling
/// still frames out of videos.
#[derive(Debug, Clone, Default)]
pub struct MediaService;

impl MediaService {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Input files for a media run.
    ///
    /// A file path is returned as-is. A directory is listed one level deep,
    /// filtered by the kind's extensions and sorted by name.
    pub async fn collect_media_files(&self, path: &Path, kind: MediaKind) -> Result<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        let dir = path.to_path_buf();
        let mut files = tokio::task::spawn_blocking(move || {
            walkdir::WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.file_type().is_file() && kind.matches(entry.path()))
                .map(walkdir::DirEntry::into_path)
                .collect::<Vec<_>>()
        })
        .await
        .context("Media directory scan panicked")?;

        files.sort();
        debug!(dir = %path.display(), count = files.len(), "Collected media files");
        Ok(files)
    }

    /// Duration of a video in seconds.
    pub async fn video_duration(&self, path: &Path) -> Result<f64> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let output = ffprobe::ffprobe(&path)
                .with_context(|| format!("Failed to run ffprobe on {}", path.display()))?;

            let video_stream = output
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
                .context("No video stream found")?;

            Ok(output
                .format
                .duration
                .and_then(|d| d.parse::<f64>().ok())
                .or_else(|| {
                    video_stream
                        .duration
                        .as_ref()
                        .and_then(|d| d.parse::<f64>().ok())
                })
                .unwrap_or(0.0))
        })
        .await
        .context("ffprobe task panicked")?
    }

    /// Extracts `count` evenly spaced frames as JPEG files into `out_dir`.
    pub async fn extract_frames(
        &self,
        path: &Path,
        count: u32,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let duration = self.video_duration(path).await?;
        tokio::fs::create_dir_all(out_dir)
            .await
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;

        let mut frames = Vec::new();
        for (i, at) in frame_timestamps(duration, count).into_iter().enumerate() {
            let frame_path = out_dir.join(format!("frame_{:03}.jpg", i + 1));
            let status = Command::new("ffmpeg")
                .arg("-y")
                .arg("-loglevel")
                .arg("error")
                .arg("-ss")
                .arg(format!("{at:.3}"))
                .arg("-i")
                .arg(path)
                .arg("-frames:v")
                .arg("1")
                .arg(&frame_path)
                .status()
                .await
                .context("Failed to run ffmpeg")?;

            if status.success() {
                frames.push(frame_path);
            } else {
                debug!(at, path = %path.display(), "ffmpeg could not extract frame");
            }
        }

        if frames.is_empty() {
            anyhow::bail!("No frames could be extracted from {}", path.display());
        }
        Ok(frames)
    }
}

/// Evenly spaced timestamps strictly inside `(0, duration)`.
fn frame_timestamps(duration: f64, count: u32) -> Vec<f64> {
    if count == 0 {
        return Vec::new();
    }
    if duration <= 0.0 {
        return vec![0.0];
    }
    let step = duration / f64::from(count + 1);
    (1..=count).map(|i| step * f64::from(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_evenly_spaced() {
        assert_eq!(frame_timestamps(10.0, 4), vec![2.0, 4.0, 6.0, 8.0]);
        assert_eq!(frame_timestamps(0.0, 5), vec![0.0]);
        assert!(frame_timestamps(10.0, 0).is_empty());
    }

    #[tokio::test]
    async fn collects_only_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "clip.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let service = MediaService::new();
        let images = service
            .collect_media_files(dir.path(), MediaKind::Image)
            .await
            .unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.JPG", "b.png"]);

        let videos = service
            .collect_media_files(dir.path(), MediaKind::Video)
            .await
            .unwrap();
        assert_eq!(videos.len(), 1);
    }

    #[tokio::test]
    async fn single_file_is_returned_as_is() {
        let service = MediaService::new();
        let files = service
            .collect_media_files(Path::new("/tmp/does-not-matter.mov"), MediaKind::Video)
            .await
            .unwrap();
        assert_eq!(files, [PathBuf::from("/tmp/does-not-matter.mov")]);
    }
}
