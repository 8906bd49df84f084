use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCreated {
    pub task_id: String,
}

/// Query string of `GET /api/comics`. Dates are `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize)]
pub struct ComicQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub location: Option<String>,
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ComicDto {
    pub id: i64,
    pub user_id: Option<i64>,
    pub title: String,
    pub location: String,
    pub original_story: String,
    pub script: String,
    pub summary: String,
    pub source_url: Option<String>,
    /// URLs under `/output`
    pub image_urls: Vec<String>,
    pub audio_url: Option<String>,
    pub date: NaiveDate,
    pub created_at: String,
}

impl From<crate::domain::ComicRecord> for ComicDto {
    fn from(record: crate::domain::ComicRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.owner_id,
            title: record.title,
            location: record.location,
            original_story: record.original_story,
            script: record.script,
            summary: record.summary,
            source_url: record.source_url,
            image_urls: record
                .image_paths
                .iter()
                .map(|p| format!("/output/{p}"))
                .collect(),
            audio_url: record.audio_path.map(|p| format!("/output/{p}")),
            date: record.date,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeResult {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub active_tasks: usize,
}
