//! The persisted comic artifact.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A finished comic as stored. Created once at the end of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComicRecord {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub title: String,
    pub location: String,
    pub original_story: String,
    pub script: String,
    pub summary: String,
    pub source_url: Option<String>,
    pub image_paths: Vec<String>,
    pub audio_path: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Fields of a comic about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComic {
    pub owner_id: Option<i64>,
    pub title: String,
    pub location: String,
    pub original_story: String,
    pub script: String,
    pub summary: String,
    pub source_url: Option<String>,
    pub image_paths: Vec<String>,
    pub audio_path: Option<String>,
    pub date: NaiveDate,
}

/// Filter for listing stored comics. Every field is optional; date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComicFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub owner_id: Option<i64>,
}

impl ComicFilter {
    #[must_use]
    pub fn for_owner(owner_id: Option<i64>) -> Self {
        Self {
            owner_id,
            ..Self::default()
        }
    }
}
