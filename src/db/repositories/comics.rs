use crate::domain::{ComicFilter, ComicRecord, NewComic};
use crate::entities::{comics, prelude::*};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct ComicRepository {
    conn: DatabaseConnection,
}

impl ComicRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, comic: &NewComic) -> Result<ComicRecord> {
        let image_paths =
            serde_json::to_string(&comic.image_paths).context("Failed to encode image paths")?;

        let active_model = comics::ActiveModel {
            owner_id: Set(comic.owner_id),
            title: Set(comic.title.clone()),
            location: Set(comic.location.clone()),
            original_story: Set(comic.original_story.clone()),
            script: Set(comic.script.clone()),
            summary: Set(comic.summary.clone()),
            source_url: Set(comic.source_url.clone()),
            image_paths: Set(image_paths),
            audio_path: Set(comic.audio_path.clone()),
            date: Set(comic.date.format(DATE_FORMAT).to_string()),
            created_at: Set(Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = Comics::insert(active_model)
            .exec_with_returning(&self.conn)
            .await?;
        to_record(model)
    }

    pub async fn get(&self, id: i64) -> Result<Option<ComicRecord>> {
        Comics::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(to_record)
            .transpose()
    }

    /// First comic whose original story is exactly `story`.
    pub async fn find_by_story(&self, story: &str) -> Result<Option<ComicRecord>> {
        Comics::find()
            .filter(comics::Column::OriginalStory.eq(story))
            .order_by_asc(comics::Column::Id)
            .one(&self.conn)
            .await?
            .map(to_record)
            .transpose()
    }

    /// Comics matching `filter`, newest first.
    pub async fn list(&self, filter: &ComicFilter) -> Result<Vec<ComicRecord>> {
        let mut query = Comics::find()
            .order_by_desc(comics::Column::Date)
            .order_by_desc(comics::Column::Id);

        if let Some(start) = filter.start_date {
            query = query.filter(comics::Column::Date.gte(start.format(DATE_FORMAT).to_string()));
        }

        if let Some(end) = filter.end_date {
            query = query.filter(comics::Column::Date.lte(end.format(DATE_FORMAT).to_string()));
        }

        if let Some(location) = &filter.location {
            query = query.filter(comics::Column::Location.eq(location.as_str()));
        }

        if let Some(owner_id) = filter.owner_id {
            query = query.filter(comics::Column::OwnerId.eq(owner_id));
        }

        query
            .all(&self.conn)
            .await?
            .into_iter()
            .map(to_record)
            .collect()
    }

    pub async fn unique_locations(&self) -> Result<Vec<String>> {
        let locations: Vec<String> = Comics::find()
            .select_only()
            .column(comics::Column::Location)
            .distinct()
            .order_by_asc(comics::Column::Location)
            .into_tuple()
            .all(&self.conn)
            .await?;
        Ok(locations)
    }

    pub async fn purge(&self) -> Result<u64> {
        let result = Comics::delete_many().exec(&self.conn).await?;
        Ok(result.rows_affected)
    }
}

fn to_record(model: comics::Model) -> Result<ComicRecord> {
    let image_paths: Vec<String> = serde_json::from_str(&model.image_paths)
        .with_context(|| format!("Invalid image paths for comic {}", model.id))?;
    let date = NaiveDate::parse_from_str(&model.date, DATE_FORMAT)
        .with_context(|| format!("Invalid date for comic {}", model.id))?;
    let created_at = DateTime::parse_from_rfc3339(&model.created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid created_at for comic {}", model.id))?;

    Ok(ComicRecord {
        id: model.id,
        owner_id: model.owner_id,
        title: model.title,
        location: model.location,
        original_story: model.original_story,
        script: model.script,
        summary: model.summary,
        source_url: model.source_url,
        image_paths,
        audio_path: model.audio_path,
        date,
        created_at,
    })
}
