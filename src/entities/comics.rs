use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Stored comic. `image_paths` holds a JSON array of relative paths; `date`
/// is `YYYY-MM-DD` and `created_at` is RFC 3339.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "comics")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub owner_id: Option<i64>,
    pub title: String,
    pub location: String,
    pub original_story: String,
    pub script: String,
    pub summary: String,
    pub source_url: Option<String>,
    pub image_paths: String,
    pub audio_path: Option<String>,
    pub date: String,
    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
