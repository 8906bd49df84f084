use crate::domain::{ComicFilter, ComicRecord, NewComic};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

/// Persistence operations the pipeline and API depend on.
///
/// Records are created once and never updated; `purge` is the only other
/// mutation.
#[async_trait::async_trait]
pub trait ComicStore: Send + Sync {
    /// A comic whose original story is exactly `story`.
    async fn find_by_story(&self, story: &str) -> Result<Option<ComicRecord>>;

    async fn insert(&self, comic: &NewComic) -> Result<ComicRecord>;

    async fn list_by_filter(&self, filter: &ComicFilter) -> Result<Vec<ComicRecord>>;

    async fn list_by_owner(&self, owner_id: Option<i64>) -> Result<Vec<ComicRecord>> {
        self.list_by_filter(&ComicFilter::for_owner(owner_id)).await
    }

    async fn get(&self, id: i64) -> Result<Option<ComicRecord>>;

    async fn unique_locations(&self) -> Result<Vec<String>>;

    /// Deletes every stored comic and returns how many were removed.
    async fn purge(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn comic_repo(&self) -> repositories::comics::ComicRepository {
        repositories::comics::ComicRepository::new(self.conn.clone())
    }
}

#[async_trait::async_trait]
impl ComicStore for Store {
    async fn find_by_story(&self, story: &str) -> Result<Option<ComicRecord>> {
        self.comic_repo().find_by_story(story).await
    }

    async fn insert(&self, comic: &NewComic) -> Result<ComicRecord> {
        self.comic_repo().insert(comic).await
    }

    async fn list_by_filter(&self, filter: &ComicFilter) -> Result<Vec<ComicRecord>> {
        self.comic_repo().list(filter).await
    }

    async fn get(&self, id: i64) -> Result<Option<ComicRecord>> {
        self.comic_repo().get(id).await
    }

    async fn unique_locations(&self) -> Result<Vec<String>> {
        self.comic_repo().unique_locations().await
    }

    async fn purge(&self) -> Result<u64> {
        self.comic_repo().purge().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_comic(title: &str, location: &str, owner_id: Option<i64>, date: NaiveDate) -> NewComic {
        NewComic {
            owner_id,
            title: title.to_string(),
            location: location.to_string(),
            original_story: format!("Story of {title}"),
            script: "Panel 1: ...".to_string(),
            summary: "Panel 1: caption".to_string(),
            source_url: None,
            image_paths: vec!["a_comics/2024_05_01/t_1.png".to_string()],
            audio_path: None,
            date,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn insert_and_read_back() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let inserted = store
            .insert(&new_comic("Bear", "Lillooet", Some(7), day(1)))
            .await
            .unwrap();

        let fetched = store.get(inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
        assert_eq!(fetched.image_paths.len(), 1);

        let by_story = store.find_by_story("Story of Bear").await.unwrap();
        assert_eq!(by_story.map(|c| c.id), Some(inserted.id));
        assert!(store.find_by_story("Story of Be").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_applies_every_filter() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.insert(&new_comic("a", "Lillooet", Some(1), day(1))).await.unwrap();
        store.insert(&new_comic("b", "Lillooet", Some(2), day(3))).await.unwrap();
        store.insert(&new_comic("c", "Kamloops", Some(1), day(5))).await.unwrap();

        let all = store.list_by_filter(&ComicFilter::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["c", "b", "a"]);

        let ranged = store
            .list_by_filter(&ComicFilter {
                start_date: Some(day(2)),
                end_date: Some(day(5)),
                location: Some("Lillooet".to_string()),
                owner_id: None,
            })
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].title, "b");

        assert_eq!(store.list_by_owner(Some(1)).await.unwrap().len(), 2);
        assert_eq!(
            store.unique_locations().await.unwrap(),
            ["Kamloops", "Lillooet"]
        );
    }

    #[tokio::test]
    async fn purge_removes_everything() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.insert(&new_comic("a", "X", None, day(1))).await.unwrap();
        store.insert(&new_comic("b", "X", None, day(2))).await.unwrap();

        assert_eq!(store.purge().await.unwrap(), 2);
        assert!(store.list_by_filter(&ComicFilter::default()).await.unwrap().is_empty());
    }
}
