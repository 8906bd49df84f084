//! Stored comic listing and maintenance.

use chrono::NaiveDate;

use crate::config::Config;
use crate::db::{ComicStore, Store};
use crate::domain::ComicFilter;

fn parse_date(value: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("Invalid date '{v}', expected YYYY-MM-DD"))
        })
        .transpose()
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    Store::new(&config.general.database_path).await
}

pub async fn cmd_list_comics(
    config: &Config,
    start_date: Option<String>,
    end_date: Option<String>,
    location: Option<String>,
    user_id: Option<i64>,
) -> anyhow::Result<()> {
    let filter = ComicFilter {
        start_date: parse_date(start_date)?,
        end_date: parse_date(end_date)?,
        location,
        owner_id: user_id,
    };

    let store = open_store(config).await?;
    let comics = store.list_by_filter(&filter).await?;

    if comics.is_empty() {
        println!("No comics found.");
        println!();
        println!("Generate one with: comicforge daily \"<location>\"");
        return Ok(());
    }

    println!("Comics ({} total)", comics.len());
    println!("{:-<70}", "");

    for comic in comics {
        println!("[{}] {} | {}", comic.id, comic.date, comic.title);
        println!(
            "  Location: {} | Panels: {}{}",
            comic.location,
            comic.image_paths.len(),
            if comic.audio_path.is_some() {
                " | Narrated"
            } else {
                ""
            }
        );
        if let Some(source) = &comic.source_url {
            println!("  Source: {source}");
        }
    }

    Ok(())
}

pub async fn cmd_locations(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config).await?;
    let locations = store.unique_locations().await?;

    if locations.is_empty() {
        println!("No locations yet.");
        return Ok(());
    }

    for location in locations {
        println!("{location}");
    }
    Ok(())
}

pub async fn cmd_purge(config: &Config, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        println!("This deletes every stored comic record. Re-run with --yes to confirm.");
        return Ok(());
    }

    let store = open_store(config).await?;
    let deleted = store.purge().await?;
    println!("Deleted {deleted} comic(s).");
    Ok(())
}
