//! One-shot generation runs from the command line.

use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::domain::events::ProgressUpdate;
use crate::services::{ProgressReporter, RunRequest};
use crate::state::{build_pipeline, build_shared_http_client};

/// Runs `request` in the foreground, printing progress as it arrives.
pub async fn cmd_generate(config: &Config, request: RunRequest) -> anyhow::Result<()> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;
    let http_client = build_shared_http_client(config.general.request_timeout_seconds)?;
    let pipeline = Arc::new(build_pipeline(config, &store, &http_client));

    let (reporter, mut updates) = ProgressReporter::channel();
    let run = tokio::spawn(async move { pipeline.run(&request, &reporter).await });

    let mut succeeded = false;
    while let Some(update) = updates.recv().await {
        match update {
            ProgressUpdate::Progress {
                progress,
                message,
                stage,
            } => {
                println!("[{progress:>3}%] {:<17} {message}", stage.as_str());
            }
            ProgressUpdate::Finished {
                success,
                message,
                result,
            } => {
                succeeded = success;
                println!();
                println!("{} {message}", if success { "✓" } else { "✗" });

                if let Some(report) = result {
                    if report.no_current_events {
                        println!("No current events for this location.");
                    }
                    for comic in &report.comics {
                        let id = comic
                            .id
                            .map_or_else(|| "-".to_string(), |id| id.to_string());
                        let reused = if comic.reused { " (existing)" } else { "" };
                        println!("  [{id}] {}{reused}", comic.title);
                        for path in &comic.image_paths {
                            println!("      {path}");
                        }
                    }
                    if report.skipped > 0 {
                        println!("  {} item(s) skipped", report.skipped);
                    }
                }
                break;
            }
        }
    }

    run.await?;

    if succeeded {
        Ok(())
    } else {
        anyhow::bail!("Comic generation failed")
    }
}
