pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod parser;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, cmd_generate, cmd_list_comics, cmd_locations, cmd_purge};
pub use config::Config;
use services::{CustomRequest, DailyRequest, MediaRequest, RunRequest};

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config, prometheus_handle).await,

        Commands::Daily {
            location,
            style,
            user_id,
        } => {
            let request = RunRequest::Daily(DailyRequest {
                location,
                style,
                user_id,
            });
            cmd_generate(&config, request).await
        }

        Commands::Custom {
            title,
            story,
            location,
            style,
            user_id,
        } => {
            let request = RunRequest::Custom(CustomRequest {
                title,
                story,
                location,
                style,
                user_id,
            });
            cmd_generate(&config, request).await
        }

        Commands::Media {
            media_type,
            path,
            location,
            style,
            user_id,
        } => {
            let request = RunRequest::Media(MediaRequest {
                media_type,
                path,
                location,
                style,
                user_id,
            });
            cmd_generate(&config, request).await
        }

        Commands::List {
            start_date,
            end_date,
            location,
            user_id,
        } => cmd_list_comics(&config, start_date, end_date, location, user_id).await,

        Commands::Locations => cmd_locations(&config).await,

        Commands::Purge { yes } => cmd_purge(&config, yes).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("Created config.toml with default settings.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!("Comicforge v{} starting...", env!("CARGO_PKG_VERSION"));

    if !config.server.enabled {
        anyhow::bail!("server.enabled is false; nothing to serve");
    }

    let port = config.server.port;
    let api_state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(api_state).await;

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("API server listening on http://{addr}");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("API server error: {}", e);
        }
    });

    signal::ctrl_c().await?;
    info!("Shutting down...");
    server_handle.abort();

    Ok(())
}
