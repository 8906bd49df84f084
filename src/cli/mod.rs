use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::MediaKind;

mod commands;

#[derive(Parser)]
#[command(name = "comicforge")]
#[command(about = "Turns local news, stories and media into three-panel comics", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server (default)
    #[command(alias = "web")]
    Serve,

    /// Generate comics from today's news for a location
    #[command(alias = "d")]
    Daily {
        /// Location to fetch news for
        location: String,
        /// Art style for the panels
        #[arg(long)]
        style: Option<String>,
        /// Owner of the generated comics
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// Generate a comic from your own story
    #[command(alias = "c")]
    Custom {
        /// Comic title
        title: String,
        /// Story text
        story: String,
        /// Location the story belongs to
        #[arg(long, default_value = "Custom")]
        location: String,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// Generate comics from video or image files
    #[command(alias = "m")]
    Media {
        /// Media kind: video or image
        media_type: MediaKind,
        /// File or directory to read
        path: PathBuf,
        #[arg(long, default_value = "Media")]
        location: String,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// List stored comics
    #[command(alias = "ls")]
    List {
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        user_id: Option<i64>,
    },

    /// List every location with stored comics
    Locations,

    /// Delete every stored comic
    Purge {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
