use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trackprep")]
#[command(author, version, about = "Release-name analysis and TMDB matching for tracker re-uploads")]
pub struct Cli {
    /// Path to config file (defaults to $TRACKPREP_CONFIG, then config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a release name and print the extracted attributes
    Analyze {
        /// Release or file name
        name: String,

        /// Category hint (e.g. movies, tvshows, anime)
        #[arg(long, default_value = "")]
        category: String,

        /// Downloaded content to probe with ffprobe
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Analyze a release name and match it against TMDB
    Match {
        /// Release or file name
        name: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Match every name in a file (one per line)
    Batch {
        /// File with one release name per line
        list: PathBuf,

        #[arg(long, default_value = "")]
        category: String,

        /// Print Prometheus metrics after the run
        #[arg(long)]
        metrics: bool,
    },

    /// Parse a .torrent file, match its name and print the naming context
    Torrent {
        /// The .torrent file
        file: PathBuf,

        #[arg(long, default_value = "")]
        category: String,
    },

    /// Inspect or clear the match cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts
    Stats,
    /// Delete every entry and the cache file
    Clear,
}
