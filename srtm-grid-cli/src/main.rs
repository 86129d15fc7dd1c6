use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::CacheOptions;

/// SRTM 5x5 degree grid elevation CLI tool
#[derive(Parser)]
#[command(name = "srtm-grid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding downloaded archives and tile snapshots
    #[arg(short, long, env = "SRTM_GRID_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory URL the zipped tiles are fetched from
    #[arg(short, long, env = "SRTM_GRID_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Keep downloaded archives instead of writing binary snapshots
    #[arg(short, long, global = true)]
    archive_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Display information about a tile
    Info {
        /// Tile identifier (e.g., srtm_13_06)
        #[arg(required_unless_present_all = ["lat", "lon"])]
        tile: Option<String>,

        /// Specify tile by latitude instead of identifier
        #[arg(long, conflicts_with = "tile", requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Specify tile by longitude instead of identifier
        #[arg(long, conflicts_with = "tile", requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// List tiles stored in the cache directory
    List,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srtm_grid=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cache_dir = cli
        .cache_dir
        .context("No cache directory. Use --cache-dir or set SRTM_GRID_CACHE_DIR")?;
    let options = CacheOptions {
        cache_dir,
        base_url: cli.base_url,
        archive_only: cli.archive_only,
    };

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(&options, lat, lon, json),
        Commands::Info { tile, lat, lon } => commands::info::run(&options, tile, lat, lon),
        Commands::List => commands::list::run(&options),
    }
}
