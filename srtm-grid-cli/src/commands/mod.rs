pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use srtm_grid::{DurableTier, ElevationService, TileCache, TileCacheBuilder};
use std::path::PathBuf;

/// Cache settings shared by every subcommand.
pub struct CacheOptions {
    pub cache_dir: PathBuf,
    pub base_url: Option<String>,
    pub archive_only: bool,
}

impl CacheOptions {
    fn builder(&self) -> TileCacheBuilder {
        tracing::debug!(
            cache_dir = %self.cache_dir.display(),
            archive_only = self.archive_only,
            "Opening tile cache"
        );
        let mut builder = TileCache::builder(&self.cache_dir);
        if self.archive_only {
            builder = builder.durable_tier(DurableTier::ArchiveOnly);
        }
        if let Some(url) = &self.base_url {
            builder = builder.base_url(url.clone());
        }
        builder
    }

    /// Service that downloads missing tiles.
    pub fn service(&self) -> Result<ElevationService> {
        let cache = self.builder().build().with_context(|| {
            format!("Failed to open tile cache: {}", self.cache_dir.display())
        })?;
        Ok(ElevationService::new(cache))
    }

    /// Cache that only looks at what is already on disk.
    pub fn offline_cache(&self) -> Result<TileCache> {
        self.builder().offline().build().with_context(|| {
            format!("Failed to open tile cache: {}", self.cache_dir.display())
        })
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
