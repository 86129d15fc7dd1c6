//! Tiered tile cache.
//!
//! This module provides [`TileCache`], which turns a tile identifier into a
//! decoded [`GridTile`] while avoiding repeated downloads and parses.
//!
//! # Tiers
//!
//! 1. **Memory** - tiles already decoded in this process. Never evicted.
//! 2. **Durable** - depends on [`DurableTier`]:
//!    - `Snapshot`: `<cache_dir>/<identifier>.grd`, a binary image of the
//!      decoded tile (see [`crate::snapshot`]).
//!    - `ArchiveOnly`: a retained `<cache_dir>/<identifier>.zip`, parsed
//!      again on every process start.
//! 3. **Remote** - the archive is fetched through a [`TileTransport`],
//!    extracted and parsed. With `Snapshot`, the snapshot is written and
//!    the archive deleted.
//!
//! A tile that cannot be fetched is not remembered: the next lookup tries
//! the remote tier again.
//!
//! ```ignore
//! use srtm_grid::{DurableTier, TileCache};
//!
//! let cache = TileCache::builder("/var/cache/srtm")
//!     .durable_tier(DurableTier::Snapshot)
//!     .build()?;
//!
//! let tile = cache.get_tile("srtm_13_06")?;
//! println!("{}x{} cells", tile.rows(), tile.cols());
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use moka::sync::Cache;

use crate::archive::{archive_path, extract_grid};
use crate::download::{archive_url, DownloadConfig, TileTransport};
use crate::error::{GridError, Result};
use crate::grid::GridTile;
use crate::index::parse_identifier;
use crate::parser::parse_grid;
use crate::snapshot::{read_snapshot, snapshot_path, write_snapshot, SNAPSHOT_EXTENSION};

#[cfg(feature = "download")]
use crate::download::HttpTransport;

/// How decoded tiles persist across processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurableTier {
    /// Keep the downloaded archive and re-parse it after a restart.
    ArchiveOnly,
    /// Store a binary snapshot of the decoded tile and drop the archive.
    #[default]
    Snapshot,
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in memory.
    pub entry_count: u64,
    /// Number of lookups served from memory.
    pub hit_count: u64,
    /// Number of lookups that had to go to disk or the network.
    pub miss_count: u64,
    /// Number of archive downloads requested from the transport.
    pub fetch_count: u64,
}

impl CacheStats {
    /// Calculate the memory hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Where a tile is persisted in the cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredForm {
    /// Only a binary snapshot exists.
    Snapshot,
    /// Only the zipped grid exists.
    Archive,
    /// Both forms exist (a snapshot write failed or the tier changed).
    Both,
}

/// Multi-tier cache of decoded tiles, keyed by tile identifier.
pub struct TileCache {
    cache_dir: PathBuf,
    durable_tier: DurableTier,
    base_url: String,
    transport: Option<Box<dyn TileTransport>>,
    /// Decoded tiles, unbounded and kept for the lifetime of the cache.
    tiles: Cache<String, Arc<GridTile>>,
    /// Held while a tile is loaded from disk or the network, so only one
    /// caller touches a tile's cache files at a time.
    load_lock: Mutex<()>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    fetch_count: AtomicU64,
}

impl TileCache {
    /// Create a cache with default settings: snapshot durable tier and, with
    /// the `download` feature, HTTP downloads from the CGIAR-CSI server.
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        TileCacheBuilder::new(cache_dir).build()
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(cache_dir: P) -> TileCacheBuilder {
        TileCacheBuilder::new(cache_dir)
    }

    /// Get the tile for `identifier`, loading it through the tiers if needed.
    ///
    /// # Errors
    ///
    /// - [`GridError::TileUnavailable`] if the archive cannot be fetched
    /// - a malformed-data error if the grid text is corrupt
    /// - a storage error if a freshly fetched archive cannot be extracted
    pub fn get_tile(&self, identifier: &str) -> Result<Arc<GridTile>> {
        if let Some(tile) = self.tiles.get(identifier) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Ok(tile);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        let _guard = self.load_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished loading while we waited
        if let Some(tile) = self.tiles.get(identifier) {
            return Ok(tile);
        }

        let tile = Arc::new(self.load_tile(identifier)?);
        self.tiles.insert(identifier.to_string(), tile.clone());

        Ok(tile)
    }

    /// Load a tile into memory ahead of time.
    ///
    /// Returns `false` if the tile was already in memory.
    pub fn prefetch(&self, identifier: &str) -> Result<bool> {
        if self.contains(identifier) {
            return Ok(false);
        }
        self.get_tile(identifier)?;
        Ok(true)
    }

    /// Returns `true` if the tile is decoded in memory.
    pub fn contains(&self, identifier: &str) -> bool {
        self.tiles.contains_key(identifier)
    }

    /// Which durable form of a tile exists in the cache directory, if any.
    pub fn stored_form(&self, identifier: &str) -> Option<StoredForm> {
        let snapshot = snapshot_path(&self.cache_dir, identifier).exists();
        let archive = archive_path(&self.cache_dir, identifier).exists();
        match (snapshot, archive) {
            (true, true) => Some(StoredForm::Both),
            (true, false) => Some(StoredForm::Snapshot),
            (false, true) => Some(StoredForm::Archive),
            (false, false) => None,
        }
    }

    /// Scan the cache directory for stored tiles.
    ///
    /// Returns a sorted, deduplicated list of identifiers that have a
    /// snapshot or an archive on disk.
    pub fn scan_cached_tiles(&self) -> Vec<String> {
        let mut identifiers = HashSet::new();

        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_tile_file = path
                .extension()
                .map(|e| e == SNAPSHOT_EXTENSION || e == "zip")
                .unwrap_or(false);
            if !is_tile_file {
                continue;
            }

            let name = entry.file_name();
            let name = name.to_string_lossy();
            if parse_identifier(&name).is_some() {
                if let Some((stem, _)) = name.split_once('.') {
                    identifiers.insert(stem.to_string());
                }
            }
        }

        let mut result: Vec<String> = identifiers.into_iter().collect();
        result.sort();
        result
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.tiles.run_pending_tasks();
        CacheStats {
            entry_count: self.tiles.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            fetch_count: self.fetch_count.load(Ordering::Relaxed),
        }
    }

    /// Get the cache directory path.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the durable tier strategy.
    pub fn durable_tier(&self) -> DurableTier {
        self.durable_tier
    }

    /// Get the base URL archives are fetched from.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if a transport is configured for the remote tier.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Resolve a tile that is not in memory.
    fn load_tile(&self, identifier: &str) -> Result<GridTile> {
        let snapshot = snapshot_path(&self.cache_dir, identifier);

        if self.durable_tier == DurableTier::Snapshot && snapshot.exists() {
            match read_snapshot(&snapshot) {
                Ok(tile) => {
                    tracing::debug!(identifier, "Loaded tile from snapshot");
                    return Ok(tile);
                }
                Err(e @ GridError::Snapshot { .. }) => {
                    tracing::warn!(
                        identifier,
                        path = %snapshot.display(),
                        error = %e,
                        "Discarding corrupt snapshot"
                    );
                    remove_quietly(&snapshot);
                }
                // I/O failures may be transient, so the file is left in place
                Err(e) => {
                    tracing::warn!(
                        identifier,
                        path = %snapshot.display(),
                        error = %e,
                        "Failed to read snapshot"
                    );
                }
            }
        }

        let zip_path = archive_path(&self.cache_dir, identifier);
        let text = if zip_path.exists() {
            match extract_grid(&zip_path, identifier) {
                Ok(text) => {
                    tracing::debug!(identifier, "Using archive from cache directory");
                    text
                }
                Err(e) => {
                    tracing::warn!(
                        identifier,
                        path = %zip_path.display(),
                        error = %e,
                        "Discarding unreadable archive"
                    );
                    remove_quietly(&zip_path);
                    self.fetch_grid_text(identifier, &zip_path)?
                }
            }
        } else {
            self.fetch_grid_text(identifier, &zip_path)?
        };

        let tile = match parse_grid(&text) {
            Ok(tile) => tile,
            Err(e) => {
                // A malformed archive must not count as a durable copy
                remove_quietly(&zip_path);
                return Err(e);
            }
        };

        if self.durable_tier == DurableTier::Snapshot {
            match write_snapshot(&snapshot, &tile) {
                Ok(()) => {
                    tracing::info!(identifier, path = %snapshot.display(), "Wrote tile snapshot");
                    remove_quietly(&zip_path);
                }
                Err(e) => {
                    tracing::warn!(
                        identifier,
                        path = %snapshot.display(),
                        error = %e,
                        "Failed to write tile snapshot, keeping archive"
                    );
                }
            }
        }

        Ok(tile)
    }

    /// Fetch the archive through the transport and extract its grid text.
    fn fetch_grid_text(&self, identifier: &str, zip_path: &Path) -> Result<String> {
        let transport = self
            .transport
            .as_ref()
            .ok_or_else(|| GridError::TileUnavailable {
                identifier: identifier.to_string(),
                reason: "No transport configured".to_string(),
            })?;

        let url = archive_url(&self.base_url, identifier);
        tracing::info!(identifier, url = %url, "Fetching tile archive");

        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        transport.fetch(&url, zip_path).map_err(|e| match e {
            GridError::TileUnavailable { reason, .. } => GridError::TileUnavailable {
                identifier: identifier.to_string(),
                reason,
            },
            other => other,
        })?;

        extract_grid(zip_path, identifier).map_err(|e| {
            remove_quietly(zip_path);
            e
        })
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache file");
        }
    }
}

/// Builder for creating [`TileCache`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use srtm_grid::{DurableTier, TileCacheBuilder, download::DownloadConfig};
///
/// let cache = TileCacheBuilder::new("/var/cache/srtm")
///     .durable_tier(DurableTier::ArchiveOnly)
///     .download_config(DownloadConfig::with_base_url("https://mirror.example.com/srtm/"))
///     .build()?;
/// ```
pub struct TileCacheBuilder {
    cache_dir: PathBuf,
    durable_tier: DurableTier,
    download_config: DownloadConfig,
    transport: Option<Box<dyn TileTransport>>,
    offline: bool,
}

impl TileCacheBuilder {
    /// Create a new builder with the specified cache directory.
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
            durable_tier: DurableTier::default(),
            download_config: DownloadConfig::default(),
            transport: None,
            offline: false,
        }
    }

    /// Set the durable tier strategy.
    ///
    /// Default is [`DurableTier::Snapshot`].
    pub fn durable_tier(mut self, tier: DurableTier) -> Self {
        self.durable_tier = tier;
        self
    }

    /// Set the directory URL archives are fetched from.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.download_config.base_url = base_url.into();
        self
    }

    /// Set the download configuration (base URL, timeout, retries).
    pub fn download_config(mut self, config: DownloadConfig) -> Self {
        self.download_config = config;
        self
    }

    /// Use a custom transport for the remote tier.
    pub fn transport(mut self, transport: impl TileTransport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Disable the remote tier: only memory and disk are consulted.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Build the [`TileCache`], creating the cache directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// HTTP client cannot be initialized.
    pub fn build(self) -> Result<TileCache> {
        fs::create_dir_all(&self.cache_dir)?;

        let transport = if self.offline {
            None
        } else {
            match self.transport {
                Some(transport) => Some(transport),
                None => default_transport(&self.download_config)?,
            }
        };

        Ok(TileCache {
            cache_dir: self.cache_dir,
            durable_tier: self.durable_tier,
            base_url: self.download_config.base_url,
            transport,
            tiles: Cache::builder().build(),
            load_lock: Mutex::new(()),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            fetch_count: AtomicU64::new(0),
        })
    }
}

#[cfg(feature = "download")]
fn default_transport(config: &DownloadConfig) -> Result<Option<Box<dyn TileTransport>>> {
    Ok(Some(Box::new(HttpTransport::new(config)?)))
}

#[cfg(not(feature = "download"))]
fn default_transport(_config: &DownloadConfig) -> Result<Option<Box<dyn TileTransport>>> {
    Ok(None)
}
