//! Elevation lookups by coordinate.
//!
//! [`ElevationService`] is the front door of the library: it maps a
//! coordinate to its tile, asks the [`TileCache`] for it and reads the
//! nearest cell.
//!
//! ```ignore
//! use srtm_grid::ElevationService;
//!
//! let service = ElevationService::open("/var/cache/srtm")?;
//!
//! // Downloads srtm_13_06 on first use
//! let elevation = service.elevation(34.1225696, -118.2181179)?;
//! println!("Elevation: {}m", elevation);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::cache::TileCache;
use crate::error::Result;
use crate::grid::{GridTile, NO_DATA};
use crate::index::identifier_for;

/// Elevation service backed by a tiered tile cache.
///
/// # Thread Safety
///
/// `ElevationService` is `Send + Sync` and can be shared across threads.
pub struct ElevationService {
    cache: TileCache,
}

impl ElevationService {
    /// Create a service over an already configured cache.
    pub fn new(cache: TileCache) -> Self {
        Self { cache }
    }

    /// Create a service with a default [`TileCache`] in `cache_dir`.
    pub fn open<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        Ok(Self::new(TileCache::new(cache_dir)?))
    }

    /// Identifier of the tile covering a coordinate.
    pub fn tile_identifier(&self, lat: f64, lon: f64) -> String {
        identifier_for(lat, lon)
    }

    /// Get the elevation in meters at the specified coordinates.
    ///
    /// # Returns
    ///
    /// - `Ok(elevation)` - the sample of the nearest cell, which is
    ///   [`NO_DATA`] for voids
    /// - `Ok(NO_DATA)` - the tile is not available or the coordinate falls
    ///   outside its grid
    /// - `Err(...)` - the tile data is malformed or the cache failed
    pub fn elevation(&self, lat: f64, lon: f64) -> Result<i32> {
        match self.tile_for(lat, lon)? {
            Some(tile) => Ok(sample(&tile, lat, lon)),
            None => Ok(NO_DATA),
        }
    }

    /// Get the tile covering a coordinate.
    ///
    /// Returns `Ok(None)` if the tile cannot be obtained from any tier.
    pub fn tile_for(&self, lat: f64, lon: f64) -> Result<Option<Arc<GridTile>>> {
        let identifier = identifier_for(lat, lon);
        match self.cache.get_tile(&identifier) {
            Ok(tile) => Ok(Some(tile)),
            Err(e) if e.is_unavailable() => {
                tracing::info!(identifier = %identifier, error = %e, "Tile unavailable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Get elevations for a batch of coordinates.
    ///
    /// Coordinates are grouped by tile so that each unique tile is resolved
    /// only once. Results are returned in input order with the same
    /// semantics as [`elevation`](Self::elevation).
    pub fn elevations(&self, coords: &[(f64, f64)]) -> Result<Vec<i32>> {
        let mut results = vec![NO_DATA; coords.len()];

        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, &(lat, lon)) in coords.iter().enumerate() {
            groups.entry(identifier_for(lat, lon)).or_default().push(i);
        }

        for indices in groups.values() {
            let (lat, lon) = coords[indices[0]];
            if let Some(tile) = self.tile_for(lat, lon)? {
                for &i in indices {
                    let (lat, lon) = coords[i];
                    results[i] = sample(&tile, lat, lon);
                }
            }
        }

        Ok(results)
    }

    /// Load the tile covering a coordinate ahead of time.
    ///
    /// Returns `false` if it was already in memory.
    pub fn prefetch(&self, lat: f64, lon: f64) -> Result<bool> {
        self.cache.prefetch(&identifier_for(lat, lon))
    }

    /// The underlying tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }
}

fn sample(tile: &GridTile, lat: f64, lon: f64) -> i32 {
    tile.get_elevation(lat, lon).unwrap_or_else(|| {
        tracing::debug!(lat, lon, "Coordinate outside tile grid");
        NO_DATA
    })
}
