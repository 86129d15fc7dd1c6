//! # srtm-grid - SRTM 5° ASCII Grid Elevation Library
//!
//! Elevation lookups over the CGIAR-CSI SRTM 90m dataset, distributed as
//! 5° × 5° zipped ASCII grids, with a tiered tile cache.
//!
//! ## Features
//!
//! - **Tiered**: decoded tiles in memory, binary snapshots on disk, archives
//!   fetched on demand
//! - **Fast restarts**: snapshots are memory-mapped instead of re-parsing
//!   tens of megabytes of text
//! - **Pluggable transport**: HTTP by default (`download` feature), or any
//!   [`TileTransport`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use srtm_grid::{ElevationService, index};
//!
//! // Which tile covers a coordinate
//! assert_eq!(index::identifier_for(34.1225696, -118.2181179), "srtm_13_06");
//!
//! let service = ElevationService::open("/var/cache/srtm")?;
//! let elevation = service.elevation(34.1225696, -118.2181179)?;
//! println!("Elevation: {}m", elevation);
//! ```
//!
//! ## Data Format
//!
//! Each tile is an ESRI ASCII grid: a six line header (`ncols`, `nrows`,
//! `xllcorner`, `yllcorner`, `cellsize`, `NODATA_value`) followed by one row
//! of integer samples per line, north row first. Voids hold
//! [`NO_DATA`] (`-9999`), which is also what lookups return when a tile
//! cannot be obtained.
//!
//! ## Data Sources
//!
//! - <http://srtm.csi.cgiar.org/>

pub mod archive;
pub mod cache;
pub mod download;
pub mod error;
pub mod grid;
pub mod index;
pub mod parser;
pub mod service;
pub mod snapshot;

// Re-export main types at crate root for convenience
pub use cache::{CacheStats, DurableTier, StoredForm, TileCache, TileCacheBuilder};
pub use download::{DownloadConfig, TileTransport};
pub use error::{GridError, Result};
pub use grid::{GridHeader, GridTile, TileStats, NO_DATA};
pub use service::ElevationService;

#[cfg(feature = "download")]
pub use download::HttpTransport;
