//! End-to-end lookups through the public API with a fake remote source.

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use srtm_grid::parser::parse_grid;
use srtm_grid::{
    DurableTier, ElevationService, GridError, StoredForm, TileCache, TileTransport, NO_DATA,
};
use tempfile::TempDir;

/// A directory of archives keyed by file name, counting every request.
#[derive(Clone, Default)]
struct Mirror {
    archives: Arc<HashMap<String, Vec<u8>>>,
    requests: Arc<AtomicUsize>,
}

impl Mirror {
    fn with_tile(identifier: &str, text: &str) -> Self {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(
            format!("{}.asc", identifier),
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        zip.write_all(text.as_bytes()).unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let mut archives = HashMap::new();
        archives.insert(format!("{}.zip", identifier), bytes);
        Self {
            archives: Arc::new(archives),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl TileTransport for Mirror {
    fn fetch(&self, url: &str, dest: &Path) -> srtm_grid::Result<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let name = url.rsplit('/').next().unwrap_or(url);
        match self.archives.get(name) {
            Some(bytes) => Ok(std::fs::write(dest, bytes)?),
            None => Err(GridError::TileUnavailable {
                identifier: name.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            }),
        }
    }
}

/// 10x10 grid over the south-west corner of srtm_13_06, sample = row * 100 + col.
fn los_angeles_grid() -> String {
    let mut text = String::from(
        "ncols 10\nnrows 10\nxllcorner -120\nyllcorner 30\ncellsize 0.5\nNODATA_value -9999\n",
    );
    for row in 0..10 {
        let line: Vec<String> = (0..10).map(|col| (row * 100 + col).to_string()).collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

fn service(dir: &Path, mirror: &Mirror, tier: DurableTier) -> ElevationService {
    let cache = TileCache::builder(dir)
        .durable_tier(tier)
        .base_url("https://mirror.example.com/srtm_5x5/ASCII/")
        .transport(mirror.clone())
        .build()
        .unwrap();
    ElevationService::new(cache)
}

#[test]
fn test_lookup_downloads_once_and_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = Mirror::with_tile("srtm_13_06", &los_angeles_grid());

    let first = service(temp_dir.path(), &mirror, DurableTier::Snapshot);
    assert_eq!(first.tile_identifier(34.1225696, -118.2181179), "srtm_13_06");
    assert_eq!(first.elevation(34.1225696, -118.2181179).unwrap(), 204);
    assert_eq!(first.elevation(34.1225696, -118.2181179).unwrap(), 204);
    assert_eq!(mirror.requests(), 1);
    assert_eq!(
        first.cache().stored_form("srtm_13_06"),
        Some(StoredForm::Snapshot)
    );

    // A new process over the same cache directory reads the snapshot
    let second = service(temp_dir.path(), &mirror, DurableTier::Snapshot);
    assert_eq!(second.elevation(34.1225696, -118.2181179).unwrap(), 204);
    assert_eq!(mirror.requests(), 1);
}

#[test]
fn test_archive_only_tier_reuses_archive() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = Mirror::with_tile("srtm_13_06", &los_angeles_grid());

    let first = service(temp_dir.path(), &mirror, DurableTier::ArchiveOnly);
    assert_eq!(first.elevation(34.1225696, -118.2181179).unwrap(), 204);

    let second = service(temp_dir.path(), &mirror, DurableTier::ArchiveOnly);
    assert_eq!(second.elevation(34.1225696, -118.2181179).unwrap(), 204);

    assert_eq!(mirror.requests(), 1);
    assert_eq!(
        second.cache().scan_cached_tiles(),
        vec!["srtm_13_06".to_string()]
    );
    assert_eq!(
        second.cache().stored_form("srtm_13_06"),
        Some(StoredForm::Archive)
    );
}

#[test]
fn test_unavailable_tile_yields_sentinel_and_is_retried() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = Mirror::default();
    let service = service(temp_dir.path(), &mirror, DurableTier::Snapshot);

    assert_eq!(service.elevation(34.1225696, -118.2181179).unwrap(), NO_DATA);
    assert_eq!(service.elevation(34.1225696, -118.2181179).unwrap(), NO_DATA);

    assert_eq!(mirror.requests(), 2);
    assert!(service.cache().scan_cached_tiles().is_empty());
}

#[test]
fn test_malformed_tile_is_fatal_and_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let text = los_angeles_grid().replace("300 301 302", "300 302");
    let mirror = Mirror::with_tile("srtm_13_06", &text);
    let service = service(temp_dir.path(), &mirror, DurableTier::Snapshot);

    for attempt in 1..=2 {
        match service.elevation(34.1225696, -118.2181179) {
            Err(GridError::RowLength {
                row: 3,
                expected: 10,
                found: 9,
            }) => {}
            other => panic!("Expected RowLength error, got {:?}", other),
        }
        assert_eq!(mirror.requests(), attempt);
    }

    assert!(!service.cache().contains("srtm_13_06"));
    assert!(service.cache().scan_cached_tiles().is_empty());
}

#[test]
fn test_small_grid_cell_selection() {
    let text = "ncols 4\nnrows 2\nxllcorner 0.0\nyllcorner 0.0\ncellsize 1.0\nNODATA_value -9999\n1 2 3 4\n5 6 7 8\n";
    let tile = parse_grid(text).unwrap();

    assert_eq!(tile.value_at(1, 0), Some(5));
    // row = 2 - trunc(0.5 / 1 + 0.5) = 1, col = trunc(0.4 / 1 + 0.5) = 0
    assert_eq!(tile.get_elevation(0.5, 0.4), Some(5));
    // row = 2 - trunc(1.6 + 0.5) = 0, col = trunc(3.2 + 0.5) = 3
    assert_eq!(tile.get_elevation(1.6, 3.2), Some(4));
}

#[test]
fn test_batch_lookup_matches_single_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let mirror = Mirror::with_tile("srtm_13_06", &los_angeles_grid());
    let service = service(temp_dir.path(), &mirror, DurableTier::Snapshot);

    let coords = [
        (34.1225696, -118.2181179),
        (30.3, -119.8),
        (-33.9, 18.4),
        (34.0, -117.0),
    ];
    let batch = service.elevations(&coords).unwrap();
    let single: Vec<i32> = coords
        .iter()
        .map(|&(lat, lon)| service.elevation(lat, lon).unwrap())
        .collect();

    assert_eq!(batch, single);
    assert_eq!(batch[0], 204);
    assert_eq!(batch[2], NO_DATA);
}
