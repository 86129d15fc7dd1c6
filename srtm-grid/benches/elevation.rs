use std::io::{Cursor, Write};
use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use srtm_grid::{ElevationService, GridError, TileCache, TileTransport};
use tempfile::TempDir;

const SAMPLES: usize = 600;

/// Synthetic grid over srtm_13_06 with a simple elevation gradient.
fn grid_text() -> String {
    let mut text = format!(
        "ncols {n}\nnrows {n}\nxllcorner -120\nyllcorner 30\ncellsize {}\nNODATA_value -9999\n",
        5.0 / SAMPLES as f64,
        n = SAMPLES
    );
    for row in 0..SAMPLES {
        let line: Vec<String> = (0..SAMPLES)
            .map(|col| ((row + col) % 4000).to_string())
            .collect();
        text.push_str(&line.join(" "));
        text.push('\n');
    }
    text
}

struct InMemoryTransport {
    archive: Vec<u8>,
}

impl InMemoryTransport {
    fn new(text: &str) -> Self {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("srtm_13_06.asc", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(text.as_bytes()).unwrap();
        let archive = zip.finish().unwrap().into_inner();
        Self { archive }
    }
}

impl TileTransport for InMemoryTransport {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), GridError> {
        if !url.ends_with("srtm_13_06.zip") {
            return Err(GridError::TileUnavailable {
                identifier: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            });
        }
        std::fs::write(dest, &self.archive)?;
        Ok(())
    }
}

fn create_service(tmp: &TempDir) -> ElevationService {
    let cache = TileCache::builder(tmp.path())
        .transport(InMemoryTransport::new(&grid_text()))
        .build()
        .unwrap();
    ElevationService::new(cache)
}

fn bench_parse(c: &mut Criterion) {
    let text = grid_text();

    c.bench_function("parse_600x600_grid", |b| {
        b.iter(|| {
            black_box(srtm_grid::parser::parse_grid(black_box(&text)).unwrap());
        });
    });
}

fn bench_snapshot_load(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let tile = srtm_grid::parser::parse_grid(&grid_text()).unwrap();
    let path = srtm_grid::snapshot::snapshot_path(tmp.path(), "srtm_13_06");
    srtm_grid::snapshot::write_snapshot(&path, &tile).unwrap();

    c.bench_function("snapshot_load_600x600", |b| {
        b.iter(|| {
            black_box(srtm_grid::snapshot::read_snapshot(black_box(&path)).unwrap());
        });
    });
}

fn bench_single_cached(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let service = create_service(&tmp);

    // Warm the cache
    let _ = service.elevation(34.1225696, -118.2181179);

    c.bench_function("single_cached", |b| {
        b.iter(|| {
            black_box(
                service
                    .elevation(black_box(34.1225696), black_box(-118.2181179))
                    .unwrap(),
            );
        });
    });
}

fn bench_batch_same_tile(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let service = create_service(&tmp);

    // Generate 1000 coords within the same tile
    let coords: Vec<(f64, f64)> = (0..1000)
        .map(|i| {
            let frac = i as f64 / 1000.0;
            (30.5 + frac * 4.0, -119.5 + frac * 4.0)
        })
        .collect();

    // Warm the cache
    let _ = service.elevation(32.0, -118.0);

    c.bench_function("batch_1000_same_tile", |b| {
        b.iter(|| {
            black_box(service.elevations(black_box(&coords)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_snapshot_load,
    bench_single_cached,
    bench_batch_same_tile
);
criterion_main!(benches);
