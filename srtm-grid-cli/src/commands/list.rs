use anyhow::Result;
use srtm_grid::archive::archive_path;
use srtm_grid::snapshot::snapshot_path;
use srtm_grid::StoredForm;
use std::fs;

use super::{format_size, CacheOptions};

pub fn run(options: &CacheOptions) -> Result<()> {
    let cache = options.offline_cache()?;
    let tiles = cache.scan_cached_tiles();

    if tiles.is_empty() {
        println!("No cached tiles in: {}", cache.cache_dir().display());
        return Ok(());
    }

    let mut snapshot_count = 0;
    let mut archive_count = 0;
    let mut total_size: u64 = 0;

    println!("{:<12} {:>10} {:>12}", "TILE", "STORED AS", "SIZE");
    println!("{}", "-".repeat(36));

    for identifier in &tiles {
        let form = match cache.stored_form(identifier) {
            Some(StoredForm::Snapshot) => {
                snapshot_count += 1;
                "snapshot"
            }
            Some(StoredForm::Archive) => {
                archive_count += 1;
                "archive"
            }
            Some(StoredForm::Both) => {
                snapshot_count += 1;
                archive_count += 1;
                "both"
            }
            None => continue,
        };

        let size: u64 = [
            snapshot_path(cache.cache_dir(), identifier),
            archive_path(cache.cache_dir(), identifier),
        ]
        .iter()
        .filter_map(|path| fs::metadata(path).ok())
        .map(|m| m.len())
        .sum();
        total_size += size;

        println!("{:<12} {:>10} {:>12}", identifier, form, format_size(size));
    }

    // Summary
    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    println!("  Snapshots: {}", snapshot_count);
    println!("  Archives: {}", archive_count);
    println!("  Total size: {}", format_size(total_size));
    println!("  Cache directory: {}", cache.cache_dir().display());

    Ok(())
}
