//! Basic example demonstrating srtm-grid library usage.
//!
//! Run with: cargo run --example basic -- /path/to/cache/dir

use srtm_grid::{ElevationService, GridError, NO_DATA};
use std::env;

fn main() -> Result<(), GridError> {
    // Get cache directory from command line
    let cache_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/cache/dir");
        std::process::exit(1);
    });

    // Tiles are downloaded into the cache directory on first use
    let service = ElevationService::open(&cache_dir)?;

    let locations = [
        ("Griffith Observatory, Los Angeles", 34.1225696, -118.2181179),
        ("Mount Fuji, Japan", 35.3606, 138.7274),
        ("Mid-Pacific", -12.0, -155.0),
    ];

    println!("Elevation queries:");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        let identifier = service.tile_identifier(*lat, *lon);
        match service.elevation(*lat, *lon)? {
            NO_DATA => println!("{} ({}): no data", name, identifier),
            elevation => println!("{} ({}): {}m", name, identifier, elevation),
        }
    }

    // Show cache statistics
    let stats = service.cache().cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Downloads: {}", stats.fetch_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
