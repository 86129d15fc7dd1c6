use anyhow::{bail, Context, Result};
use srtm_grid::index::{identifier_for, parse_identifier, partition_origin, tile_identifier};

use super::{format_size, CacheOptions};

pub fn run(
    options: &CacheOptions,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let identifier = match (tile, lat, lon) {
        (_, Some(lat), Some(lon)) => identifier_for(lat, lon),
        (Some(tile), _, _) => match parse_identifier(&tile) {
            // Normalizes paths and extensions to the bare identifier
            Some((x, y)) => tile_identifier(x, y),
            None => bail!("Not a tile identifier: {} (expected e.g. srtm_13_06)", tile),
        },
        _ => bail!("Specify a tile identifier or both --lat and --lon"),
    };

    let service = options.service()?;
    let tile = match service.cache().get_tile(&identifier) {
        Ok(tile) => tile,
        Err(e) if e.is_unavailable() => bail!("Tile {} is not available: {}", identifier, e),
        Err(e) => return Err(e).with_context(|| format!("Failed to load tile {}", identifier)),
    };

    let stats = tile.stats();
    let header = tile.header();

    println!("Tile: {}", identifier);
    if let Some((x, y)) = parse_identifier(&identifier) {
        let (west, south) = partition_origin(x, y);
        println!(
            "Partition: x={} y={} (lon {} to {}, lat {} to {})",
            x,
            y,
            west,
            west + 5.0,
            south,
            south + 5.0
        );
    }
    if let Some(form) = service.cache().stored_form(&identifier) {
        println!("Stored as: {:?}", form);
    }
    println!();
    println!("Dimensions: {} rows x {} cols", header.rows, header.cols);
    println!("Lower-left corner: lon {}, lat {}", header.x_ll, header.y_ll);
    println!("Cell size: {}°", header.cell_size);
    println!(
        "In-memory size: {}",
        format_size((tile.samples().len() * std::mem::size_of::<i32>()) as u64)
    );
    println!();

    if let (Some(min), Some(max)) = (stats.min, stats.max) {
        println!("Min elevation: {}m", min);
        println!("Max elevation: {}m", max);
    }

    if stats.void_count > 0 {
        let void_pct = (stats.void_count as f64 / header.len() as f64) * 100.0;
        println!("Void samples: {} ({:.1}%)", stats.void_count, void_pct);
    }

    Ok(())
}
