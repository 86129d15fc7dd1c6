use anyhow::{Context, Result};
use serde::Serialize;

use super::CacheOptions;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    tile: String,
    /// Meters, or -9999 where no data exists
    elevation: i32,
}

pub fn run(options: &CacheOptions, lat: f64, lon: f64, json: bool) -> Result<()> {
    let service = options.service()?;

    let elevation = service
        .elevation(lat, lon)
        .context("Failed to get elevation")?;

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            tile: service.tile_identifier(lat, lon),
            elevation,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", elevation);
    }

    Ok(())
}
