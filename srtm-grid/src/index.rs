//! Tile indexing for the 5° × 5° SRTM partition.
//!
//! This module maps geographic coordinates to partition coordinates and to
//! the canonical tile identifiers used for caching and remote lookup.
//!
//! # Identifier Format
//!
//! Tiles follow the CGIAR-CSI naming convention: `srtm_{x:02}_{y:02}`
//!
//! - `x`: column of the partition, 1 at 180°W, growing eastwards (1..=72)
//! - `y`: row of the partition, 1 at 60°N, growing southwards (1..=24)
//!
//! The partition indices use truncation toward zero, not floor, which is the
//! convention of the distributed dataset index. Coordinates south of the
//! equator therefore resolve one row north of their geometric partition.

/// Width and height of one partition in degrees.
pub const PARTITION_DEGREES: f64 = 5.0;

/// Compute the `(x, y)` partition coordinates for a geographic coordinate.
///
/// Inputs are not validated; values outside the conventional grid still
/// produce an answer.
///
/// # Examples
///
/// ```
/// use srtm_grid::index::tile_coordinate;
///
/// assert_eq!(tile_coordinate(34.12, -118.22), (13, 6));
/// assert_eq!(tile_coordinate(0.0, 0.0), (37, 12));
/// ```
pub fn tile_coordinate(lat: f64, lon: f64) -> (i32, i32) {
    // `as i32` truncates toward zero
    let x = ((lon + 180.0) / PARTITION_DEGREES) as i32 + 1;
    let y = (-lat / PARTITION_DEGREES) as i32 + 12;
    (x, y)
}

/// Format partition coordinates as a tile identifier.
///
/// # Examples
///
/// ```
/// use srtm_grid::index::tile_identifier;
///
/// assert_eq!(tile_identifier(13, 6), "srtm_13_06");
/// assert_eq!(tile_identifier(1, 1), "srtm_01_01");
/// ```
pub fn tile_identifier(x: i32, y: i32) -> String {
    format!("srtm_{:02}_{:02}", x, y)
}

/// Tile identifier for a geographic coordinate.
///
/// # Examples
///
/// ```
/// use srtm_grid::index::identifier_for;
///
/// assert_eq!(identifier_for(34.1225696, -118.2181179), "srtm_13_06");
/// ```
pub fn identifier_for(lat: f64, lon: f64) -> String {
    let (x, y) = tile_coordinate(lat, lon);
    tile_identifier(x, y)
}

/// Parse a tile identifier back into partition coordinates.
///
/// Accepts a bare identifier, a file name with any extension, or a path.
///
/// # Examples
///
/// ```
/// use srtm_grid::index::parse_identifier;
///
/// assert_eq!(parse_identifier("srtm_13_06"), Some((13, 6)));
/// assert_eq!(parse_identifier("/cache/srtm_13_06.zip"), Some((13, 6)));
/// assert_eq!(parse_identifier("N35E138.hgt"), None);
/// ```
pub fn parse_identifier(name: &str) -> Option<(i32, i32)> {
    let name = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(name);
    let name = match name.find('.') {
        Some(dot) => &name[..dot],
        None => name,
    };

    let rest = name.strip_prefix("srtm_")?;
    let (x, y) = rest.split_once('_')?;
    if x.len() < 2 || y.len() < 2 {
        return None;
    }
    if !x.bytes().all(|b| b.is_ascii_digit()) || !y.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some((x.parse().ok()?, y.parse().ok()?))
}

/// Nominal lower-left corner `(lon, lat)` of a partition in degrees.
///
/// The grid header of a tile is authoritative; this is only the corner
/// implied by the partition scheme.
pub fn partition_origin(x: i32, y: i32) -> (f64, f64) {
    let lon = (x - 1) as f64 * PARTITION_DEGREES - 180.0;
    let lat = 60.0 - y as f64 * PARTITION_DEGREES;
    (lon, lat)
}
