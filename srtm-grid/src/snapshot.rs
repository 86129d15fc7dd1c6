//! Durable binary snapshots of decoded tiles.
//!
//! Parsing a 6000 × 6000 ASCII grid takes seconds; loading the same tile
//! from a snapshot is a single memory-mapped copy. Snapshots live next to
//! the downloaded archives as `<identifier>.grd`.
//!
//! # Layout
//!
//! All values are little-endian.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 8 | magic `SRTMGRD1` |
//! | 8 | 4 | rows (`u32`) |
//! | 12 | 4 | cols (`u32`) |
//! | 16 | 8 | x_ll (`f64`) |
//! | 24 | 8 | y_ll (`f64`) |
//! | 32 | 8 | cell_size (`f64`) |
//! | 40 | 4 × rows × cols | samples (`i32`, row-major, north row first) |

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::error::{GridError, Result};
use crate::grid::{GridHeader, GridTile};

/// File extension of snapshot files.
pub const SNAPSHOT_EXTENSION: &str = "grd";

const MAGIC: &[u8; 8] = b"SRTMGRD1";
const HEADER_SIZE: usize = 40;

/// Path of the snapshot for `identifier` inside `cache_dir`.
pub fn snapshot_path(cache_dir: &Path, identifier: &str) -> PathBuf {
    cache_dir.join(format!("{}.{}", identifier, SNAPSHOT_EXTENSION))
}

/// Serialize a tile into the snapshot layout.
pub fn encode(tile: &GridTile) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + tile.samples().len() * 4);
    out.extend_from_slice(&header_bytes(tile));
    for v in tile.samples() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Deserialize a tile from the snapshot layout.
pub fn decode(data: &[u8]) -> Result<GridTile> {
    decode_bytes(data).map_err(|reason| GridError::Snapshot {
        path: PathBuf::new(),
        reason,
    })
}

/// Write a snapshot atomically.
///
/// The bytes go to a temporary file in the destination directory, which is
/// synced and then renamed over `path`. Readers never observe a partially
/// written snapshot.
pub fn write_snapshot(path: &Path, tile: &GridTile) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let prefix = format!(
        ".{}.",
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    );

    let tmp = tempfile::Builder::new().prefix(&prefix).tempfile_in(dir)?;
    let mut writer = BufWriter::new(tmp);
    write_to(&mut writer, tile)?;
    let tmp = writer.into_inner().map_err(|e| e.into_error())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// Read a snapshot from disk.
///
/// # Errors
///
/// Returns [`GridError::Io`] if the file cannot be opened or mapped and
/// [`GridError::Snapshot`] if its contents are not a valid snapshot.
pub fn read_snapshot(path: &Path) -> Result<GridTile> {
    let file = File::open(path)?;

    // SAFETY: Snapshots are only ever replaced by rename, never modified in
    // place, so the mapped inode stays unchanged while it is mapped.
    let mmap = unsafe { Mmap::map(&file)? };

    decode_bytes(&mmap).map_err(|reason| GridError::Snapshot {
        path: path.to_path_buf(),
        reason,
    })
}

fn header_bytes(tile: &GridTile) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[0..8].copy_from_slice(MAGIC);
    header[8..12].copy_from_slice(&(tile.rows() as u32).to_le_bytes());
    header[12..16].copy_from_slice(&(tile.cols() as u32).to_le_bytes());
    header[16..24].copy_from_slice(&tile.x_ll().to_le_bytes());
    header[24..32].copy_from_slice(&tile.y_ll().to_le_bytes());
    header[32..40].copy_from_slice(&tile.cell_size().to_le_bytes());
    header
}

fn write_to<W: Write>(w: &mut W, tile: &GridTile) -> std::io::Result<()> {
    w.write_all(&header_bytes(tile))?;

    for row in tile.samples().chunks(tile.cols().max(1)) {
        let bytes: Vec<u8> = row.iter().flat_map(|v| v.to_le_bytes()).collect();
        w.write_all(&bytes)?;
    }

    Ok(())
}

fn decode_bytes(data: &[u8]) -> std::result::Result<GridTile, String> {
    if data.len() < HEADER_SIZE {
        return Err(format!("truncated header ({} bytes)", data.len()));
    }
    if &data[0..8] != MAGIC {
        return Err("bad magic".to_string());
    }

    let rows = u32_at(data, 8) as usize;
    let cols = u32_at(data, 12) as usize;
    let header = GridHeader {
        rows,
        cols,
        x_ll: f64_at(data, 16),
        y_ll: f64_at(data, 24),
        cell_size: f64_at(data, 32),
    };

    if rows == 0 || cols == 0 {
        return Err(format!("empty grid {}x{}", rows, cols));
    }
    if !(header.cell_size.is_finite() && header.cell_size > 0.0) {
        return Err(format!("invalid cell size {}", header.cell_size));
    }

    let expected = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(4))
        .and_then(|n| n.checked_add(HEADER_SIZE))
        .ok_or_else(|| format!("grid {}x{} overflows", rows, cols))?;
    if data.len() != expected {
        return Err(format!(
            "expected {} bytes for {}x{} grid, found {}",
            expected,
            rows,
            cols,
            data.len()
        ));
    }

    let elevation = data[HEADER_SIZE..]
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    GridTile::new(header, elevation).map_err(|e| e.to_string())
}

fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn f64_at(data: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}
