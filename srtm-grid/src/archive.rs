//! Extraction of grid text from tile archives.
//!
//! Each tile is distributed as `<identifier>.zip` holding a single
//! `<identifier>.asc` grid file.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{GridError, Result};

/// File extension of the grid file inside an archive.
pub const GRID_EXTENSION: &str = "asc";

/// Path of the archive for `identifier` inside `cache_dir`.
pub fn archive_path(cache_dir: &Path, identifier: &str) -> PathBuf {
    cache_dir.join(format!("{}.zip", identifier))
}

/// Read the grid text of `identifier` from a zip file on disk.
pub fn extract_grid(zip_path: &Path, identifier: &str) -> Result<String> {
    let file = File::open(zip_path).map_err(|e| GridError::Archive {
        identifier: identifier.to_string(),
        reason: format!("Failed to open {}: {}", zip_path.display(), e),
    })?;
    extract_grid_from(BufReader::new(file), identifier)
}

/// Read the grid text of `identifier` from a zip stream.
///
/// The entry `<identifier>.asc` is preferred; otherwise the first entry with
/// an `.asc` extension (case-insensitive) is used.
pub fn extract_grid_from<R: Read + Seek>(reader: R, identifier: &str) -> Result<String> {
    let archive_err = |reason: String| GridError::Archive {
        identifier: identifier.to_string(),
        reason,
    };

    let mut archive = ZipArchive::new(reader)
        .map_err(|e| archive_err(format!("Failed to read ZIP archive: {}", e)))?;

    let wanted = format!("{}.{}", identifier, GRID_EXTENSION);
    let suffix = format!(".{}", GRID_EXTENSION);

    let mut exact = None;
    let mut fallback = None;
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| archive_err(format!("Failed to read ZIP entry: {}", e)))?;

        let name = entry.name().to_lowercase();
        if name == wanted.to_lowercase() {
            exact = Some(i);
            break;
        }
        if fallback.is_none() && name.ends_with(&suffix) {
            fallback = Some(i);
        }
    }

    let index = exact
        .or(fallback)
        .ok_or_else(|| archive_err(format!("No {} file found in ZIP archive", suffix)))?;

    let mut entry = archive
        .by_index(index)
        .map_err(|e| archive_err(format!("Failed to read ZIP entry: {}", e)))?;

    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|e| archive_err(format!("Failed to extract {}: {}", wanted, e)))?;

    Ok(text)
}
