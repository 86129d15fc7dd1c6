//! Error types for the srtm-grid library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while acquiring, decoding or querying grid tiles.
///
/// Variants fall into three families, see [`GridError::is_unavailable`],
/// [`GridError::is_malformed`] and [`GridError::is_storage`].
#[derive(Error, Debug)]
pub enum GridError {
    /// IO error when reading or writing cache files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tile archive could not be fetched from the remote source.
    #[error("Tile {identifier} is not available: {reason}")]
    TileUnavailable { identifier: String, reason: String },

    /// A required header keyword is absent from the first six lines.
    #[error("Missing grid header: {key}")]
    MissingHeader { key: &'static str },

    /// A header value could not be parsed or is out of range.
    #[error("Invalid value for grid header {key}: {value:?}")]
    InvalidHeader { key: &'static str, value: String },

    /// A data row does not hold exactly `ncols` samples.
    #[error("Row {row} has {found} samples (expected {expected})")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A data row contains a token that is not an integer.
    #[error("Row {row} contains a non-integer sample: {token:?}")]
    InvalidSample { row: usize, token: String },

    /// The body holds a different number of rows than `nrows`.
    #[error("Grid has {found} data rows (expected {expected})")]
    RowCount { expected: usize, found: usize },

    /// The sample buffer does not match the header dimensions.
    #[error("Grid of {rows}x{cols} cannot hold {len} samples")]
    DimensionMismatch { rows: usize, cols: usize, len: usize },

    /// The tile archive could not be opened or does not contain the grid file.
    #[error("Archive for {identifier} is unreadable: {reason}")]
    Archive { identifier: String, reason: String },

    /// A durable snapshot file is corrupt or truncated.
    #[error("Snapshot {path} is unreadable: {reason}")]
    Snapshot { path: PathBuf, reason: String },
}

impl GridError {
    /// Tile data does not exist (yet) for the identifier. Recoverable.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, GridError::TileUnavailable { .. })
    }

    /// The grid text is corrupt. Never converted to the no-data sentinel.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            GridError::MissingHeader { .. }
                | GridError::InvalidHeader { .. }
                | GridError::RowLength { .. }
                | GridError::InvalidSample { .. }
                | GridError::RowCount { .. }
                | GridError::DimensionMismatch { .. }
        )
    }

    /// A cache-tier read or write failed.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            GridError::Io(_) | GridError::Archive { .. } | GridError::Snapshot { .. }
        )
    }
}

/// Result type alias using [`GridError`].
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GridError::RowLength {
            row: 3,
            expected: 4,
            found: 3,
        };
        assert!(err.to_string().contains("Row 3"));

        let err = GridError::TileUnavailable {
            identifier: "srtm_13_06".to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        };
        assert!(err.to_string().contains("srtm_13_06"));

        let err = GridError::Snapshot {
            path: PathBuf::from("srtm_13_06.grd"),
            reason: "bad magic".to_string(),
        };
        assert!(err.to_string().contains("srtm_13_06.grd"));
    }

    #[test]
    fn test_error_classification() {
        let unavailable = GridError::TileUnavailable {
            identifier: "srtm_01_01".to_string(),
            reason: "ocean".to_string(),
        };
        assert!(unavailable.is_unavailable());
        assert!(!unavailable.is_malformed());
        assert!(!unavailable.is_storage());

        let malformed = GridError::MissingHeader { key: "ncols" };
        assert!(malformed.is_malformed());
        assert!(!malformed.is_unavailable());

        let storage = GridError::Archive {
            identifier: "srtm_01_01".to_string(),
            reason: "not a zip".to_string(),
        };
        assert!(storage.is_storage());
        assert!(!storage.is_malformed());
    }
}
