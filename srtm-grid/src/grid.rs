//! In-memory elevation rasters.
//!
//! This module provides [`GridTile`], one decoded 5° × 5° tile, and the
//! arithmetic that maps a coordinate to a grid cell.

use crate::error::{GridError, Result};

/// Value conventionally marking a cell without data, and the elevation
/// reported when no tile can be obtained.
pub const NO_DATA: i32 = -9999;

/// Geometry of a grid: dimensions, lower-left corner and cell size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    /// Number of rows (north to south)
    pub rows: usize,
    /// Number of columns (west to east)
    pub cols: usize,
    /// Longitude of the lower-left corner in degrees
    pub x_ll: f64,
    /// Latitude of the lower-left corner in degrees
    pub y_ll: f64,
    /// Angular size of one cell in degrees
    pub cell_size: f64,
}

impl GridHeader {
    /// Number of samples a grid with this geometry holds.
    ///
    /// Saturates at `usize::MAX` for dimensions no buffer could hold.
    pub fn len(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    /// Returns `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary of the samples in a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileStats {
    /// Lowest elevation, ignoring [`NO_DATA`] cells
    pub min: Option<i32>,
    /// Highest elevation, ignoring [`NO_DATA`] cells
    pub max: Option<i32>,
    /// Number of [`NO_DATA`] cells
    pub void_count: usize,
}

/// A fully decoded elevation raster.
///
/// Samples are stored row-major with row 0 at the north edge. A `GridTile`
/// always holds exactly `rows * cols` samples and is never mutated after
/// construction.
///
/// # Example
///
/// ```
/// use srtm_grid::{GridHeader, GridTile};
///
/// let header = GridHeader { rows: 2, cols: 2, x_ll: 0.0, y_ll: 0.0, cell_size: 1.0 };
/// let tile = GridTile::new(header, vec![10, 20, 30, 40])?;
/// assert_eq!(tile.row_col(1.2, 0.2), (1, 0));
/// assert_eq!(tile.get_elevation(1.2, 0.2), Some(30));
/// # Ok::<(), srtm_grid::GridError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridTile {
    header: GridHeader,
    elevation: Vec<i32>,
}

impl GridTile {
    /// Build a tile from its header and a row-major sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] if the buffer does not hold
    /// exactly `rows * cols` samples.
    pub fn new(header: GridHeader, elevation: Vec<i32>) -> Result<Self> {
        if header.rows.checked_mul(header.cols) != Some(elevation.len()) {
            return Err(GridError::DimensionMismatch {
                rows: header.rows,
                cols: header.cols,
                len: elevation.len(),
            });
        }

        Ok(Self { header, elevation })
    }

    /// Map a coordinate to a `(row, col)` cell index.
    ///
    /// Rows count from the north edge while the origin is the south-west
    /// corner, hence the subtraction from `rows`. Adding 0.5 before
    /// truncating selects the nearest cell centre; this is not `f64::round`,
    /// the two differ for negative offsets.
    ///
    /// The result may lie outside the grid for coordinates beyond the tile.
    /// Offsets too large for `i64` saturate, so they stay outside the grid.
    pub fn row_col(&self, lat: f64, lon: f64) -> (i64, i64) {
        let h = &self.header;
        let row = (h.rows as i64).saturating_sub(((lat - h.y_ll) / h.cell_size + 0.5) as i64);
        let col = ((lon - h.x_ll) / h.cell_size + 0.5) as i64;
        (row, col)
    }

    /// Get the elevation at the specified coordinates.
    ///
    /// # Returns
    ///
    /// The sample of the selected cell (which may be [`NO_DATA`]), or `None`
    /// if the cell index falls outside the grid.
    pub fn get_elevation(&self, lat: f64, lon: f64) -> Option<i32> {
        let (row, col) = self.row_col(lat, lon);
        if row < 0 || col < 0 {
            return None;
        }
        self.value_at(row as usize, col as usize)
    }

    /// Sample at a row/column index, `None` if out of range.
    pub fn value_at(&self, row: usize, col: usize) -> Option<i32> {
        if row >= self.header.rows || col >= self.header.cols {
            return None;
        }
        Some(self.elevation[row * self.header.cols + col])
    }

    /// Min/max elevation and void count over the whole tile.
    pub fn stats(&self) -> TileStats {
        let mut stats = TileStats::default();
        for &v in &self.elevation {
            if v == NO_DATA {
                stats.void_count += 1;
                continue;
            }
            stats.min = Some(stats.min.map_or(v, |m| m.min(v)));
            stats.max = Some(stats.max.map_or(v, |m| m.max(v)));
        }
        stats
    }

    /// Returns the grid geometry.
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    /// Returns the number of rows.
    pub fn rows(&self) -> usize {
        self.header.rows
    }

    /// Returns the number of columns.
    pub fn cols(&self) -> usize {
        self.header.cols
    }

    /// Returns the longitude of the lower-left corner.
    pub fn x_ll(&self) -> f64 {
        self.header.x_ll
    }

    /// Returns the latitude of the lower-left corner.
    pub fn y_ll(&self) -> f64 {
        self.header.y_ll
    }

    /// Returns the cell size in degrees.
    pub fn cell_size(&self) -> f64 {
        self.header.cell_size
    }

    /// Returns the row-major sample buffer.
    pub fn samples(&self) -> &[i32] {
        &self.elevation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 tile over [0, 4] x [0, 4] where each sample encodes row * 10 + col
    fn create_test_tile() -> GridTile {
        let header = GridHeader {
            rows: 4,
            cols: 4,
            x_ll: 0.0,
            y_ll: 0.0,
            cell_size: 1.0,
        };
        let samples = (0..4)
            .flat_map(|row| (0..4).map(move |col| row * 10 + col))
            .collect();
        GridTile::new(header, samples).unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        let header = GridHeader {
            rows: 2,
            cols: 3,
            x_ll: 0.0,
            y_ll: 0.0,
            cell_size: 1.0,
        };
        let result = GridTile::new(header, vec![0; 5]);

        if let Err(GridError::DimensionMismatch { rows, cols, len }) = result {
            assert_eq!((rows, cols, len), (2, 3, 5));
        } else {
            panic!("Expected DimensionMismatch error");
        }
    }

    #[test]
    fn test_row_col_rounds_to_nearest_cell() {
        let tile = create_test_tile();

        // (3.4 + 0.5) -> 3, row = 4 - 3 = 1
        assert_eq!(tile.row_col(3.4, 0.4), (1, 0));
        // (3.5 + 0.5) -> 4, row = 0
        assert_eq!(tile.row_col(3.5, 0.5), (0, 1));
        assert_eq!(tile.row_col(2.0, 2.0), (2, 2));
    }

    #[test]
    fn test_row_col_truncates_toward_zero() {
        let tile = create_test_tile();

        // -0.9 + 0.5 = -0.4 truncates to 0, where floor would give -1
        assert_eq!(tile.row_col(-0.9, -0.9), (4, 0));
        // -1.6 + 0.5 = -1.1 truncates to -1
        assert_eq!(tile.row_col(-1.6, -1.6), (5, -1));
    }

    #[test]
    fn test_get_elevation() {
        let tile = create_test_tile();

        assert_eq!(tile.get_elevation(3.9, 0.1), Some(0));
        assert_eq!(tile.get_elevation(2.0, 2.0), Some(22));
        assert_eq!(tile.get_elevation(1.2, 3.4), Some(33));
    }

    #[test]
    fn test_get_elevation_outside_grid() {
        let tile = create_test_tile();

        // South edge selects row == rows
        assert_eq!(tile.get_elevation(0.0, 1.0), None);
        assert_eq!(tile.get_elevation(2.0, -1.6), None);
        assert_eq!(tile.get_elevation(2.0, 4.0), None);
        assert_eq!(tile.get_elevation(5.0, 1.0), None);
    }

    #[test]
    fn test_huge_offset_is_outside_grid() {
        let header = GridHeader {
            rows: 1,
            cols: 1,
            x_ll: 0.0,
            y_ll: 10.0,
            cell_size: 1e-300,
        };
        let tile = GridTile::new(header, vec![7]).unwrap();

        // (0 - 10) / 1e-300 saturates to i64::MIN when cast
        assert_eq!(tile.row_col(0.0, 0.0), (i64::MAX, 0));
        assert_eq!(tile.get_elevation(0.0, 0.0), None);
        assert_eq!(tile.get_elevation(20.0, 0.0), None);
    }

    #[test]
    fn test_new_rejects_overflowing_dimensions() {
        let header = GridHeader {
            rows: usize::MAX,
            cols: 2,
            x_ll: 0.0,
            y_ll: 0.0,
            cell_size: 1.0,
        };

        assert_eq!(header.len(), usize::MAX);
        assert!(matches!(
            GridTile::new(header, Vec::new()),
            Err(GridError::DimensionMismatch { len: 0, .. })
        ));
    }

    #[test]
    fn test_stats() {
        let header = GridHeader {
            rows: 2,
            cols: 2,
            x_ll: 0.0,
            y_ll: 0.0,
            cell_size: 1.0,
        };
        let tile = GridTile::new(header, vec![NO_DATA, 15, -3, 120]).unwrap();
        let stats = tile.stats();

        assert_eq!(stats.min, Some(-3));
        assert_eq!(stats.max, Some(120));
        assert_eq!(stats.void_count, 1);

        let empty = GridTile::new(header, vec![NO_DATA; 4]).unwrap().stats();
        assert_eq!(empty.min, None);
        assert_eq!(empty.void_count, 4);
    }

    #[test]
    fn test_accessors() {
        let tile = create_test_tile();
        assert_eq!(tile.rows(), 4);
        assert_eq!(tile.cols(), 4);
        assert_eq!(tile.x_ll(), 0.0);
        assert_eq!(tile.y_ll(), 0.0);
        assert_eq!(tile.cell_size(), 1.0);
        assert_eq!(tile.samples().len(), 16);
        assert_eq!(tile.value_at(3, 3), Some(33));
        assert_eq!(tile.value_at(4, 0), None);
    }
}
