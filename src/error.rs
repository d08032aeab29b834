use crate::pixel_type::PixelType;
use crate::tiling::GridAxis;
use thiserror::Error;

/// Coarse classification of [`TilingError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Shape,
    Index,
    Domain,
    Io,
}

#[derive(Error, Debug)]
pub enum TilingError {
    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Array shape error: {0}")]
    ArrayShape(#[from] ndarray::ShapeError),

    #[error("Invalid tile size: {0} (must be positive)")]
    InvalidTileSize(usize),

    #[error("Raster has invalid dimensions: {rows}x{cols}x{bands}")]
    InvalidDimensions {
        rows: usize,
        cols: usize,
        bands: usize,
    },

    #[error("Raster array must have 3 dimensions (rows, cols, bands), got {0}")]
    NotThreeDimensional(usize),

    #[error("Raster extent mismatch: expected {expected_rows}x{expected_cols}, found {found_rows}x{found_cols}")]
    RasterExtentMismatch {
        expected_rows: usize,
        expected_cols: usize,
        found_rows: usize,
        found_cols: usize,
    },

    #[error("Unknown pixel type: {0}")]
    UnknownPixelType(String),

    #[error("No pixel type mapping for {0}")]
    UnmappedPixelType(String),

    #[error("Value {value} cannot be stored as {pixel_type}")]
    PixelValueOutOfRange { value: f64, pixel_type: PixelType },

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Invalid dataset entry '{0}' (expected NAME=PATH)")]
    InvalidDatasetEntry(String),

    #[error("Tile batch holds {found} tiles, grid expects {expected}")]
    TileCount { expected: usize, found: usize },

    #[error("Tile {index} has shape {found:?}, expected {expected:?}")]
    TileShape {
        index: usize,
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("Target extent {target_rows}x{target_cols} exceeds reassembled canvas {canvas_rows}x{canvas_cols}")]
    TargetExceedsCanvas {
        target_rows: usize,
        target_cols: usize,
        canvas_rows: usize,
        canvas_cols: usize,
    },

    #[error("Raster output must have 3 dimensions (rows, cols, bands), got {0}")]
    RankMismatch(usize),

    #[error("Tile {axis} index {index} out of range (grid has {len})")]
    TileIndexOutOfRange {
        axis: GridAxis,
        index: usize,
        len: usize,
    },

    #[error("Tile {axis} range {start}..{end} out of range (grid has {len})")]
    TileRangeOutOfRange {
        axis: GridAxis,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("Affine transform is singular (determinant {0})")]
    SingularTransform(f64),

    #[error("Coordinate ({x}, {y}) does not map to a pixel index")]
    UnmappableCoordinate { x: f64, y: f64 },
}

impl TilingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "gdal")]
            TilingError::Gdal(_) => ErrorKind::Io,
            TilingError::Io(_) | TilingError::Json(_) => ErrorKind::Io,
            TilingError::InvalidTileSize(_)
            | TilingError::InvalidDimensions { .. }
            | TilingError::NotThreeDimensional(_)
            | TilingError::RasterExtentMismatch { .. }
            | TilingError::UnknownPixelType(_)
            | TilingError::UnmappedPixelType(_)
            | TilingError::PixelValueOutOfRange { .. }
            | TilingError::UnknownDataset(_)
            | TilingError::InvalidDatasetEntry(_) => ErrorKind::Validation,
            TilingError::ArrayShape(_)
            | TilingError::TileCount { .. }
            | TilingError::TileShape { .. }
            | TilingError::TargetExceedsCanvas { .. }
            | TilingError::RankMismatch(_) => ErrorKind::Shape,
            TilingError::TileIndexOutOfRange { .. } | TilingError::TileRangeOutOfRange { .. } => {
                ErrorKind::Index
            }
            TilingError::SingularTransform(_) | TilingError::UnmappableCoordinate { .. } => ErrorKind::Domain,
        }
    }
}

pub type Result<T> = std::result::Result<T, TilingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TilingError::InvalidTileSize(0).kind(), ErrorKind::Validation);
        assert_eq!(
            TilingError::TileCount { expected: 4, found: 3 }.kind(),
            ErrorKind::Shape
        );
        assert_eq!(
            TilingError::TileIndexOutOfRange {
                axis: GridAxis::Row,
                index: 9,
                len: 4
            }
            .kind(),
            ErrorKind::Index
        );
        assert_eq!(TilingError::SingularTransform(0.0).kind(), ErrorKind::Domain);
        assert_eq!(
            TilingError::UnmappableCoordinate { x: f64::NAN, y: 0.0 }.kind(),
            ErrorKind::Domain
        );
    }

    #[test]
    fn test_error_messages() {
        let err = TilingError::TileRangeOutOfRange {
            axis: GridAxis::Column,
            start: 2,
            end: 7,
            len: 4,
        };
        assert_eq!(err.to_string(), "Tile column range 2..7 out of range (grid has 4)");
    }
}
