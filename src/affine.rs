use crate::error::{Result, TilingError};
use geo::{LineString, Polygon};

/// Six-parameter affine transform in GDAL order:
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up rasters have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl AffineTransform {
    pub fn new(
        origin_x: f64,
        pixel_width: f64,
        row_rotation: f64,
        origin_y: f64,
        col_rotation: f64,
        pixel_height: f64,
    ) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation,
            origin_y,
            col_rotation,
            pixel_height,
        }
    }

    /// Transform without rotation terms.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height)
    }

    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[0], gt[1], gt[2], gt[3], gt[4], gt[5])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0
    }

    /// Determinant of the 2x2 linear part.
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Map a fractional pixel position `(col, row)` to `(x, y)`.
    #[inline]
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Coordinate of the top-left corner of pixel `(row, col)`.
    pub fn pixel_to_coord(&self, row: usize, col: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    /// Fractional `(row, col)` position of a coordinate.
    pub fn coord_to_pixel_f64(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(TilingError::SingularTransform(det));
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        if self.is_axis_aligned() {
            return Ok((dy / self.pixel_height, dx / self.pixel_width));
        }

        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.col_rotation) / det;
        Ok((row, col))
    }

    /// Pixel `(row, col)` containing a coordinate. Cells are half-open
    /// intervals measured from the origin, so a coordinate on a cell edge
    /// belongs to the cell that starts there.
    pub fn coord_to_pixel(&self, x: f64, y: f64) -> Result<(isize, isize)> {
        let (row, col) = self.coord_to_pixel_f64(x, y)?;
        let row = floor_to_index(row).ok_or(TilingError::UnmappableCoordinate { x, y })?;
        let col = floor_to_index(col).ok_or(TilingError::UnmappableCoordinate { x, y })?;
        Ok((row, col))
    }

    /// Transform whose origin is the top-left corner of pixel `(row, col)`.
    pub fn translated(&self, row: usize, col: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_coord(row, col);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Footprint of a single pixel.
    pub fn pixel_cell_polygon(&self, row: usize, col: usize) -> Polygon<f64> {
        self.region_polygon(row, col, 1, 1)
    }

    /// Footprint of the `rows x cols` block of pixels whose top-left pixel is
    /// `(row, col)`. Corners run top-left, top-right, bottom-right, bottom-left.
    pub fn region_polygon(&self, row: usize, col: usize, rows: usize, cols: usize) -> Polygon<f64> {
        let top = row as f64;
        let left = col as f64;
        let bottom = (row + rows) as f64;
        let right = (col + cols) as f64;

        let corners = vec![
            self.apply(left, top),
            self.apply(right, top),
            self.apply(right, bottom),
            self.apply(left, bottom),
        ];
        Polygon::new(LineString::from(corners), vec![])
    }

    /// Footprint of a whole `rows x cols` raster.
    pub fn raster_extent(&self, rows: usize, cols: usize) -> Polygon<f64> {
        self.region_polygon(0, 0, rows, cols)
    }
}

/// `None` for NaN, infinities and anything outside the `isize` range.
fn floor_to_index(value: f64) -> Option<isize> {
    let floored = value.floor();
    if floored.is_finite() && floored >= isize::MIN as f64 && floored < isize::MAX as f64 {
        Some(floored as isize)
    } else {
        None
    }
}

impl From<[f64; 6]> for AffineTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self::from_gdal(gt)
    }
}
