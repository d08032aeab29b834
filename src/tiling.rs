use crate::affine::AffineTransform;
use crate::error::{Result, TilingError};
use crate::io::{RasterIo, RasterProfile};
use crate::pixel_type::PixelType;
use crate::vector::{AttributeValue, FeatureRecord, VectorIo};
use geo::Polygon;
use log::{debug, info};
use ndarray::{s, Array3, Array4, ArrayView3, ArrayViewD, Axis, Ix3};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Axis of the tile grid, used in index errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    /// Flattened row-major tile index
    Flat,
    Row,
    Column,
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridAxis::Flat => f.write_str("flat"),
            GridAxis::Row => f.write_str("row"),
            GridAxis::Column => f.write_str("column"),
        }
    }
}

/// Position of one tile in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePosition {
    /// Flattened row-major index
    pub index: usize,
    pub row: usize,
    pub col: usize,
}

impl TilePosition {
    /// Pixel offset of the tile's top-left corner in the padded canvas.
    pub fn pixel_origin(&self, tile_size: usize) -> (usize, usize) {
        (self.row * tile_size, self.col * tile_size)
    }
}

/// Geometry of a tile grid laid over a raster of `rows x cols` pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLayout {
    pub rows: usize,
    pub cols: usize,
    pub tile_size: usize,
    pub tile_rows: usize,
    pub tile_cols: usize,
}

impl TileLayout {
    pub fn new(rows: usize, cols: usize, tile_size: usize) -> Result<Self> {
        if tile_size == 0 {
            return Err(TilingError::InvalidTileSize(tile_size));
        }

        let tile_rows = rows.div_ceil(tile_size);
        let tile_cols = cols.div_ceil(tile_size);

        // The padded canvas must be addressable as one ndarray allocation
        let padded_rows = tile_rows.checked_mul(tile_size);
        let padded_cols = tile_cols.checked_mul(tile_size);
        let addressable = padded_rows
            .zip(padded_cols)
            .and_then(|(r, c)| r.checked_mul(c))
            .is_some_and(|pixels| pixels <= isize::MAX as usize);
        if !addressable {
            return Err(TilingError::InvalidTileSize(tile_size));
        }

        debug!(
            "TileLayout: {}x{} raster, tile_size={} → {}x{} tiles ({} total)",
            rows,
            cols,
            tile_size,
            tile_rows,
            tile_cols,
            tile_rows * tile_cols
        );

        Ok(Self {
            rows,
            cols,
            tile_size,
            tile_rows,
            tile_cols,
        })
    }

    pub fn padded_rows(&self) -> usize {
        self.tile_rows * self.tile_size
    }

    pub fn padded_cols(&self) -> usize {
        self.tile_cols * self.tile_size
    }

    /// Rows appended at the bottom of the canvas.
    pub fn pad_rows(&self) -> usize {
        (self.tile_size - self.rows % self.tile_size) % self.tile_size
    }

    /// Columns appended at the right of the canvas.
    pub fn pad_cols(&self) -> usize {
        (self.tile_size - self.cols % self.tile_size) % self.tile_size
    }

    pub fn tile_count(&self) -> usize {
        self.tile_rows * self.tile_cols
    }

    pub fn position(&self, index: usize) -> Result<TilePosition> {
        let len = self.tile_count();
        if index >= len {
            return Err(TilingError::TileIndexOutOfRange {
                axis: GridAxis::Flat,
                index,
                len,
            });
        }
        Ok(TilePosition {
            index,
            row: index / self.tile_cols,
            col: index % self.tile_cols,
        })
    }

    pub fn position_at(&self, tile_row: usize, tile_col: usize) -> Result<TilePosition> {
        check_index(GridAxis::Row, tile_row, self.tile_rows)?;
        check_index(GridAxis::Column, tile_col, self.tile_cols)?;
        Ok(TilePosition {
            index: tile_row * self.tile_cols + tile_col,
            row: tile_row,
            col: tile_col,
        })
    }

    pub fn iter(&self) -> TileIterator<'_> {
        TileIterator::new(self)
    }
}

fn check_index(axis: GridAxis, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(TilingError::TileIndexOutOfRange { axis, index, len });
    }
    Ok(())
}

fn check_range(axis: GridAxis, range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(TilingError::TileRangeOutOfRange {
            axis,
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

pub struct TileIterator<'a> {
    layout: &'a TileLayout,
    current_idx: usize,
}

impl<'a> TileIterator<'a> {
    fn new(layout: &'a TileLayout) -> Self {
        Self {
            layout,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for TileIterator<'a> {
    type Item = TilePosition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx < self.layout.tile_count() {
            let position = TilePosition {
                index: self.current_idx,
                row: self.current_idx / self.layout.tile_cols,
                col: self.current_idx % self.layout.tile_cols,
            };
            self.current_idx += 1;
            Some(position)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.layout.tile_count() - self.current_idx;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for TileIterator<'a> {}

/// Footprint record for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileAttributes {
    pub tile_row: usize,
    pub tile_col: usize,
    pub transform: AffineTransform,
    pub footprint: Polygon<f64>,
}

impl TileAttributes {
    pub fn to_feature(&self) -> FeatureRecord {
        let gt = self.transform.to_gdal();
        FeatureRecord::new(self.footprint.clone())
            .with_attribute("tile_row", AttributeValue::Integer(self.tile_row as i64))
            .with_attribute("tile_col", AttributeValue::Integer(self.tile_col as i64))
            .with_attribute("origin_x", AttributeValue::Float(gt[0]))
            .with_attribute("pixel_width", AttributeValue::Float(gt[1]))
            .with_attribute("row_rotation", AttributeValue::Float(gt[2]))
            .with_attribute("origin_y", AttributeValue::Float(gt[3]))
            .with_attribute("col_rotation", AttributeValue::Float(gt[4]))
            .with_attribute("pixel_height", AttributeValue::Float(gt[5]))
    }
}

/// Settings shared by every file written by [`GridTiler::write_tiles`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileWriteOptions {
    pub projection: String,
    pub pixel_type: PixelType,
    pub no_data: Option<f64>,
}

/// File name of the tile at `(tile_row, tile_col)`.
pub fn tile_file_name(prefix: &str, tile_row: usize, tile_col: usize) -> String {
    format!("{}_{}_{}.tif", prefix, tile_row, tile_col)
}

/// A raster padded to whole tiles, with grid-aware accessors.
///
/// The canvas is built once in the constructor; every accessor is a
/// read-only view into it.
#[derive(Debug, Clone)]
pub struct GridTiler<T> {
    canvas: Array3<T>,
    layout: TileLayout,
    transform: AffineTransform,
}

impl<T: Copy + Default> GridTiler<T> {
    /// Pad `raster` with `T::default()` (zero for numeric types).
    pub fn new(raster: ArrayView3<'_, T>, tile_size: usize, transform: AffineTransform) -> Result<Self> {
        Self::with_fill(raster, tile_size, transform, T::default())
    }

    /// Pad `raster` with `fill`, typically the raster's no-data value.
    pub fn with_fill(
        raster: ArrayView3<'_, T>,
        tile_size: usize,
        transform: AffineTransform,
        fill: T,
    ) -> Result<Self> {
        let (rows, cols, bands) = raster.dim();
        if tile_size == 0 {
            return Err(TilingError::InvalidTileSize(tile_size));
        }
        if rows == 0 || cols == 0 || bands == 0 {
            return Err(TilingError::InvalidDimensions { rows, cols, bands });
        }

        let layout = TileLayout::new(rows, cols, tile_size)?;
        let addressable = (layout.padded_rows() * layout.padded_cols())
            .checked_mul(bands)
            .is_some_and(|len| len <= isize::MAX as usize);
        if !addressable {
            return Err(TilingError::InvalidTileSize(tile_size));
        }
        debug!(
            "Padding {}x{}x{} raster by {} rows and {} columns",
            rows,
            cols,
            bands,
            layout.pad_rows(),
            layout.pad_cols()
        );

        let mut canvas = Array3::from_elem((layout.padded_rows(), layout.padded_cols(), bands), fill);
        canvas.slice_mut(s![..rows, ..cols, ..]).assign(&raster);

        Ok(Self {
            canvas,
            layout,
            transform,
        })
    }

    /// Like [`GridTiler::new`] for an array of unknown rank.
    pub fn from_dyn(raster: ArrayViewD<'_, T>, tile_size: usize, transform: AffineTransform) -> Result<Self> {
        let ndim = raster.ndim();
        let raster = raster
            .into_dimensionality::<Ix3>()
            .map_err(|_| TilingError::NotThreeDimensional(ndim))?;
        Self::new(raster, tile_size, transform)
    }
}

impl<T> GridTiler<T> {
    pub fn layout(&self) -> &TileLayout {
        &self.layout
    }

    pub fn transform(&self) -> &AffineTransform {
        &self.transform
    }

    pub fn tile_size(&self) -> usize {
        self.layout.tile_size
    }

    pub fn tile_rows(&self) -> usize {
        self.layout.tile_rows
    }

    pub fn tile_cols(&self) -> usize {
        self.layout.tile_cols
    }

    pub fn tile_count(&self) -> usize {
        self.layout.tile_count()
    }

    pub fn bands(&self) -> usize {
        self.canvas.dim().2
    }

    pub fn padded_canvas(&self) -> ArrayView3<'_, T> {
        self.canvas.view()
    }

    /// Tile by flattened row-major index.
    pub fn tile(&self, index: usize) -> Result<ArrayView3<'_, T>> {
        let position = self.layout.position(index)?;
        Ok(self.view_of(position))
    }

    pub fn tile_at(&self, tile_row: usize, tile_col: usize) -> Result<ArrayView3<'_, T>> {
        let position = self.layout.position_at(tile_row, tile_col)?;
        Ok(self.view_of(position))
    }

    /// One full row of tiles: `(b, padded_cols, bands)`.
    pub fn tile_row(&self, tile_row: usize) -> Result<ArrayView3<'_, T>> {
        check_index(GridAxis::Row, tile_row, self.layout.tile_rows)?;
        self.tile_row_range(tile_row..tile_row + 1)
    }

    /// Contiguous run of tile rows spanning every tile column.
    pub fn tile_row_range(&self, rows: Range<usize>) -> Result<ArrayView3<'_, T>> {
        self.tile_block(rows, 0..self.layout.tile_cols)
    }

    /// Pixel region covered by tile rows `rows` and tile columns `cols`.
    pub fn tile_block(&self, rows: Range<usize>, cols: Range<usize>) -> Result<ArrayView3<'_, T>> {
        check_range(GridAxis::Row, &rows, self.layout.tile_rows)?;
        check_range(GridAxis::Column, &cols, self.layout.tile_cols)?;

        let b = self.layout.tile_size;
        Ok(self
            .canvas
            .slice(s![rows.start * b..rows.end * b, cols.start * b..cols.end * b, ..]))
    }

    fn view_of(&self, position: TilePosition) -> ArrayView3<'_, T> {
        let b = self.layout.tile_size;
        let (row0, col0) = position.pixel_origin(b);
        self.canvas.slice(s![row0..row0 + b, col0..col0 + b, ..])
    }

    /// Transform of the tile at `(tile_row, tile_col)`.
    pub fn tile_transform(&self, tile_row: usize, tile_col: usize) -> Result<AffineTransform> {
        let position = self.layout.position_at(tile_row, tile_col)?;
        let (row0, col0) = position.pixel_origin(self.layout.tile_size);
        Ok(self.transform.translated(row0, col0))
    }

    /// Transform and footprint of every tile, row-major.
    pub fn tile_attributes(&self) -> Vec<TileAttributes> {
        let b = self.layout.tile_size;
        self.layout
            .iter()
            .map(|position| {
                let (row0, col0) = position.pixel_origin(b);
                TileAttributes {
                    tile_row: position.row,
                    tile_col: position.col,
                    transform: self.transform.translated(row0, col0),
                    footprint: self.transform.region_polygon(row0, col0, b, b),
                }
            })
            .collect()
    }

    /// Write the tile footprints as polygon features.
    pub fn write_tile_footprints<V: VectorIo>(&self, vector_io: &V, path: &Path) -> Result<()> {
        let features: Vec<FeatureRecord> = self
            .tile_attributes()
            .iter()
            .map(TileAttributes::to_feature)
            .collect();
        info!("Writing {} tile footprints to {}", features.len(), path.display());
        vector_io.write_features(path, &features)
    }
}

impl<T: Copy + Default> GridTiler<T> {
    /// Every tile as one `(n_tiles, b, b, bands)` batch, row-major.
    pub fn split_into_tiles(&self) -> Array4<T> {
        let b = self.layout.tile_size;
        let mut batch = Array4::from_elem((self.layout.tile_count(), b, b, self.bands()), T::default());
        for position in self.layout.iter() {
            batch
                .index_axis_mut(Axis(0), position.index)
                .assign(&self.view_of(position));
        }
        batch
    }
}

impl<T: Copy + Into<f64>> GridTiler<T> {
    /// Write each tile to `{output_dir}/{prefix}_{tile_row}_{tile_col}.tif`
    /// with its own transform. Returns the paths in tile order.
    pub fn write_tiles<I: RasterIo>(
        &self,
        io: &I,
        output_dir: &Path,
        prefix: &str,
        options: &TileWriteOptions,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;
        info!(
            "Writing {} tiles of {}x{} to {}",
            self.layout.tile_count(),
            self.layout.tile_size,
            self.layout.tile_size,
            output_dir.display()
        );

        let b = self.layout.tile_size;
        let mut written = Vec::with_capacity(self.layout.tile_count());
        for position in self.layout.iter() {
            let (row0, col0) = position.pixel_origin(b);
            let profile = RasterProfile {
                transform: self.transform.translated(row0, col0),
                projection: options.projection.clone(),
                pixel_type: options.pixel_type,
                no_data: options.no_data,
            };
            let path = output_dir.join(tile_file_name(prefix, position.row, position.col));
            let tile: Array3<f64> = self.view_of(position).mapv(Into::into);

            debug!("Writing tile {} ({}, {}) to {}", position.index, position.row, position.col, path.display());
            io.write_raster(tile.view(), &path, &profile)?;
            written.push(path);
        }
        Ok(written)
    }
}
