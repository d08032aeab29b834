use crate::error::{Result, TilingError};
use crate::io::{RasterIo, RasterProfile};
use crate::tiling::TileLayout;
use log::{debug, info};
use ndarray::{s, Array3, ArrayView3, ArrayView4, Axis};
use std::path::Path;

/// Reassemble `tile_rows x tile_cols` tiles, given row-major, and crop the
/// result to `target_rows x target_cols`.
///
/// Every tile must share the first tile's `(b, b, bands)` shape. The band
/// count may differ from the raster the tiles were cut from.
pub fn combine_tiles<T: Copy + Default>(
    tiles: &[ArrayView3<'_, T>],
    tile_rows: usize,
    tile_cols: usize,
    target_rows: usize,
    target_cols: usize,
) -> Result<Array3<T>> {
    let expected = tile_rows * tile_cols;
    if tiles.len() != expected {
        return Err(TilingError::TileCount {
            expected,
            found: tiles.len(),
        });
    }
    let Some(first) = tiles.first() else {
        return Err(TilingError::InvalidDimensions {
            rows: target_rows,
            cols: target_cols,
            bands: 0,
        });
    };

    let (b, _, bands) = first.dim();
    let expected_shape = [b, b, bands];
    for (index, tile) in tiles.iter().enumerate() {
        let (h, w, c) = tile.dim();
        if [h, w, c] != expected_shape {
            return Err(TilingError::TileShape {
                index,
                expected: expected_shape,
                found: [h, w, c],
            });
        }
    }

    let canvas_rows = tile_rows * b;
    let canvas_cols = tile_cols * b;
    if target_rows > canvas_rows || target_cols > canvas_cols {
        return Err(TilingError::TargetExceedsCanvas {
            target_rows,
            target_cols,
            canvas_rows,
            canvas_cols,
        });
    }

    debug!(
        "Combining {}x{} tiles of {}x{}x{} into {}x{} (cropped to {}x{})",
        tile_rows, tile_cols, b, b, bands, canvas_rows, canvas_cols, target_rows, target_cols
    );

    let mut canvas = Array3::from_elem((canvas_rows, canvas_cols, bands), T::default());
    for (index, tile) in tiles.iter().enumerate() {
        let row0 = (index / tile_cols) * b;
        let col0 = (index % tile_cols) * b;
        canvas
            .slice_mut(s![row0..row0 + b, col0..col0 + b, ..])
            .assign(tile);
    }

    if target_rows == canvas_rows && target_cols == canvas_cols {
        return Ok(canvas);
    }
    Ok(canvas.slice(s![..target_rows, ..target_cols, ..]).to_owned())
}

/// [`combine_tiles`] for the grid described by `layout`, cropped to the
/// layout's original extent.
pub fn combine_with_layout<T: Copy + Default>(tiles: &[ArrayView3<'_, T>], layout: &TileLayout) -> Result<Array3<T>> {
    let b = layout.tile_size;
    if let Some((index, tile)) = tiles
        .iter()
        .enumerate()
        .find(|(_, tile)| tile.dim().0 != b || tile.dim().1 != b)
    {
        let (h, w, c) = tile.dim();
        return Err(TilingError::TileShape {
            index,
            expected: [b, b, c],
            found: [h, w, c],
        });
    }
    combine_tiles(tiles, layout.tile_rows, layout.tile_cols, layout.rows, layout.cols)
}

/// [`combine_with_layout`] for a `(n_tiles, b, b, bands)` batch.
pub fn combine_tile_batch<T: Copy + Default>(batch: ArrayView4<'_, T>, layout: &TileLayout) -> Result<Array3<T>> {
    let tiles: Vec<ArrayView3<'_, T>> = batch.axis_iter(Axis(0)).collect();
    combine_with_layout(&tiles, layout)
}

/// Combine tiles and write the result with the base raster's georeferencing.
pub fn write_combined_raster<I: RasterIo, T: Copy + Default + Into<f64>>(
    io: &I,
    tiles: &[ArrayView3<'_, T>],
    layout: &TileLayout,
    destination: &Path,
    profile: &RasterProfile,
) -> Result<()> {
    let combined = combine_with_layout(tiles, layout)?;
    info!(
        "Writing combined {}x{}x{} raster to {}",
        combined.dim().0,
        combined.dim().1,
        combined.dim().2,
        destination.display()
    );
    let combined: Array3<f64> = combined.mapv(Into::into);
    io.write_raster(combined.view(), destination, profile)
}
