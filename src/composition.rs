use crate::error::{Result, TilingError};
use crate::io::RasterIo;
use crate::pixel_type::PixelType;
use log::{debug, info};
use ndarray::{concatenate, Array3, ArrayView3, Axis};
use std::path::{Path, PathBuf};

/// Stack the bands of rasters that share one grid, in argument order.
pub fn compose_bands(arrays: &[ArrayView3<'_, f64>]) -> Result<Array3<f64>> {
    let Some(first) = arrays.first() else {
        return Err(TilingError::InvalidDimensions {
            rows: 0,
            cols: 0,
            bands: 0,
        });
    };
    let (rows, cols, _) = first.dim();

    for array in arrays {
        let (r, c, _) = array.dim();
        if (r, c) != (rows, cols) {
            return Err(TilingError::RasterExtentMismatch {
                expected_rows: rows,
                expected_cols: cols,
                found_rows: r,
                found_cols: c,
            });
        }
    }

    Ok(concatenate(Axis(2), arrays)?)
}

/// Write the bands of `sources` into one raster on the grid of `reference`.
///
/// The output takes the reference's transform, projection and no-data value;
/// its pixel type is the reference's unless overridden.
pub fn write_band_composition<I: RasterIo>(
    io: &I,
    reference: &Path,
    sources: &[PathBuf],
    destination: &Path,
    pixel_type: Option<PixelType>,
) -> Result<()> {
    let metadata = io.read_metadata(reference)?;
    let mut profile = metadata.profile();
    if let Some(pixel_type) = pixel_type {
        profile.pixel_type = pixel_type;
    }

    let mut arrays = Vec::with_capacity(sources.len());
    for source in sources {
        let array = io.read_array(source)?;
        let (rows, cols, bands) = array.dim();
        if (rows, cols) != (metadata.rows, metadata.cols) {
            return Err(TilingError::RasterExtentMismatch {
                expected_rows: metadata.rows,
                expected_cols: metadata.cols,
                found_rows: rows,
                found_cols: cols,
            });
        }
        debug!("{}: {} bands", source.display(), bands);
        arrays.push(array);
    }

    let views: Vec<ArrayView3<'_, f64>> = arrays.iter().map(|a| a.view()).collect();
    let composed = compose_bands(&views)?;
    info!(
        "Composing {} bands from {} rasters into {}",
        composed.dim().2,
        sources.len(),
        destination.display()
    );
    io.write_raster(composed.view(), destination, &profile)
}
