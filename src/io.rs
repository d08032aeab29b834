use crate::affine::AffineTransform;
use crate::error::{Result, TilingError};
use crate::pixel_type::PixelType;
use log::debug;
use ndarray::{Array2, Array3, ArrayView3, ArrayViewD, Axis, Ix3};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Everything known about a raster file without reading its pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterMetadata {
    pub cols: usize,
    pub rows: usize,
    pub bands: usize,
    pub transform: AffineTransform,
    pub projection: String,
    pub pixel_type: PixelType,
    pub no_data: Option<f64>,
}

impl RasterMetadata {
    /// Profile for writing a raster on the same grid as this one.
    pub fn profile(&self) -> RasterProfile {
        RasterProfile {
            transform: self.transform,
            projection: self.projection.clone(),
            pixel_type: self.pixel_type,
            no_data: self.no_data,
        }
    }
}

/// Georeferencing and storage settings for a raster being written. The
/// extent and band count come from the array itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProfile {
    pub transform: AffineTransform,
    pub projection: String,
    pub pixel_type: PixelType,
    pub no_data: Option<f64>,
}

/// Raster file access. Arrays are `(rows, cols, bands)`.
pub trait RasterIo {
    fn read_metadata(&self, path: &Path) -> Result<RasterMetadata>;

    fn read_array(&self, path: &Path) -> Result<Array3<f64>>;

    fn write_raster(&self, array: ArrayView3<'_, f64>, path: &Path, profile: &RasterProfile) -> Result<()>;
}

/// Write an array of unknown rank, rejecting anything but `(rows, cols, bands)`.
pub fn write_raster_dyn<I: RasterIo>(
    io: &I,
    array: ArrayViewD<'_, f64>,
    path: &Path,
    profile: &RasterProfile,
) -> Result<()> {
    let ndim = array.ndim();
    let array = array
        .into_dimensionality::<Ix3>()
        .map_err(|_| TilingError::RankMismatch(ndim))?;
    io.write_raster(array, path, profile)
}

/// Single-band `(rows, cols)` array as `(rows, cols, 1)`.
pub fn from_single_band<T>(band: Array2<T>) -> Array3<T> {
    band.insert_axis(Axis(2))
}

struct StoredRaster {
    data: Array3<f64>,
    profile: RasterProfile,
}

/// Raster store that keeps everything in memory, keyed by path.
///
/// Values go through the same pixel type conversion as a file backend, so
/// a raster reads back exactly as it would from disk.
#[derive(Default)]
pub struct MemoryRasterIo {
    rasters: Mutex<HashMap<PathBuf, StoredRaster>>,
}

impl MemoryRasterIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, StoredRaster>> {
        // A panic while holding the lock cannot leave a half-written entry
        self.rasters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn not_found(path: &Path) -> TilingError {
        TilingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no raster stored at {}", path.display()),
        ))
    }
}

impl RasterIo for MemoryRasterIo {
    fn read_metadata(&self, path: &Path) -> Result<RasterMetadata> {
        let rasters = self.lock();
        let stored = rasters.get(path).ok_or_else(|| Self::not_found(path))?;
        let (rows, cols, bands) = stored.data.dim();
        Ok(RasterMetadata {
            cols,
            rows,
            bands,
            transform: stored.profile.transform,
            projection: stored.profile.projection.clone(),
            pixel_type: stored.profile.pixel_type,
            no_data: stored.profile.no_data,
        })
    }

    fn read_array(&self, path: &Path) -> Result<Array3<f64>> {
        let rasters = self.lock();
        let stored = rasters.get(path).ok_or_else(|| Self::not_found(path))?;
        Ok(stored.data.clone())
    }

    fn write_raster(&self, array: ArrayView3<'_, f64>, path: &Path, profile: &RasterProfile) -> Result<()> {
        let (rows, cols, bands) = array.dim();
        if rows == 0 || cols == 0 || bands == 0 {
            return Err(TilingError::InvalidDimensions { rows, cols, bands });
        }

        let mut data = Array3::zeros(array.dim());
        for (dst, &src) in data.iter_mut().zip(array.iter()) {
            *dst = profile.pixel_type.quantize(src)?;
        }

        debug!("Storing {}x{}x{} raster at {}", rows, cols, bands, path.display());
        self.lock().insert(
            path.to_path_buf(),
            StoredRaster {
                data,
                profile: profile.clone(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr2, ArrayD, IxDyn};

    fn profile(pixel_type: PixelType) -> RasterProfile {
        RasterProfile {
            transform: AffineTransform::north_up(0.0, 100.0, 1.0, -1.0),
            projection: String::new(),
            pixel_type,
            no_data: None,
        }
    }

    #[test]
    fn test_memory_round_trip() {
        let io = MemoryRasterIo::new();
        let array = Array3::from_shape_fn((3, 4, 2), |(r, c, b)| (r * 100 + c * 10 + b) as f64);
        let path = Path::new("mem/a.tif");

        io.write_raster(array.view(), path, &profile(PixelType::UInt16)).unwrap();

        assert_eq!(io.read_array(path).unwrap(), array);
        let metadata = io.read_metadata(path).unwrap();
        assert_eq!((metadata.rows, metadata.cols, metadata.bands), (3, 4, 2));
        assert_eq!(metadata.pixel_type, PixelType::UInt16);
        assert_eq!(metadata.profile(), profile(PixelType::UInt16));
    }

    #[test]
    fn test_memory_quantizes_to_pixel_type() {
        let io = MemoryRasterIo::new();
        let array = Array3::from_shape_vec((2, 2, 1), vec![7.6, -7.6, 7.4, 0.5]).unwrap();
        let path = Path::new("mem/q.tif");

        io.write_raster(array.view(), path, &profile(PixelType::Int32)).unwrap();
        let stored = io.read_array(path).unwrap();
        assert_eq!(stored.iter().copied().collect::<Vec<_>>(), vec![8.0, -8.0, 7.0, 1.0]);
    }

    #[test]
    fn test_memory_rejects_out_of_range_without_storing() {
        let io = MemoryRasterIo::new();
        let array = Array3::from_elem((2, 2, 1), 300.0);
        let path = Path::new("mem/r.tif");

        assert!(io.write_raster(array.view(), path, &profile(PixelType::UInt8)).is_err());
        assert!(!io.contains(path));
        assert!(io.is_empty());
    }

    #[test]
    fn test_missing_raster_is_io_error() {
        let io = MemoryRasterIo::new();
        let err = io.read_array(Path::new("nowhere.tif")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn test_write_raster_dyn_requires_rank_three() {
        let io = MemoryRasterIo::new();
        let flat = ArrayD::<f64>::zeros(IxDyn(&[4, 4]));
        let err = write_raster_dyn(&io, flat.view(), Path::new("x.tif"), &profile(PixelType::Float32))
            .unwrap_err();
        assert!(matches!(err, TilingError::RankMismatch(2)));

        let cube = ArrayD::<f64>::zeros(IxDyn(&[4, 4, 1]));
        write_raster_dyn(&io, cube.view(), Path::new("x.tif"), &profile(PixelType::Float32)).unwrap();
        assert_eq!(io.len(), 1);
    }

    #[test]
    fn test_from_single_band() {
        let band = arr2(&[[1, 2, 3], [4, 5, 6]]);
        let cube = from_single_band(band);
        assert_eq!(cube.dim(), (2, 3, 1));
        assert_eq!(cube[[1, 2, 0]], 6);
    }
}
