use crate::affine::AffineTransform;
use crate::error::{Result, TilingError};
use crate::io::{RasterIo, RasterMetadata, RasterProfile};
use crate::pixel_type::{PixelType, PixelTypeTable};
use gdal::raster::{Buffer, GdalDataType, GdalType, RasterBand};
use gdal::{Dataset, DriverManager};
use log::{debug, info};
use ndarray::{Array2, Array3, ArrayView3, Axis};
use num_traits::NumCast;
use std::path::Path;

/// Native GDAL band types for each [`PixelType`].
pub fn gdal_pixel_types() -> PixelTypeTable<GdalDataType> {
    PixelTypeTable::new([
        (PixelType::UInt8, GdalDataType::UInt8),
        (PixelType::UInt16, GdalDataType::UInt16),
        (PixelType::Int16, GdalDataType::Int16),
        (PixelType::UInt32, GdalDataType::UInt32),
        (PixelType::Int32, GdalDataType::Int32),
        (PixelType::Float32, GdalDataType::Float32),
        (PixelType::Float64, GdalDataType::Float64),
    ])
}

/// GeoTIFF access through GDAL. Every call opens its own dataset, which is
/// closed when it goes out of scope.
pub struct GdalRasterIo {
    pixel_types: PixelTypeTable<GdalDataType>,
}

impl GdalRasterIo {
    pub fn new() -> Self {
        Self::with_pixel_types(gdal_pixel_types())
    }

    pub fn with_pixel_types(pixel_types: PixelTypeTable<GdalDataType>) -> Self {
        Self { pixel_types }
    }

    fn write_typed<T: GdalType + NumCast + Copy>(
        &self,
        array: ArrayView3<'_, f64>,
        path: &Path,
        profile: &RasterProfile,
    ) -> Result<()> {
        let (rows, cols, bands) = array.dim();

        // Convert everything before creating the file so a bad value leaves nothing behind
        let band_values = (0..bands)
            .map(|b| {
                array
                    .index_axis(Axis(2), b)
                    .iter()
                    .map(|&v| profile.pixel_type.cast::<T>(v))
                    .collect::<Result<Vec<T>>>()
            })
            .collect::<Result<Vec<Vec<T>>>>()?;

        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<T, _>(path, cols, rows, bands)?;

        dataset.set_geo_transform(&profile.transform.to_gdal())?;
        if !profile.projection.is_empty() {
            dataset.set_projection(&profile.projection)?;
        }

        for (i, values) in band_values.into_iter().enumerate() {
            let band_index = i + 1;
            let mut raster_band = dataset.rasterband(band_index)?;
            let mut buffer = Buffer::new((cols, rows), values);
            raster_band.write((0, 0), (cols, rows), &mut buffer)?;

            if let Some(no_data) = profile.no_data {
                raster_band.set_no_data_value(Some(no_data))?;
            }
            debug!("Wrote band {} of {}", band_index, path.display());
        }

        Ok(())
    }
}

impl Default for GdalRasterIo {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterIo for GdalRasterIo {
    fn read_metadata(&self, path: &Path) -> Result<RasterMetadata> {
        let dataset = Dataset::open(path)?;
        let (cols, rows) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;

        if cols == 0 || rows == 0 || bands == 0 {
            return Err(TilingError::InvalidDimensions { rows, cols, bands });
        }

        let rasterband: RasterBand = dataset.rasterband(1)?;
        let pixel_type = self.pixel_types.pixel_type(rasterband.band_type())?;
        let no_data = rasterband.no_data_value();
        let transform = AffineTransform::from_gdal(dataset.geo_transform()?);

        debug!(
            "{}: {}x{} pixels, {} bands, {}",
            path.display(),
            rows,
            cols,
            bands,
            pixel_type
        );

        Ok(RasterMetadata {
            cols,
            rows,
            bands,
            transform,
            projection: dataset.projection(),
            pixel_type,
            no_data,
        })
    }

    fn read_array(&self, path: &Path) -> Result<Array3<f64>> {
        info!("Reading raster: {}", path.display());
        let dataset = Dataset::open(path)?;
        let (cols, rows) = dataset.raster_size();
        let bands = dataset.raster_count() as usize;

        let mut array = Array3::zeros((rows, cols, bands));
        for b in 0..bands {
            let rasterband = dataset.rasterband(b + 1)?;
            let buffer = rasterband.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
            let band = Array2::from_shape_vec((rows, cols), buffer.data().to_vec())?;
            array.index_axis_mut(Axis(2), b).assign(&band);
        }

        Ok(array)
    }

    fn write_raster(&self, array: ArrayView3<'_, f64>, path: &Path, profile: &RasterProfile) -> Result<()> {
        let (rows, cols, bands) = array.dim();
        if rows == 0 || cols == 0 || bands == 0 {
            return Err(TilingError::InvalidDimensions { rows, cols, bands });
        }

        info!(
            "Writing {}x{}x{} {} raster: {}",
            rows,
            cols,
            bands,
            profile.pixel_type,
            path.display()
        );

        match self.pixel_types.code(profile.pixel_type)? {
            GdalDataType::UInt8 => self.write_typed::<u8>(array, path, profile),
            GdalDataType::UInt16 => self.write_typed::<u16>(array, path, profile),
            GdalDataType::Int16 => self.write_typed::<i16>(array, path, profile),
            GdalDataType::UInt32 => self.write_typed::<u32>(array, path, profile),
            GdalDataType::Int32 => self.write_typed::<i32>(array, path, profile),
            GdalDataType::Float32 => self.write_typed::<f32>(array, path, profile),
            GdalDataType::Float64 => self.write_typed::<f64>(array, path, profile),
            other => Err(TilingError::UnmappedPixelType(format!("{:?}", other))),
        }
    }
}
