use crate::affine::AffineTransform;
use crate::error::Result;
use crate::io::RasterIo;
use crate::vector::{AttributeValue, FeatureRecord, VectorIo};
use log::info;
use ndarray::ArrayView3;
use std::path::Path;

/// One polygon per pixel, row-major. With `include_bands` each record
/// carries the pixel's values as `band1..bandN`.
pub fn pixel_footprints<T: Copy + Into<f64>>(
    array: ArrayView3<'_, T>,
    transform: &AffineTransform,
    include_bands: bool,
) -> Vec<FeatureRecord> {
    let (rows, cols, bands) = array.dim();
    let mut records = Vec::with_capacity(rows * cols);

    for row in 0..rows {
        for col in 0..cols {
            let mut record = FeatureRecord::new(transform.pixel_cell_polygon(row, col));
            if include_bands {
                for band in 0..bands {
                    let value: f64 = array[[row, col, band]].into();
                    record = record.with_attribute(format!("band{}", band + 1), AttributeValue::Float(value));
                }
            }
            records.push(record);
        }
    }

    records
}

/// Read a raster and write its pixel footprints as a vector file.
pub fn write_pixel_footprints<R: RasterIo, V: VectorIo>(
    raster_io: &R,
    vector_io: &V,
    src: &Path,
    dst: &Path,
    include_bands: bool,
) -> Result<usize> {
    let metadata = raster_io.read_metadata(src)?;
    let array = raster_io.read_array(src)?;
    info!(
        "Converting {}x{} pixels of {} to polygons",
        metadata.rows,
        metadata.cols,
        src.display()
    );

    let records = pixel_footprints(array.view(), &metadata.transform, include_bands);
    vector_io.write_features(dst, &records)?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryRasterIo, RasterProfile};
    use crate::pixel_type::PixelType;
    use crate::vector::GeoJsonWriter;
    use geo::Area;
    use ndarray::Array3;

    fn transform() -> AffineTransform {
        AffineTransform::north_up(500.0, 1000.0, 2.0, -2.0)
    }

    #[test]
    fn test_pixel_footprints_order_and_area() {
        let array = Array3::from_shape_fn((2, 3, 1), |(r, c, _)| (r * 3 + c) as u8);
        let records = pixel_footprints(array.view(), &transform(), false);

        assert_eq!(records.len(), 6);
        for record in &records {
            assert!((record.geometry.unsigned_area() - 4.0).abs() < 1e-9);
            assert!(record.attributes.is_empty());
        }
        // Fifth record is row 1, col 1
        let corner = records[4].geometry.exterior().0[0];
        assert_eq!((corner.x, corner.y), (502.0, 998.0));
    }

    #[test]
    fn test_pixel_footprints_with_bands() {
        let array = Array3::from_shape_fn((2, 2, 3), |(r, c, b)| (r * 100 + c * 10 + b) as i32);
        let records = pixel_footprints(array.view(), &transform(), true);

        assert_eq!(records[3].attributes.len(), 3);
        assert_eq!(records[3].attribute("band1"), Some(&AttributeValue::Float(110.0)));
        assert_eq!(records[3].attribute("band3"), Some(&AttributeValue::Float(112.0)));
    }

    #[test]
    fn test_write_pixel_footprints() {
        let io = MemoryRasterIo::new();
        let src = Path::new("mem/small.tif");
        let array = Array3::from_elem((3, 4, 2), 1.0);
        let profile = RasterProfile {
            transform: transform(),
            projection: String::new(),
            pixel_type: PixelType::Float32,
            no_data: None,
        };
        io.write_raster(array.view(), src, &profile).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("pixels.geojson");
        let count = write_pixel_footprints(&io, &GeoJsonWriter::new(), src, &dst, true).unwrap();

        assert_eq!(count, 12);
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&dst).unwrap()).unwrap();
        assert_eq!(json["features"][11]["properties"]["band2"], 1.0);
    }
}
