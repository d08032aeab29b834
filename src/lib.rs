// Library exports for the geotile binary, tests and reuse

pub mod affine;
pub mod cli;
pub mod composition;
pub mod config;
pub mod error;
pub mod footprint;
#[cfg(feature = "gdal")]
pub mod gdal_io;
pub mod io;
pub mod pixel_type;
pub mod reconstruct;
pub mod tiling;
pub mod vector;

// Re-export commonly used types
pub use affine::AffineTransform;
pub use config::DatasetPaths;
pub use error::{ErrorKind, Result, TilingError};
#[cfg(feature = "gdal")]
pub use gdal_io::GdalRasterIo;
pub use io::{MemoryRasterIo, RasterIo, RasterMetadata, RasterProfile};
pub use pixel_type::{PixelType, PixelTypeTable};
pub use reconstruct::{combine_tile_batch, combine_tiles, combine_with_layout, write_combined_raster};
pub use tiling::{GridTiler, TileAttributes, TileLayout, TilePosition, TileWriteOptions};
pub use vector::{AttributeValue, FeatureRecord, GeoJsonWriter, VectorIo};
