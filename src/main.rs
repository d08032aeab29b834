use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use std::path::{Path, PathBuf};

use geotile::cli::{Args, Command};
use geotile::config::DatasetPaths;
use geotile::gdal_io::GdalRasterIo;
use geotile::io::{RasterIo, RasterProfile};
use geotile::pixel_type::PixelType;
use geotile::tiling::{tile_file_name, GridTiler, TileLayout, TileWriteOptions};
use geotile::vector::GeoJsonWriter;
use geotile::{composition, footprint, reconstruct, Result};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let datasets = DatasetPaths::from_entries(&args.datasets)?;
    let io = GdalRasterIo::new();

    match args.command {
        Command::Split {
            input,
            tile_size,
            output_dir,
            prefix,
            footprints,
            pixel_type,
        } => split(
            &io,
            &datasets.resolve(&input),
            tile_size,
            &output_dir,
            prefix,
            footprints.as_deref(),
            pixel_type,
        ),
        Command::Combine {
            reference,
            tiles_dir,
            prefix,
            tile_size,
            output,
            pixel_type,
        } => combine(
            &io,
            &datasets.resolve(&reference),
            &tiles_dir,
            &prefix,
            tile_size,
            &output,
            pixel_type,
        ),
        Command::Compose {
            reference,
            output,
            pixel_type,
            sources,
        } => {
            let sources: Vec<PathBuf> = sources.iter().map(|s| datasets.resolve(s)).collect();
            composition::write_band_composition(
                &io,
                &datasets.resolve(&reference),
                &sources,
                &output,
                pixel_type,
            )
        }
        Command::Footprints {
            input,
            output,
            with_bands,
        } => {
            let count = footprint::write_pixel_footprints(
                &io,
                &GeoJsonWriter::new(),
                &datasets.resolve(&input),
                &output,
                with_bands,
            )?;
            info!("Wrote {} pixel polygons", count);
            Ok(())
        }
    }
}

fn split(
    io: &GdalRasterIo,
    input: &Path,
    tile_size: usize,
    output_dir: &Path,
    prefix: Option<String>,
    footprints: Option<&Path>,
    pixel_type: Option<PixelType>,
) -> Result<()> {
    let metadata = io.read_metadata(input)?;
    info!(
        "Raster size: {}x{} pixels, {} bands",
        metadata.rows, metadata.cols, metadata.bands
    );

    if (metadata.transform.pixel_width.abs() - metadata.transform.pixel_height.abs()).abs() > 1e-9 {
        warn!(
            "Non-square pixels detected ({:.6} x {:.6})",
            metadata.transform.pixel_width, metadata.transform.pixel_height
        );
    }

    let array = io.read_array(input)?;
    let tiler = match metadata.no_data {
        Some(no_data) => GridTiler::with_fill(array.view(), tile_size, metadata.transform, no_data)?,
        None => GridTiler::new(array.view(), tile_size, metadata.transform)?,
    };

    let prefix = prefix.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tile".to_string())
    });
    let options = TileWriteOptions {
        projection: metadata.projection.clone(),
        pixel_type: pixel_type.unwrap_or(metadata.pixel_type),
        no_data: metadata.no_data,
    };

    let written = tiler.write_tiles(io, output_dir, &prefix, &options)?;
    info!(
        "Wrote {} tiles ({}x{} grid)",
        written.len(),
        tiler.tile_rows(),
        tiler.tile_cols()
    );

    if let Some(path) = footprints {
        tiler.write_tile_footprints(&GeoJsonWriter::new().with_layer_name(prefix.as_str()), path)?;
    }

    info!("=== Done! ===");
    Ok(())
}

fn combine(
    io: &GdalRasterIo,
    reference: &Path,
    tiles_dir: &Path,
    prefix: &str,
    tile_size: usize,
    output: &Path,
    pixel_type: Option<PixelType>,
) -> Result<()> {
    let metadata = io.read_metadata(reference)?;
    let layout = TileLayout::new(metadata.rows, metadata.cols, tile_size)?;

    let mut tiles = Vec::with_capacity(layout.tile_count());
    for position in layout.iter() {
        let path = tiles_dir.join(tile_file_name(prefix, position.row, position.col));
        tiles.push(io.read_array(&path)?);
    }
    let first_tile = tiles_dir.join(tile_file_name(prefix, 0, 0));
    let tile_metadata = io.read_metadata(&first_tile)?;

    let views: Vec<_> = tiles.iter().map(|t| t.view()).collect();
    let profile = RasterProfile {
        transform: metadata.transform,
        projection: metadata.projection,
        pixel_type: pixel_type.unwrap_or(tile_metadata.pixel_type),
        no_data: tile_metadata.no_data,
    };
    reconstruct::write_combined_raster(io, &views, &layout, output, &profile)?;

    info!("=== Done! ===");
    Ok(())
}
