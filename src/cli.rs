use crate::pixel_type::PixelType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "geotile")]
#[command(about = "Split georeferenced rasters into square tiles and stitch them back together")]
#[command(version)]
pub struct Args {
    /// Register a dataset name usable in place of a path (repeatable)
    #[arg(long = "dataset", value_name = "NAME=PATH", global = true)]
    pub datasets: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pad a raster to whole tiles and write one GeoTIFF per tile
    Split {
        /// Input raster (path or dataset name)
        #[arg(short, long, value_name = "FILE")]
        input: String,

        /// Tile edge length in pixels
        #[arg(short = 's', long, value_name = "PIXELS")]
        tile_size: usize,

        /// Directory receiving the tiles
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        /// Tile file name prefix (default: input file stem)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Also write tile footprints as GeoJSON
        #[arg(long, value_name = "FILE")]
        footprints: Option<PathBuf>,

        /// Override the output pixel type (default: same as input)
        #[arg(long, value_name = "TYPE")]
        pixel_type: Option<PixelType>,
    },

    /// Reassemble tiles written by `split` into one raster
    Combine {
        /// Raster the tiles were cut from (path or dataset name)
        #[arg(short, long, value_name = "FILE")]
        reference: String,

        /// Directory holding the tiles
        #[arg(short, long, value_name = "DIR")]
        tiles_dir: PathBuf,

        /// Tile file name prefix
        #[arg(short, long)]
        prefix: String,

        /// Tile edge length in pixels
        #[arg(short = 's', long, value_name = "PIXELS")]
        tile_size: usize,

        /// Output raster
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Override the output pixel type (default: same as the first tile)
        #[arg(long, value_name = "TYPE")]
        pixel_type: Option<PixelType>,
    },

    /// Stack the bands of several rasters on the grid of a reference raster
    Compose {
        /// Raster providing the output grid (path or dataset name)
        #[arg(short, long, value_name = "FILE")]
        reference: String,

        /// Output raster
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Override the output pixel type (default: same as reference)
        #[arg(long, value_name = "TYPE")]
        pixel_type: Option<PixelType>,

        /// Rasters whose bands are stacked, in order (paths or dataset names)
        #[arg(required = true, value_name = "SOURCES")]
        sources: Vec<String>,
    },

    /// Write one polygon per pixel as GeoJSON
    Footprints {
        /// Input raster (path or dataset name)
        #[arg(short, long, value_name = "FILE")]
        input: String,

        /// Output GeoJSON
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Attach pixel values as band1..bandN attributes
        #[arg(long)]
        with_bands: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_split() {
        let args = Args::parse_from([
            "geotile",
            "--dataset",
            "scene=data/scene.tif",
            "split",
            "-i",
            "scene",
            "-s",
            "128",
            "-o",
            "out",
            "--pixel-type",
            "uint16",
        ]);

        assert_eq!(args.datasets, vec!["scene=data/scene.tif".to_string()]);
        match args.command {
            Command::Split {
                input,
                tile_size,
                pixel_type,
                prefix,
                ..
            } => {
                assert_eq!(input, "scene");
                assert_eq!(tile_size, 128);
                assert_eq!(pixel_type, Some(PixelType::UInt16));
                assert_eq!(prefix, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_compose_sources() {
        let args = Args::parse_from([
            "geotile", "compose", "-r", "a.tif", "-o", "out.tif", "a.tif", "b.tif", "--verbose",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Compose { sources, .. } => assert_eq!(sources, vec!["a.tif", "b.tif"]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_pixel_type() {
        let result = Args::try_parse_from([
            "geotile", "split", "-i", "a.tif", "-s", "64", "-o", "out", "--pixel-type", "complex64",
        ]);
        assert!(result.is_err());
    }
}
