use geotile::tiling::tile_file_name;
use geotile::{
    combine_with_layout, write_combined_raster, AffineTransform, GeoJsonWriter, GridTiler, MemoryRasterIo,
    PixelType, RasterIo, RasterProfile, TileLayout, TileWriteOptions,
};
use ndarray::{s, Array, Array3, Axis};
use std::path::Path;

fn satellite_scene() -> (Array3<f64>, AffineTransform) {
    let scene = Array::from_shape_fn((437, 455, 4), |(r, c, b)| ((r * 7 + c * 13 + b * 101) % 1024) as f64);
    let transform = AffineTransform::new(328530.0, 10.0, 0.0, 2750810.0, 0.0, -10.0);
    (scene, transform)
}

#[test]
fn split_write_reload_combine_restores_scene() {
    let (scene, transform) = satellite_scene();
    let io = MemoryRasterIo::new();
    let dir = tempfile::tempdir().unwrap();

    let source = Path::new("scene.tif");
    let profile = RasterProfile {
        transform,
        projection: "EPSG:32651".to_string(),
        pixel_type: PixelType::UInt16,
        no_data: None,
    };
    io.write_raster(scene.view(), source, &profile).unwrap();

    // Split from the stored raster, as a caller reading from disk would
    let metadata = io.read_metadata(source).unwrap();
    let array = io.read_array(source).unwrap();
    let tiler = GridTiler::new(array.view(), 101, metadata.transform).unwrap();
    assert_eq!(tiler.padded_canvas().dim(), (505, 505, 4));

    let options = TileWriteOptions {
        projection: metadata.projection.clone(),
        pixel_type: metadata.pixel_type,
        no_data: metadata.no_data,
    };
    let written = tiler.write_tiles(&io, dir.path(), "scene", &options).unwrap();
    assert_eq!(written.len(), 25);

    // Reload tiles by name, in grid order
    let layout = TileLayout::new(metadata.rows, metadata.cols, 101).unwrap();
    let tiles: Vec<Array3<f64>> = layout
        .iter()
        .map(|p| io.read_array(&dir.path().join(tile_file_name("scene", p.row, p.col))).unwrap())
        .collect();
    let views: Vec<_> = tiles.iter().map(|t| t.view()).collect();

    let destination = dir.path().join("combined.tif");
    write_combined_raster(&io, &views, &layout, &destination, &metadata.profile()).unwrap();

    let combined_metadata = io.read_metadata(&destination).unwrap();
    assert_eq!(combined_metadata, metadata);
    assert_eq!(io.read_array(&destination).unwrap(), scene);
}

#[test]
fn tiles_land_at_their_georeferenced_position() {
    let (scene, transform) = satellite_scene();
    let tiler = GridTiler::new(scene.view(), 128, transform).unwrap();

    for attributes in tiler.tile_attributes() {
        let tile = tiler.tile_at(attributes.tile_row, attributes.tile_col).unwrap();
        let (x, y) = attributes.transform.apply(0.5, 0.5);
        let (row, col) = transform.coord_to_pixel(x, y).unwrap();
        let (row, col) = (row as usize, col as usize);

        assert_eq!((row, col), (attributes.tile_row * 128, attributes.tile_col * 128));
        assert_eq!(tile[[0, 0, 2]], scene[[row, col, 2]]);
    }
}

#[test]
fn per_tile_model_output_is_reassembled() {
    let (scene, transform) = satellite_scene();
    let tiler = GridTiler::new(scene.view(), 128, transform).unwrap();
    let batch = tiler.split_into_tiles();
    assert_eq!(batch.dim(), (16, 128, 128, 4));

    // Thresholding model producing a single-band mask per tile
    let masks: Vec<Array3<f64>> = batch
        .axis_iter(Axis(0))
        .map(|tile| {
            tile.slice(s![.., .., 0..1])
                .mapv(|v| if v > 512.0 { 1.0 } else { 0.0 })
        })
        .collect();
    let views: Vec<_> = masks.iter().map(|m| m.view()).collect();

    let mask = combine_with_layout(&views, tiler.layout()).unwrap();
    assert_eq!(mask.dim(), (437, 455, 1));
    let expected = scene.slice(s![.., .., 0..1]).mapv(|v| if v > 512.0 { 1.0 } else { 0.0 });
    assert_eq!(mask, expected);
}

#[test]
fn tile_footprints_cover_the_padded_canvas() {
    let (scene, transform) = satellite_scene();
    let tiler = GridTiler::new(scene.view(), 128, transform).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiles.geojson");

    tiler.write_tile_footprints(&GeoJsonWriter::new(), &path).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 16);

    // Bottom-right corner of the last tile is the padded canvas corner
    let last_ring = &features[15]["geometry"]["coordinates"][0];
    assert_eq!(last_ring[2][0], 328530.0 + 512.0 * 10.0);
    assert_eq!(last_ring[2][1], 2750810.0 - 512.0 * 10.0);
}
