use ndarray::{s, Array2, Array3};
use rgba_merge::{
    backends::memory::{MemDriver, MemRaster},
    merge, GeoTransform, LogObserver, MergeError, MergeOptions, ProfileOverrides, RasterSource,
    Resolution, ValidationError,
};

fn transform() -> GeoTransform {
    GeoTransform::from([-114., 0.2, 0., 46., 0., -0.2])
}

fn raster(data: Array3<u8>) -> MemRaster<u8> {
    let shape = data.shape();
    let shape = [shape[0], shape[1], shape[2]];
    MemRaster::from_vec(transform(), shape, data.iter().copied().collect()).unwrap()
}

/// 254 with full alpha over rows and cols 4..8.
fn a() -> MemRaster<u8> {
    let mut data = Array3::zeros((4, 10, 10));
    data.slice_mut(s![0..3, 4..8, 4..8]).fill(254);
    data.slice_mut(s![3, 4..8, 4..8]).fill(255);
    raster(data).with_description("a")
}

/// 255 with full alpha over rows and cols 0..6.
fn b() -> MemRaster<u8> {
    let mut data = Array3::zeros((4, 10, 10));
    data.slice_mut(s![.., 0..6, 0..6]).fill(255);
    raster(data).with_description("b")
}

fn band(raster: &MemRaster<u8>, index: usize) -> Array2<u8> {
    Array2::from_shape_vec(raster.shape(), raster.band(index).to_vec()).unwrap()
}

#[test_log::test]
fn first_source_wins_overlap() {
    let sources = [a(), b()];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut LogObserver).unwrap();
    assert_eq!(merged.profile.count, 4);
    assert_eq!((merged.profile.width, merged.profile.height), (10, 10));

    let mut expected = Array2::<u8>::zeros((10, 10));
    expected.slice_mut(s![0..6, 0..6]).fill(255);
    expected.slice_mut(s![4..8, 4..8]).fill(254);
    assert_eq!(band(&merged.output, 0), expected);

    let mut alpha = Array2::<u8>::zeros((10, 10));
    alpha.slice_mut(s![0..6, 0..6]).fill(255);
    alpha.slice_mut(s![4..8, 4..8]).fill(255);
    assert_eq!(band(&merged.output, 3), alpha);
    assert_eq!(merged.summary.sources_resampled, 0);
}

#[test_log::test]
fn reversed_order_flips_overlap() {
    let sources = [b(), a()];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();

    let mut expected = Array2::<u8>::zeros((10, 10));
    expected.slice_mut(s![4..8, 4..8]).fill(254);
    expected.slice_mut(s![0..6, 0..6]).fill(255);
    assert_eq!(band(&merged.output, 0), expected);
}

#[test_log::test]
fn explicit_bounds_crop_output() {
    let sources = [a(), b()];
    let options = MergeOptions {
        bounds: Some([-113.4, 44.8, -112.8, 45.4]),
        ..Default::default()
    };
    let merged = merge(&sources, &MemDriver, &options, &mut ()).unwrap();
    let expected: Array2<u8> = ndarray::array![
        [255, 255, 255],
        [255, 254, 254],
        [255, 254, 254]
    ];
    assert_eq!(band(&merged.output, 0), expected);
    assert_eq!(merged.summary.sources_resampled, 0);
}

#[test_log::test]
fn fractional_bounds_blend_edge_pixels() {
    // Half a pixel off the source grid on every side.
    let sources = [a(), b()];
    let options = MergeOptions {
        bounds: Some([-113.5, 44.75, -112.75, 45.45]),
        ..Default::default()
    };
    let merged = merge(&sources, &MemDriver, &options, &mut ()).unwrap();
    assert_eq!(merged.output.shape(), (4, 4));
    assert_eq!(merged.summary.sources_resampled, 2);

    let output = band(&merged.output, 0);
    let alpha = band(&merged.output, 3);
    // Fully inside b, then fully inside a.
    assert_eq!(output[[0, 0]], 255);
    assert_eq!(output.slice(s![2..4, 2..4]), Array2::<u8>::from_elem((2, 2), 254));
    // Edges straddling the end of b take a partial, non-zero share.
    assert!((120..=135).contains(&output[[0, 3]]));
    assert!((120..=135).contains(&alpha[[0, 3]]));
    assert_eq!(output[[3, 0]], 64);
    // A quarter of a's corner pixel outweighs nothing, a wins over b.
    assert_eq!(output[[1, 1]], 95);
}

#[test_log::test]
fn coarser_resolution_resamples() {
    let sources = [a(), b()];
    let options = MergeOptions {
        resolution: Resolution::from(0.4),
        ..Default::default()
    };
    let merged = merge(&sources, &MemDriver, &options, &mut ()).unwrap();
    let expected: Array2<u8> = ndarray::array![
        [255, 255, 255, 0, 0],
        [255, 255, 255, 0, 0],
        [255, 255, 254, 254, 0],
        [0, 0, 254, 254, 0],
        [0, 0, 0, 0, 0]
    ];
    assert_eq!(band(&merged.output, 0), expected);
    assert!(merged.summary.sources_resampled > 0);
}

#[test_log::test]
fn full_first_source_skips_the_rest() {
    let mut full = Array3::ones((4, 10, 10));
    full.slice_mut(s![3, .., ..]).fill(255);
    let sources = [raster(full), b()];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();

    assert_eq!(band(&merged.output, 0), Array2::<u8>::ones((10, 10)));
    assert_eq!(merged.summary.early_exits, merged.summary.blocks);
    assert_eq!(sources[1].reads(), 0);
}

#[test_log::test]
fn early_exit_is_per_block() {
    // 5x5 blocks: only the top left one is full once b is composited.
    let mut first = a();
    first.profile_mut().block_size = Some((5, 5));
    let mut background = Array3::ones((4, 10, 10));
    background.slice_mut(s![0..3, .., ..]).fill(9);
    background.slice_mut(s![3, .., ..]).fill(255);
    let sources = [first, b(), raster(background)];

    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();
    assert_eq!(merged.summary.blocks, 4);
    assert_eq!(merged.summary.early_exits, 1);
    assert_eq!(sources[2].reads(), 3);

    let output = band(&merged.output, 0);
    assert_eq!(output[[0, 0]], 255);
    assert_eq!(output[[5, 5]], 254);
    assert_eq!(output[[9, 9]], 9);
    assert!(band(&merged.output, 3).iter().all(|alpha| *alpha == 255));
}

#[test_log::test]
fn single_source_is_copied() {
    let data = Array3::from_shape_fn((4, 10, 10), |(band, row, col)| {
        if band == 3 {
            255
        } else {
            (band * 100 + row * 10 + col) as u8
        }
    });
    let sources = [raster(data.clone())];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();
    let output = Array3::from_shape_vec((4, 10, 10), merged.output.data().as_slice().to_vec()).unwrap();
    assert_eq!(output, data);
}

#[test_log::test]
fn transparent_sources_give_transparent_output() {
    let sources = [raster(Array3::zeros((4, 10, 10)))];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();
    assert!(merged.output.data().as_slice().iter().all(|v| *v == 0));
}

#[test_log::test]
fn creation_options_shape_output() {
    let mut source = MemRaster::<u8>::filled(
        GeoTransform::from([-114., 0.1, 0., 46., 0., -0.1]),
        (32, 32),
        [1, 1, 1, 255],
    );
    source.profile_mut().compress = Some("jpeg".into());
    let sources = [source];

    let mut options = MergeOptions {
        overrides: ProfileOverrides::parse(["tiled=true", "blockxsize=16", "blockysize=16"]).unwrap(),
        ..Default::default()
    };
    let merged = merge(&sources, &MemDriver, &options, &mut ()).unwrap();
    assert!(merged.profile.tiled);
    assert_eq!(merged.profile.block_size, Some((16, 16)));
    assert_eq!(merged.profile.compress.as_deref(), Some("jpeg"));
    assert_eq!(merged.summary.blocks, 4);
    assert_eq!(merged.output.profile().block_size, Some((16, 16)));

    options.overrides.set("compress", "none").unwrap();
    let merged = merge(&sources, &MemDriver, &options, &mut ()).unwrap();
    assert_eq!(merged.profile.compress.as_deref(), Some("none"));
}

#[test_log::test]
fn rgb_inputs_are_rejected() {
    let sources = [MemRaster::<u8>::zeros(transform(), (10, 10), 3).with_description("rgb1")];
    let err = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap_err();
    assert!(matches!(
        err,
        MergeError::Validation(ValidationError::NotRgba { index: 0, count: 3, .. })
    ));
    assert!(err.to_string().contains("Inputs must be 4-band RGBA rasters"));
}

#[test_log::test]
fn float_noise_stays_on_direct_path() {
    // Grid on the unshifted pixel edges, the source is off by far less than a pixel.
    let shifted = GeoTransform::from([-114. + 1e-10, 0.2, 0., 46. - 1e-10, 0., -0.2]);
    let make = || {
        let mut data = Array3::<u8>::zeros((4, 10, 10));
        data.slice_mut(s![.., 2..5, 2..5]).fill(200);
        MemRaster::from_vec(shifted, [4, 10, 10], data.iter().copied().collect()).unwrap()
    };
    let on_grid = MergeOptions {
        bounds: Some([-114., 44., -112., 46.]),
        ..Default::default()
    };

    let sources = [make()];
    let merged = merge(&sources, &MemDriver, &on_grid, &mut ()).unwrap();
    assert_eq!(merged.output.transform(), transform());
    assert_eq!(merged.summary.sources_resampled, 0);
    assert_eq!(band(&merged.output, 0).slice(s![2..5, 2..5]), Array2::<u8>::from_elem((3, 3), 200));

    let strict = MergeOptions {
        precision: 15,
        ..on_grid
    };
    let sources = [make()];
    let merged = merge(&sources, &MemDriver, &strict, &mut ()).unwrap();
    assert_eq!(merged.output.shape(), (10, 10));
    assert_eq!(merged.summary.sources_resampled, 1);
}

#[test_log::test]
fn identity_merge_at_fine_resolution() {
    let source_transform = GeoTransform::from([-114., 0.1, 0., 46., 0., -0.1]);
    let data = Array3::from_shape_fn((4, 32, 32), |(band, row, col)| {
        if band == 3 {
            255
        } else {
            (row * 7 + col * 3 + band) as u8
        }
    });
    let sources = [MemRaster::from_vec(source_transform, [4, 32, 32], data.iter().copied().collect()).unwrap()];
    let merged = merge(&sources, &MemDriver, &MergeOptions::default(), &mut ()).unwrap();

    assert_eq!(merged.output.shape(), (32, 32));
    assert_eq!(merged.output.transform(), source_transform);
    assert_eq!(merged.summary.sources_resampled, 0);
    let output = Array3::from_shape_vec((4, 32, 32), merged.output.data().as_slice().to_vec()).unwrap();
    assert_eq!(output, data);
}

#[test]
fn options_round_trip_through_json() {
    let options = MergeOptions {
        bounds: Some([-113.4, 44.8, -112.8, 45.4]),
        resolution: Resolution::Sequence(vec![0.4, 0.2]),
        ..Default::default()
    };
    let json = serde_json::to_string(&options).unwrap();
    let parsed: MergeOptions = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, options);
}
