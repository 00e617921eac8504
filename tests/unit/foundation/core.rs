use super::*;

#[test]
fn world_size_rejects_empty_dimensions() {
    assert!(WorldSize::new(0, 10).is_err());
    assert!(WorldSize::new(10, 0).is_err());
    assert_eq!(WorldSize::new(4, 3).unwrap().area(), 12);
}

#[test]
fn world_index_roundtrips_coords() {
    let world = WorldSize::new(7, 5).unwrap();
    let idx = world.index_of(3, 2).unwrap();
    assert_eq!(idx, 2 * 7 + 3);
    assert_eq!(world.coords_of(idx), (3, 2));
    assert_eq!(world.index_of(7, 0), None);
    assert_eq!(world.index_of(0, 5), None);
    assert_eq!(world.index_of(-1, 0), None);
}

#[test]
fn vertical_bands_cover_the_world_without_gaps() {
    let bands = Viewport::vertical_bands(3);
    assert_eq!(bands.len(), 3);
    assert_eq!(bands[0].x, 0.0);
    assert_eq!(bands[1].x, 0.333);
    assert_eq!(bands[2].x, 0.667);
    assert_eq!(bands[2].right(), 1.0);
    for pair in bands.windows(2) {
        assert!((pair[0].right() - pair[1].x).abs() < 1e-12);
    }
    for band in &bands {
        band.validate().unwrap();
    }
}

#[test]
fn viewport_validation_rejects_degenerate_slices() {
    let empty = Viewport {
        w: 0.0,
        ..Viewport::FULL
    };
    assert!(empty.validate().is_err());
    let outside = Viewport {
        x: 0.5,
        w: 0.9,
        ..Viewport::FULL
    };
    assert!(outside.validate().is_err());
    let nan = Viewport {
        y: f64::NAN,
        ..Viewport::FULL
    };
    assert!(nan.validate().is_err());
}

#[test]
fn surface_size_covers_band_pixels() {
    let world = WorldSize::new(100, 40).unwrap();
    let bands = Viewport::vertical_bands(3);
    let widths: Vec<u32> = bands.iter().map(|b| b.surface_size(world).0).collect();
    assert_eq!(widths.iter().sum::<u32>(), 100);
    assert_eq!(bands[1].origin_px(world), (33, 0));
    for band in &bands {
        assert_eq!(band.surface_size(world).1, 40);
    }
}

#[test]
fn max_alpha_depends_on_blend_mode() {
    assert_eq!(BlendMode::Add.max_alpha(), 128.0);
    assert_eq!(BlendMode::Subtract.max_alpha(), 128.0);
    assert_eq!(BlendMode::Blend.max_alpha(), 255.0);
}
