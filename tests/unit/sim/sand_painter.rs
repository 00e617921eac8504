use super::*;
use crate::render::canvas::Canvas;

fn opts(additive: bool, subtractive: bool) -> SceneOptions {
    SceneOptions {
        blending_additive: additive,
        blending_subtractive: subtractive,
        ..SceneOptions::default()
    }
}

#[test]
fn lookup_rejects_degenerate_grain_counts() {
    assert!(SandLookup::new(0).is_err());
    assert!(SandLookup::new(1).is_err());
    assert!(SandLookup::new(2).is_ok());
}

#[test]
fn alpha_envelope_decreases_and_sine_table_is_sized() {
    let lookup = SandLookup::new(64).unwrap();
    assert_eq!(lookup.grains(), 64);
    assert!((lookup.alpha(0) - 0.2).abs() < 1e-12);
    for i in 1..64 {
        assert!(lookup.alpha(i) < lookup.alpha(i - 1));
    }
    assert_eq!(lookup.sine(0), 0.0);
    assert!((lookup.sine(999) - (0.999f64).sin()).abs() < 1e-12);
    assert_eq!(lookup.sine(5000), lookup.sine(999));
}

#[test]
fn cache_reuses_tables_until_grain_count_changes() {
    let mut cache = SandLookupCache::new();
    let a = cache.get(64).unwrap();
    let b = cache.get(64).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    let c = cache.get(32).unwrap();
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(c.grains(), 32);
    assert!(cache.get(1).is_err());
}

#[test]
fn blend_mode_follows_flags() {
    let palette = Palette::new(0);
    let mut r = SeededRandom::new(3);
    assert_eq!(
        SandPainter::new(&palette, &mut r, &opts(true, false)).mode(),
        BlendMode::Add
    );
    assert_eq!(
        SandPainter::new(&palette, &mut r, &opts(false, true)).mode(),
        BlendMode::Subtract
    );
    assert_eq!(
        SandPainter::new(&palette, &mut r, &opts(false, false)).mode(),
        BlendMode::Blend
    );

    let mut seen_add = false;
    let mut seen_sub = false;
    for _ in 0..64 {
        match SandPainter::new(&palette, &mut r, &opts(true, true)).mode() {
            BlendMode::Add => seen_add = true,
            BlendMode::Subtract => seen_sub = true,
            BlendMode::Blend => panic!("both flags set must never alpha blend"),
        }
    }
    assert!(seen_add && seen_sub);
}

#[test]
fn painter_construction_is_deterministic() {
    let palette = Palette::new(2);
    let a = SandPainter::new(&palette, &mut SeededRandom::new(11), &opts(true, true));
    let b = SandPainter::new(&palette, &mut SeededRandom::new(11), &opts(true, true));
    assert_eq!(a, b);
    assert!((0.001..0.01).contains(&a.grain_distance()));
}

#[test]
fn render_marks_pixels_between_the_endpoints() {
    let palette = Palette::new(0);
    let mut painter = SandPainter::new(&palette, &mut SeededRandom::new(1), &opts(false, false));
    let lookup = SandLookup::new(64).unwrap();
    let mut canvas = Canvas::new(32, 8).unwrap();
    canvas.clear(Rgba8::opaque(0, 0, 0));
    let blank = canvas.clone();

    for _ in 0..50 {
        painter.render(
            &mut canvas,
            &lookup,
            CosmeticRandom,
            (0, 0),
            Point::new(30.0, 4.0),
            Point::new(2.0, 4.0),
        );
    }
    assert_ne!(canvas, blank);
    assert!((0.0..=1.0).contains(&painter.grain_distance()));
    for x in 0..32 {
        for y in [0u32, 1, 2, 6, 7] {
            assert_eq!(canvas.pixel(x, y), blank.pixel(x, y));
        }
    }
}

#[test]
fn render_respects_the_surface_origin() {
    let palette = Palette::new(0);
    let mut painter = SandPainter::new(&palette, &mut SeededRandom::new(1), &opts(false, false));
    let lookup = SandLookup::new(16).unwrap();
    let mut canvas = Canvas::new(4, 4).unwrap();
    canvas.clear(Rgba8::opaque(0, 0, 0));
    let blank = canvas.clone();

    painter.render(
        &mut canvas,
        &lookup,
        CosmeticRandom,
        (100, 0),
        Point::new(2.0, 2.0),
        Point::new(1.0, 1.0),
    );
    assert_eq!(canvas, blank);

    painter.render(
        &mut canvas,
        &lookup,
        CosmeticRandom,
        (100, 0),
        Point::new(102.0, 2.0),
        Point::new(101.0, 1.0),
    );
    assert_ne!(canvas.pixel(1, 1), blank.pixel(1, 1));
}
