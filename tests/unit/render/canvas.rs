use super::*;

fn black(w: u32, h: u32) -> Canvas {
    let mut c = Canvas::new(w, h).unwrap();
    c.clear(Rgba8::opaque(0, 0, 0));
    c
}

#[test]
fn zero_sized_canvas_is_rejected() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, 0).is_err());
}

#[test]
fn additive_plot_saturates() {
    let mut c = black(2, 2);
    let red = Rgba8::opaque(255, 0, 0);
    for _ in 0..4 {
        c.plot(1, 1, red, 128.0, BlendMode::Add);
    }
    assert_eq!(c.pixel(1, 1).unwrap(), Rgba8::opaque(255, 0, 0));
    assert_eq!(c.pixel(0, 0).unwrap(), Rgba8::opaque(0, 0, 0));
}

#[test]
fn subtractive_plot_floors_at_zero() {
    let mut c = Canvas::new(1, 1).unwrap();
    c.clear(Rgba8::opaque(100, 100, 100));
    c.plot(0, 0, Rgba8::opaque(255, 50, 0), 255.0, BlendMode::Subtract);
    assert_eq!(c.pixel(0, 0).unwrap(), Rgba8::opaque(0, 50, 100));
}

#[test]
fn full_alpha_blend_replaces_color() {
    let mut c = black(1, 1);
    c.plot(0, 0, Rgba8::opaque(10, 20, 30), 255.0, BlendMode::Blend);
    assert_eq!(c.pixel(0, 0).unwrap(), Rgba8::opaque(10, 20, 30));
}

#[test]
fn out_of_bounds_and_non_positive_alpha_are_ignored() {
    let mut c = black(2, 2);
    let before = c.clone();
    let white = Rgba8::opaque(255, 255, 255);
    c.plot(-1, 0, white, 255.0, BlendMode::Blend);
    c.plot(0, 2, white, 255.0, BlendMode::Blend);
    c.plot(0, 0, white, -20.0, BlendMode::Add);
    c.plot(0, 0, white, f64::NAN, BlendMode::Add);
    assert_eq!(c, before);
}

#[test]
fn fade_converges_toward_background() {
    let mut c = Canvas::new(3, 130).unwrap();
    c.clear(Rgba8::opaque(255, 255, 255));
    for _ in 0..200 {
        c.fade(Rgba8::new(0, 0, 0, 5));
    }
    let p = c.pixel(2, 129).unwrap();
    assert!(p.r < 40, "{p:?}");
    assert_eq!(p.a, 255);
}
