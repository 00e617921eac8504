pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

pub(crate) fn sub_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_sub(b)
}

/// Move `dst` toward `src` by `alpha / 255`, rounding to nearest.
pub(crate) fn lerp_u8(dst: u8, src: u8, alpha: u8) -> u8 {
    let d = i32::from(dst);
    let delta = i32::from(src) - d;
    let step = (delta * i32::from(alpha) + if delta >= 0 { 127 } else { -127 }) / 255;
    (d + step).clamp(0, 255) as u8
}

pub fn cos_degrees(deg: f64) -> f64 {
    deg.to_radians().cos()
}

pub fn sin_degrees(deg: f64) -> f64 {
    deg.to_radians().sin()
}

/// Round with ties toward positive infinity.
///
/// Matches the rounding of browser canvases, so `-0.5` lands on `0` rather than `-1`.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Round `v` to `digits` decimal places.
pub fn round_to(v: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    (v * scale).round() / scale
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
