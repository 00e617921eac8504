use rayon::prelude::*;

use crate::foundation::core::{BlendMode, Rgba8};
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::foundation::math::{add_sat_u8, lerp_u8, mul_div255_u8, sub_sat_u8};

/// Rows per rayon task when fading; small surfaces stay on the calling thread.
const FADE_ROWS_PER_TASK: usize = 64;

/// Pixel-plotting surface consumed by the sand painter and the engine.
pub trait Surface {
    /// Width in pixels.
    fn width(&self) -> u32;
    /// Height in pixels.
    fn height(&self) -> u32;
    /// Combine `color` into the pixel at `(x, y)` with the given alpha (0..=255 scale).
    ///
    /// Out-of-surface coordinates and non-positive alpha are ignored.
    fn plot(&mut self, x: i64, y: i64, color: Rgba8, alpha: f64, mode: BlendMode);
    /// Blend every pixel toward `color` by `color.a`.
    fn fade(&mut self, color: Rgba8);
    /// Overwrite every pixel with `color`.
    fn clear(&mut self, color: Rgba8);
}

/// CPU surface backed by tightly packed, row-major, straight-alpha RGBA8.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Canvas {
    /// Allocate a transparent surface.
    pub fn new(width: u32, height: u32) -> SubstrateResult<Self> {
        if width == 0 || height == 0 {
            return Err(SubstrateError::validation(format!(
                "canvas size must be non-zero, got {width}x{height}"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SubstrateError::validation("canvas buffer size overflow"))?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Read one pixel.
    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.data[i..i + 4];
        Some(Rgba8::new(p[0], p[1], p[2], p[3]))
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }
}

fn alpha_u8(alpha: f64) -> u8 {
    if !alpha.is_finite() || alpha <= 0.0 {
        return 0;
    }
    alpha.round().min(255.0) as u8
}

fn blend_pixel(px: &mut [u8], color: Rgba8, a: u8, mode: BlendMode) {
    let src = [color.r, color.g, color.b];
    match mode {
        BlendMode::Blend => {
            for (d, s) in px.iter_mut().zip(src) {
                *d = lerp_u8(*d, s, a);
            }
            px[3] = add_sat_u8(px[3], mul_div255_u8(u16::from(255 - px[3]), u16::from(a)));
        }
        BlendMode::Add => {
            for (d, s) in px.iter_mut().zip(src) {
                *d = add_sat_u8(*d, mul_div255_u8(u16::from(s), u16::from(a)));
            }
        }
        BlendMode::Subtract => {
            for (d, s) in px.iter_mut().zip(src) {
                *d = sub_sat_u8(*d, mul_div255_u8(u16::from(s), u16::from(a)));
            }
        }
    }
}

impl Surface for Canvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn plot(&mut self, x: i64, y: i64, color: Rgba8, alpha: f64, mode: BlendMode) {
        let a = alpha_u8(alpha);
        if a == 0 {
            return;
        }
        let Some(i) = self.offset(x, y) else {
            return;
        };
        blend_pixel(&mut self.data[i..i + 4], color, a, mode);
    }

    fn fade(&mut self, color: Rgba8) {
        if color.a == 0 {
            return;
        }
        let row_bytes = self.width as usize * 4;
        self.data
            .par_chunks_mut(row_bytes * FADE_ROWS_PER_TASK)
            .for_each(|rows| {
                for px in rows.chunks_exact_mut(4) {
                    px[0] = lerp_u8(px[0], color.r, color.a);
                    px[1] = lerp_u8(px[1], color.g, color.a);
                    px[2] = lerp_u8(px[2], color.b, color.a);
                    px[3] = 255;
                }
            });
    }

    fn clear(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/canvas.rs"]
mod tests;
