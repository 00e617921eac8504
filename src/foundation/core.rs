use crate::foundation::error::{SubstrateError, SubstrateResult};

pub use kurbo::Point;

/// Simulated world dimensions in cells (one cell per output pixel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct WorldSize {
    /// Width in cells.
    pub w: u32,
    /// Height in cells.
    pub h: u32,
}

impl WorldSize {
    /// Create a validated world size. Both dimensions must be non-zero.
    pub fn new(w: u32, h: u32) -> SubstrateResult<Self> {
        let size = Self { w, h };
        size.validate()?;
        Ok(size)
    }

    /// Reject empty worlds.
    pub fn validate(self) -> SubstrateResult<()> {
        if self.w == 0 || self.h == 0 {
            return Err(SubstrateError::validation(format!(
                "world size must be non-zero, got {}x{}",
                self.w, self.h
            )));
        }
        Ok(())
    }

    /// Number of cells in the world.
    pub fn area(self) -> usize {
        (self.w as usize).saturating_mul(self.h as usize)
    }

    /// Return `true` when `(x, y)` addresses a cell of this world.
    pub fn contains(self, x: i64, y: i64) -> bool {
        0 <= x && x < i64::from(self.w) && 0 <= y && y < i64::from(self.h)
    }

    /// Flat row-major index of an in-bounds cell.
    pub fn index_of(self, x: i64, y: i64) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        Some(y as usize * self.w as usize + x as usize)
    }

    /// Cell coordinates of a flat index.
    pub fn coords_of(self, index: usize) -> (u32, u32) {
        let w = self.w as usize;
        ((index % w) as u32, (index / w) as u32)
    }
}

/// A rectangular slice of the world, expressed as fractions of world size.
///
/// `x`/`y` are the origin and `w`/`h` the extent, all in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Viewport {
    /// Left edge as a fraction of world width.
    pub x: f64,
    /// Top edge as a fraction of world height.
    pub y: f64,
    /// Width as a fraction of world width.
    pub w: f64,
    /// Height as a fraction of world height.
    pub h: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

impl Viewport {
    /// The whole world.
    pub const FULL: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// Check that the slice lies inside the unit square and is not empty.
    pub fn validate(self) -> SubstrateResult<()> {
        let fields = [self.x, self.y, self.w, self.h];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(SubstrateError::validation("viewport fractions must be finite"));
        }
        if self.x < 0.0 || self.y < 0.0 || self.w <= 0.0 || self.h <= 0.0 {
            return Err(SubstrateError::validation(
                "viewport origin must be >= 0 and extent > 0",
            ));
        }
        // Slices are built from rounded fractions; allow that rounding to overshoot slightly.
        if self.x + self.w > 1.0 + 1e-3 || self.y + self.h > 1.0 + 1e-3 {
            return Err(SubstrateError::validation(
                "viewport must lie within the world",
            ));
        }
        Ok(())
    }

    /// Right edge as a fraction of world width.
    pub fn right(self) -> f64 {
        self.x + self.w
    }

    /// Bottom edge as a fraction of world height.
    pub fn bottom(self) -> f64 {
        self.y + self.h
    }

    /// Pixel origin of the slice within the world.
    pub fn origin_px(self, world: WorldSize) -> (i64, i64) {
        (
            (self.x * f64::from(world.w)).floor() as i64,
            (self.y * f64::from(world.h)).floor() as i64,
        )
    }

    /// Pixel dimensions of the surface a replica needs to cover this slice.
    ///
    /// Adjacent bands produced by [`Viewport::vertical_bands`] tile the world exactly.
    pub fn surface_size(self, world: WorldSize) -> (u32, u32) {
        let (left, top) = self.origin_px(world);
        let right = ((self.right() * f64::from(world.w)).floor() as i64).min(i64::from(world.w));
        let bottom = ((self.bottom() * f64::from(world.h)).floor() as i64).min(i64::from(world.h));
        (
            (right - left).max(1) as u32,
            (bottom - top).max(1) as u32,
        )
    }

    /// Split the world into `count` contiguous vertical bands.
    ///
    /// Band edges are rounded to three decimal places; the last band always ends at `1.0`.
    pub fn vertical_bands(count: usize) -> Vec<Viewport> {
        let count = count.max(1);
        let step = 1.0 / count as f64;
        (0..count)
            .map(|i| {
                let x = crate::foundation::math::round_to(i as f64 * step, 3);
                let right = if i + 1 == count {
                    1.0
                } else {
                    crate::foundation::math::round_to((i + 1) as f64 * step, 3)
                };
                Viewport {
                    x,
                    y: 0.0,
                    w: right - x,
                    h: 1.0,
                }
            })
            .collect()
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Same color with a different alpha.
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// How a plotted grain combines with the pixel underneath.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Source-over alpha blending.
    Blend,
    /// Saturating additive blending.
    Add,
    /// Saturating subtractive blending.
    Subtract,
}

impl BlendMode {
    /// Peak grain alpha used by sand painters in this mode.
    pub fn max_alpha(self) -> f64 {
        match self {
            BlendMode::Add | BlendMode::Subtract => 128.0,
            BlendMode::Blend => 255.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
