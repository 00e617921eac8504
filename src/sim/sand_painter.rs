use std::sync::Arc;

use crate::config::SceneOptions;
use crate::foundation::core::{BlendMode, Point, Rgba8};
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::foundation::math::round_half_up;
use crate::foundation::random::{CosmeticRandom, SeededRandom};
use crate::palette::Palette;
use crate::render::canvas::Surface;

/// Entries in the sine lookup used to bend grain placement.
pub const SINE_TABLE_LEN: usize = 1000;

/// Alpha of the single pixel plotted at a stroke's near end.
const NEAR_POINT_ALPHA: f64 = 20.0;

/// Maximum per-stroke change of a painter's grain spread.
const GRAIN_JITTER: f64 = 0.05;

/// Read-only tables shared by every sand painter of a scene.
#[derive(Debug, PartialEq)]
pub struct SandLookup {
    grains: usize,
    alpha: Vec<f64>,
    sine: Vec<f64>,
}

impl SandLookup {
    /// Build the tables for `grains` grains per stroke.
    pub fn new(grains: usize) -> SubstrateResult<Self> {
        if grains <= 1 {
            return Err(SubstrateError::validation(format!(
                "sand painter needs more than one grain, got {grains}"
            )));
        }
        let alpha = (0..grains)
            .map(|i| (0.1 - i as f64 / grains as f64) * 2.0)
            .collect();
        let sine = (0..SINE_TABLE_LEN)
            .map(|i| (i as f64 / SINE_TABLE_LEN as f64).sin())
            .collect();
        Ok(Self {
            grains,
            alpha,
            sine,
        })
    }

    pub fn grains(&self) -> usize {
        self.grains
    }

    /// Alpha envelope for grain `i`, before scaling by the blend mode's peak.
    pub fn alpha(&self, i: usize) -> f64 {
        self.alpha[i]
    }

    pub fn sine(&self, i: usize) -> f64 {
        self.sine[i.min(SINE_TABLE_LEN - 1)]
    }
}

/// Host-side owner of the current [`SandLookup`].
///
/// Hands out the same table until the grain count changes.
#[derive(Debug, Default)]
pub struct SandLookupCache {
    current: Option<Arc<SandLookup>>,
}

impl SandLookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table for `grains`, rebuilt only when the grain count differs from the cached one.
    pub fn get(&mut self, grains: usize) -> SubstrateResult<Arc<SandLookup>> {
        if let Some(cur) = &self.current
            && cur.grains() == grains
        {
            return Ok(cur.clone());
        }
        let table = Arc::new(SandLookup::new(grains)?);
        tracing::debug!(grains, "rebuilt sand painter lookup tables");
        self.current = Some(table.clone());
        Ok(table)
    }
}

/// Stroke renderer owned by one crack.
///
/// Color and blend mode are fixed at construction; the grain spread wanders between strokes.
#[derive(Clone, Debug, PartialEq)]
pub struct SandPainter {
    color: Rgba8,
    mode: BlendMode,
    grain_distance: f64,
}

impl SandPainter {
    /// Pick color, initial spread and blend mode from the seeded stream.
    pub fn new(palette: &Palette, random: &mut SeededRandom, opts: &SceneOptions) -> Self {
        let color = palette.some_color(random);
        let grain_distance = random.next_range(0.001, 0.01);
        let mode = match (opts.blending_additive, opts.blending_subtractive) {
            (true, true) => {
                if random.next_float() > 0.5 {
                    BlendMode::Add
                } else {
                    BlendMode::Subtract
                }
            }
            (true, false) => BlendMode::Add,
            (false, true) => BlendMode::Subtract,
            (false, false) => BlendMode::Blend,
        };
        Self {
            color,
            mode,
            grain_distance,
        }
    }

    pub fn color(&self) -> Rgba8 {
        self.color
    }

    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    pub fn grain_distance(&self) -> f64 {
        self.grain_distance
    }

    /// Lay a fading line of grains from `near` toward `far`.
    ///
    /// Both points are in world coordinates; `origin` is the world pixel that maps to the
    /// surface's top-left corner.
    pub fn render(
        &mut self,
        surface: &mut impl Surface,
        lookup: &SandLookup,
        cosmetic: CosmeticRandom,
        origin: (i64, i64),
        far: Point,
        near: Point,
    ) {
        let to_surface = |p: Point| {
            (
                round_half_up(p.x) as i64 - origin.0,
                round_half_up(p.y) as i64 - origin.1,
            )
        };

        let (nx, ny) = to_surface(near);
        surface.plot(nx, ny, self.color, NEAR_POINT_ALPHA, self.mode);

        // Stroke-count dependent, so it must never draw from the seeded stream.
        self.grain_distance += cosmetic.range(-GRAIN_JITTER, GRAIN_JITTER);
        self.grain_distance = self.grain_distance.clamp(0.0, 1.0);

        let grains = lookup.grains();
        let w = self.grain_distance / (grains - 1) as f64;
        let max_alpha = self.mode.max_alpha();
        for i in 0..grains {
            let alpha = lookup.alpha(i);
            if alpha <= 0.0 {
                continue;
            }
            let sine = lookup.sine(round_half_up(i as f64 * w * 999.0) as usize);
            let p = Point::new(
                near.x + (far.x - near.x) * sine,
                near.y + (far.y - near.y) * sine,
            );
            let (x, y) = to_surface(p);
            surface.plot(x, y, self.color, alpha * max_alpha, self.mode);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/sand_painter.rs"]
mod tests;
