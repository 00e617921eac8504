//! Tunable parameters shared by the host and every replica.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Rgba8, WorldSize};
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::foundation::random::seed_from_str;

/// Hard ceiling on the number of replicas, calibrated or not.
pub const ABSOLUTE_MAX_WORKERS: usize = 15;

/// Phrase the default seed is derived from.
pub const DEFAULT_SEED_PHRASE: &str = "Substrate by Jared Tarbell";

/// Growth iterations per tick while calibrating.
pub const CALIBRATION_ITERATIONS_PER_UPDATE: u32 = 200;

/// Scene-wide options.
///
/// Every replica of a scene receives the same snapshot; only the viewport differs between them.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    /// Sand painters add light. With both flags set each painter flips a coin.
    pub blending_additive: bool,
    /// Sand painters remove light.
    pub blending_subtractive: bool,
    /// Dark background and fade color instead of light.
    pub dark_mode: bool,
    /// Background/fade color in dark mode.
    pub canvas_color_dark: Rgba8,
    /// Background/fade color in light mode.
    pub canvas_color_light: Rgba8,
    /// Chance that a new crack curves instead of running straight.
    pub curve_chance: f64,
    /// Lower bound of the curvature rate, degrees per step.
    pub curve_min: f64,
    /// Upper bound of the curvature rate, degrees per step.
    pub curve_max: f64,
    /// Radius of the jitter applied to the sampled cell position.
    pub fuzziness: f64,
    /// Growth iterations per tick outside calibration.
    pub iterations_per_update: u32,
    /// Jitter the heading on every step.
    pub modulate_path: bool,
    /// Amount of heading jitter when `modulate_path` is set.
    pub modulate_path_amount: f64,
    /// Palette of the first scene.
    pub palette_index: usize,
    /// Pixels along the world edge in which cracks are not painted.
    pub padding: f64,
    /// Preferred angle between a crack and its parent. 90 is the classic look.
    pub prefer_direction: f64,
    /// Restrict non-perpendicular spawns to two of the four branches.
    pub prefer_single_angle: bool,
    /// Distance a new crack is pushed away from its parent cell.
    pub spawn_distance: f64,
    /// `prefer_direction` value that selects perpendicular spawn mode.
    pub spawn_perpendicular: f64,
    /// Paint the space next to cracks.
    pub sand_painter_active: bool,
    /// Grains laid down per sand painter stroke. Must be > 1.
    pub sand_painter_grains: usize,
    /// World size in cells.
    pub world: WorldSize,
    /// Seed of the first scene.
    pub seed: u64,
    /// Verbose diagnostics.
    pub dev_mode: bool,
    /// Fixed replica count. When unset the stored calibration is used, and a first run without
    /// one calibrates.
    pub worker_count: Option<usize>,
    /// Run calibration scenes before regular scenes.
    pub calibration_required: bool,
    /// Stop calibrating as soon as a run is slower than the one before.
    pub calibration_early_exit: bool,
    /// Largest replica count calibration may try.
    pub calibration_max_workers: usize,
    /// Pause between a scene's fade-out and the next scene, in milliseconds.
    pub transition_delay_ms: u64,
    /// Ticks spent fading after a fade request.
    pub fade_ticks: u32,
    /// How long the host waits for all replicas to finish a scene, in milliseconds.
    pub finish_timeout_ms: u64,
    /// Override the number of cracks spawned at scene start.
    pub cracks_initial: Option<usize>,
    /// Override the concurrent crack cap.
    pub cracks_max: Option<usize>,
    /// Override the total crack budget of a scene.
    pub max_cracking: Option<usize>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            blending_additive: true,
            blending_subtractive: false,
            dark_mode: true,
            canvas_color_dark: Rgba8::new(0, 0, 0, 5),
            canvas_color_light: Rgba8::new(255, 255, 255, 5),
            curve_chance: 0.01,
            curve_min: 0.01,
            curve_max: 0.02,
            fuzziness: 0.0,
            iterations_per_update: 4,
            modulate_path: false,
            modulate_path_amount: 0.05,
            palette_index: 0,
            padding: 20.0,
            prefer_direction: 90.0,
            prefer_single_angle: false,
            spawn_distance: 0.61,
            spawn_perpendicular: 90.0,
            sand_painter_active: true,
            sand_painter_grains: 64,
            world: WorldSize { w: 512, h: 512 },
            seed: seed_from_str(DEFAULT_SEED_PHRASE),
            dev_mode: false,
            worker_count: None,
            calibration_required: false,
            calibration_early_exit: true,
            calibration_max_workers: ABSOLUTE_MAX_WORKERS,
            transition_delay_ms: 4000,
            fade_ticks: 240,
            finish_timeout_ms: 10 * 60 * 1000,
            cracks_initial: None,
            cracks_max: None,
            max_cracking: None,
        }
    }
}

impl SceneOptions {
    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> SubstrateResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read options '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> SubstrateResult<Self> {
        let opts: SceneOptions =
            serde_json::from_str(text).map_err(|e| SubstrateError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Fail fast on values that would produce NaN or stall the simulation.
    pub fn validate(&self) -> SubstrateResult<()> {
        self.world.validate()?;
        if self.sand_painter_grains <= 1 {
            return Err(SubstrateError::validation(
                "sand_painter_grains must be > 1",
            ));
        }
        let finite = [
            ("curve_chance", self.curve_chance),
            ("curve_min", self.curve_min),
            ("curve_max", self.curve_max),
            ("fuzziness", self.fuzziness),
            ("modulate_path_amount", self.modulate_path_amount),
            ("padding", self.padding),
            ("prefer_direction", self.prefer_direction),
            ("spawn_distance", self.spawn_distance),
            ("spawn_perpendicular", self.spawn_perpendicular),
        ];
        for (name, v) in finite {
            if !v.is_finite() {
                return Err(SubstrateError::validation(format!("{name} must be finite")));
            }
        }
        for (name, v) in [
            ("curve_chance", self.curve_chance),
            ("fuzziness", self.fuzziness),
            ("modulate_path_amount", self.modulate_path_amount),
            ("padding", self.padding),
            ("spawn_distance", self.spawn_distance),
        ] {
            if v < 0.0 {
                return Err(SubstrateError::validation(format!("{name} must be >= 0")));
            }
        }
        if self.curve_min > self.curve_max {
            return Err(SubstrateError::validation("curve_min must be <= curve_max"));
        }
        if self.iterations_per_update == 0 {
            return Err(SubstrateError::validation(
                "iterations_per_update must be >= 1",
            ));
        }
        if let Some(count) = self.worker_count
            && (count == 0 || count > ABSOLUTE_MAX_WORKERS)
        {
            return Err(SubstrateError::validation(format!(
                "worker_count must be in 1..={ABSOLUTE_MAX_WORKERS}, got {count}"
            )));
        }
        if self.calibration_max_workers == 0 || self.calibration_max_workers > ABSOLUTE_MAX_WORKERS
        {
            return Err(SubstrateError::validation(format!(
                "calibration_max_workers must be in 1..={ABSOLUTE_MAX_WORKERS}, got {}",
                self.calibration_max_workers
            )));
        }
        if self.cracks_max == Some(0) || self.max_cracking == Some(0) {
            return Err(SubstrateError::validation(
                "cracks_max and max_cracking overrides must be >= 1",
            ));
        }
        Ok(())
    }

    /// Background and fade color for the current mode.
    pub fn background(&self) -> Rgba8 {
        if self.dark_mode {
            self.canvas_color_dark
        } else {
            self.canvas_color_light
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
