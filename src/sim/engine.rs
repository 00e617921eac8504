use std::sync::Arc;
use std::time::SystemTime;

use crate::config::SceneOptions;
use crate::foundation::core::{Viewport, WorldSize};
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::foundation::math::round_half_up;
use crate::foundation::random::{CosmeticRandom, SeededRandom};
use crate::palette::Palette;
use crate::render::canvas::{Canvas, Surface};
use crate::render::frame::ReplicaSlice;
use crate::sim::crack::{Crack, Field, SEED_COUNT, StepOutcome};
use crate::sim::grid::Grid;
use crate::sim::sand_painter::SandLookup;

/// Everything one replica needs to run a scene.
#[derive(Clone, Debug)]
pub struct ReplicaConfig {
    /// Replica id, also its position in slice order.
    pub replica: usize,
    /// Scene number, echoed in every replica event.
    pub scene: u64,
    /// Part of the world this replica paints.
    pub viewport: Viewport,
    pub seed: u64,
    pub palette_index: usize,
    pub iterations_per_update: u32,
    pub options: Arc<SceneOptions>,
    /// Grain tables shared by every painter; must match `options.sand_painter_grains`.
    pub lookup: Arc<SandLookup>,
}

impl ReplicaConfig {
    /// Same scene, painted by `replica` into `viewport`.
    pub fn for_slice(&self, replica: usize, viewport: Viewport) -> Self {
        Self {
            replica,
            viewport,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> SubstrateResult<()> {
        self.options.validate()?;
        self.viewport.validate()?;
        if self.iterations_per_update == 0 {
            return Err(SubstrateError::validation(
                "iterations_per_update must be >= 1",
            ));
        }
        if self.lookup.grains() != self.options.sand_painter_grains {
            return Err(SubstrateError::validation(format!(
                "grain lookup built for {} grains, options ask for {}",
                self.lookup.grains(),
                self.options.sand_painter_grains
            )));
        }
        Ok(())
    }
}

/// Size-dependent crack limits of a scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CrackBudget {
    /// Cracks spawned by `start`.
    pub cracks_initial: usize,
    /// Cracks alive at once.
    pub cracks_max: usize,
    /// Cracks spawned over the whole scene, respawns included.
    pub max_cracking: usize,
}

impl CrackBudget {
    /// Derive limits from the world area, honoring explicit overrides.
    pub fn derive(world: WorldSize, opts: &SceneOptions) -> Self {
        let area = world.area();
        let max_cracking = opts
            .max_cracking
            .unwrap_or(((area as f64).sqrt() * 10.0).floor() as usize)
            .max(1);
        let cracks_max = opts
            .cracks_max
            .unwrap_or((area / 5000).clamp(150, 550))
            .max(1);
        let cracks_initial = opts
            .cracks_initial
            .unwrap_or(max_cracking / 1000)
            .max(1)
            .min(cracks_max)
            .min(max_cracking);
        Self {
            cracks_initial,
            cracks_max,
            max_cracking,
        }
    }
}

/// Live cracks of one engine, bounded by `cracks_max`.
#[derive(Clone, Debug, Default)]
pub struct CrackPool {
    cracks: Vec<Crack>,
    capacity: usize,
}

impl CrackPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cracks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drop every crack and change the capacity.
    pub fn reset(&mut self, capacity: usize) {
        self.cracks.clear();
        self.cracks.reserve(capacity);
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.cracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cracks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.cracks.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a crack unless the pool is full. Returns whether it was added.
    pub fn push(&mut self, crack: Crack) -> bool {
        if self.is_full() {
            return false;
        }
        self.cracks.push(crack);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Crack> {
        self.cracks.iter()
    }
}

/// Lifecycle notifications emitted by an engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineSignal {
    /// `start` completed.
    Started { replica: usize },
    /// The crack budget ran out. Emitted once per scene.
    SceneFinished {
        replica: usize,
        timestamp: SystemTime,
    },
}

/// Receiver of engine signals; the replica thread forwards them to the host.
pub trait EngineHost {
    fn signal(&mut self, signal: EngineSignal);
}

impl EngineHost for Vec<EngineSignal> {
    fn signal(&mut self, signal: EngineSignal) {
        self.push(signal);
    }
}

/// One full-world simulation that paints a single viewport.
///
/// Every engine of a scene computes identical growth; only the pixels it plots differ.
#[derive(Debug)]
pub struct Engine {
    config: ReplicaConfig,
    budget: CrackBudget,
    field: Field,
    pool: CrackPool,
    palette: Palette,
    canvas: Canvas,
    cosmetic: CosmeticRandom,
    total_spawned: usize,
    started: bool,
    paused: bool,
    finished: bool,
    fade_remaining: u32,
}

impl Engine {
    pub fn new(config: ReplicaConfig) -> SubstrateResult<Self> {
        config.validate()?;
        let world = config.options.world;
        let (w, h) = config.viewport.surface_size(world);
        let budget = CrackBudget::derive(world, &config.options);
        Ok(Self {
            budget,
            field: Field {
                grid: Grid::new(world),
                random: SeededRandom::new(config.seed),
                seeds: Vec::with_capacity(SEED_COUNT),
            },
            pool: CrackPool::with_capacity(budget.cracks_max),
            palette: Palette::new(config.palette_index),
            canvas: Canvas::new(w, h)?,
            cosmetic: CosmeticRandom,
            total_spawned: 0,
            started: false,
            paused: false,
            finished: false,
            fade_remaining: 0,
            config,
        })
    }

    /// Apply a new configuration and reset all scene state. The scene does not run until `start`.
    pub fn configure(&mut self, config: ReplicaConfig) -> SubstrateResult<()> {
        config.validate()?;
        let world = config.options.world;
        if self.field.grid.world() != world {
            self.field.grid = Grid::new(world);
        } else {
            self.field.grid.reset();
        }
        let (w, h) = config.viewport.surface_size(world);
        if self.canvas.width() != w || self.canvas.height() != h {
            self.canvas = Canvas::new(w, h)?;
        }
        self.budget = CrackBudget::derive(world, &config.options);
        self.field.random = SeededRandom::new(config.seed);
        self.field.seeds.clear();
        self.pool.reset(self.budget.cracks_max);
        self.palette = Palette::new(config.palette_index);
        self.total_spawned = 0;
        self.started = false;
        self.paused = false;
        self.finished = false;
        self.fade_remaining = 0;
        self.config = config;

        tracing::debug!(
            replica = self.config.replica,
            seed = self.config.seed,
            cracks_max = self.budget.cracks_max,
            max_cracking = self.budget.max_cracking,
            "engine configured"
        );
        Ok(())
    }

    /// Reset the world and spawn the initial cracks.
    #[tracing::instrument(skip(self, host), fields(replica = self.config.replica))]
    pub fn start(&mut self, host: &mut impl EngineHost) {
        let opts = Arc::clone(&self.config.options);
        self.field.random = SeededRandom::new(self.config.seed);
        self.palette = Palette::new(self.config.palette_index);
        self.started = true;
        self.paused = false;
        self.finished = false;
        self.fade_remaining = 0;
        self.total_spawned = 0;

        self.canvas.clear(opts.background().with_alpha(255));
        self.field.grid.reset();

        self.field.seeds.clear();
        let area = self.field.grid.len();
        for _ in 0..SEED_COUNT {
            let index = self.field.random.next_index(area);
            let angle = round_half_up(self.field.random.next_float() * 360.0);
            self.field.grid.claim(index, angle);
            self.field.seeds.push(index);
        }

        self.pool.reset(self.budget.cracks_max);
        for _ in 0..self.budget.cracks_initial {
            self.spawn_crack(host, true);
        }

        tracing::debug!(
            seed = self.config.seed,
            palette = self.palette.name(),
            cracks = self.pool.len(),
            "scene started"
        );
        host.signal(EngineSignal::Started {
            replica: self.config.replica,
        });
    }

    /// Advance the scene by one nominal frame.
    pub fn tick(&mut self, host: &mut impl EngineHost) {
        if self.fade_remaining > 0 {
            self.canvas.fade(self.config.options.background());
            self.fade_remaining -= 1;
            return;
        }
        if !self.started || self.paused || self.finished {
            return;
        }

        let opts = Arc::clone(&self.config.options);
        let lookup = Arc::clone(&self.config.lookup);
        let bounds = PaintBounds::new(self.config.viewport, opts.world, opts.padding);
        let origin = self.config.viewport.origin_px(opts.world);

        let mut to_crack = 0usize;
        for _ in 0..self.config.iterations_per_update {
            for crack in self.pool.cracks.iter_mut() {
                if crack.step(&mut self.field, &opts) == StepOutcome::Respawned {
                    to_crack += 1;
                    continue;
                }
                if bounds.contains(crack.position().x, crack.position().y) {
                    crack.draw(
                        &self.field.grid,
                        &mut self.canvas,
                        &lookup,
                        self.cosmetic,
                        origin,
                    );
                }
            }
        }

        while to_crack > 0 {
            if self.spawn_crack(host, false) {
                break;
            }
            to_crack -= 1;
        }
    }

    /// Spend one unit of the crack budget. Returns `true` once the scene is over.
    pub fn spawn_crack(&mut self, host: &mut impl EngineHost, initial: bool) -> bool {
        if self.paused || self.finished {
            return true;
        }
        if self.total_spawned >= self.budget.max_cracking {
            self.finished = true;
            tracing::debug!(
                replica = self.config.replica,
                total = self.total_spawned,
                "crack budget exhausted"
            );
            host.signal(EngineSignal::SceneFinished {
                replica: self.config.replica,
                timestamp: SystemTime::now(),
            });
            return true;
        }

        self.total_spawned += 1;
        if !self.pool.is_full() {
            let crack = Crack::spawn(
                &mut self.field,
                &self.config.options,
                &self.palette,
                initial,
            );
            self.pool.push(crack);
        }
        false
    }

    /// Spend the next `fade_ticks` ticks fading toward the background.
    pub fn fade_out(&mut self) {
        self.fade_remaining = self.config.options.fade_ticks;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Copy of the painted surface, positioned in world pixels.
    pub fn snapshot(&self) -> ReplicaSlice {
        let (left, top) = self.config.viewport.origin_px(self.config.options.world);
        ReplicaSlice {
            replica: self.config.replica,
            left: left.max(0) as u32,
            top: top.max(0) as u32,
            canvas: self.canvas.clone(),
        }
    }

    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    pub fn budget(&self) -> CrackBudget {
        self.budget
    }

    pub fn grid(&self) -> &Grid {
        &self.field.grid
    }

    pub fn seeds(&self) -> &[usize] {
        &self.field.seeds
    }

    pub fn cracks(&self) -> &CrackPool {
        &self.pool
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Cracks spawned so far this scene.
    pub fn total_spawned(&self) -> usize {
        self.total_spawned
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_fading(&self) -> bool {
        self.fade_remaining > 0
    }

    /// `true` while `tick` has work to do.
    pub fn is_active(&self) -> bool {
        self.is_fading() || (self.started && !self.paused && !self.finished)
    }
}

/// World-space rectangle in which a replica paints cracks.
///
/// Padding applies only along the outer world edges.
#[derive(Clone, Copy, Debug, PartialEq)]
struct PaintBounds {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl PaintBounds {
    fn new(viewport: Viewport, world: WorldSize, padding: f64) -> Self {
        let (ww, wh) = (f64::from(world.w), f64::from(world.h));
        let at_start = |v: f64| if v <= 0.0 { padding } else { 0.0 };
        let at_end = |v: f64| if v >= 1.0 - 1e-9 { padding } else { 0.0 };
        Self {
            left: viewport.x * ww + at_start(viewport.x),
            top: viewport.y * wh + at_start(viewport.y),
            right: viewport.right() * ww - at_end(viewport.right()),
            bottom: viewport.bottom() * wh - at_end(viewport.bottom()),
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        self.left < x && x < self.right && self.top < y && y < self.bottom
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/engine.rs"]
mod tests;
