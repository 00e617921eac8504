use crate::config::SceneOptions;
use crate::foundation::core::Point;
use crate::foundation::math::{cos_degrees, round_half_up, sin_degrees};
use crate::foundation::random::{CosmeticRandom, SeededRandom};
use crate::palette::Palette;
use crate::render::canvas::Surface;
use crate::sim::grid::{EMPTY, Grid};
use crate::sim::sand_painter::{SandLookup, SandPainter};

/// Distance a crack advances per nominal 60 fps frame, in cells.
///
/// Growth never looks at measured frame time, so replicas and frame rates cannot diverge.
pub const STEP_LENGTH: f64 = 0.1;

/// A candidate cell whose direction differs by less than this is claimed.
pub const CLAIM_BELOW_DEG: f64 = 2.0;

/// A candidate cell whose direction differs by at least this is a collision.
pub const COLLIDE_FROM_DEG: f64 = 5.0;

/// Perpendicular step used when scanning for open space beside a crack.
const OPEN_SPACE_STEP: f64 = 0.81;

/// Number of privileged start cells seeded at scene start.
pub const SEED_COUNT: usize = 16;

/// Everything a crack reads and writes while growing.
///
/// Owned by one engine; the seeded stream inside it is consumed only by growth decisions.
#[derive(Clone, Debug)]
pub struct Field {
    pub grid: Grid,
    pub random: SeededRandom,
    pub seeds: Vec<usize>,
}

impl Field {
    /// Uniformly sample the grid until a claimed cell is found, giving up after a bounded number
    /// of draws.
    fn sample_claimed_cell(&mut self) -> Option<usize> {
        let len = self.grid.len();
        let attempts = len.saturating_mul(8).max(64);
        for _ in 0..attempts {
            let index = self.random.next_index(len);
            if self.grid.is_claimed(index) {
                return Some(index);
            }
        }
        None
    }
}

/// Result of advancing a crack by one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The crack claimed its next cell.
    Advanced,
    /// The crack moved without claiming: near-parallel neighbor, or waiting for a start cell.
    Stalled,
    /// The crack left the world or hit a differently oriented crack and was re-seeded.
    Respawned,
}

/// A random-walk entity that etches directions into the grid.
#[derive(Clone, Debug)]
pub struct Crack {
    position: Point,
    direction: f64,
    direction_step: f64,
    active: bool,
    painter: Option<SandPainter>,
}

impl Crack {
    /// Create a crack and place it next to an existing one.
    ///
    /// `initial` cracks start from the privileged seed cells. When no start cell can be found the
    /// crack is created dormant and keeps looking on later steps.
    pub fn spawn(field: &mut Field, opts: &SceneOptions, palette: &Palette, initial: bool) -> Self {
        let mut direction_step = 0.0;
        if field.random.next_float() < opts.curve_chance {
            direction_step = field.random.next_range(opts.curve_min, opts.curve_max)
                * if field.random.next_boolean() { 1.0 } else { -1.0 };
        }

        let mut crack = Self {
            position: Point::ZERO,
            direction: 0.0,
            direction_step,
            active: false,
            painter: None,
        };
        crack.find_start(field, opts, initial);

        if opts.sand_painter_active {
            crack.painter = Some(SandPainter::new(palette, &mut field.random, opts));
        }
        crack
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Current heading in degrees.
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// Curvature rate in degrees per step.
    pub fn direction_step(&self) -> f64 {
        self.direction_step
    }

    /// `false` while the crack is waiting for a start cell.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn painter(&self) -> Option<&SandPainter> {
        self.painter.as_ref()
    }

    /// Re-seed this crack beside an existing claimed cell. Returns `false` when no cell was found.
    pub fn find_start(&mut self, field: &mut Field, opts: &SceneOptions, initial: bool) -> bool {
        let index = if initial {
            if field.seeds.is_empty() {
                None
            } else {
                let pick = field.random.next_index(field.seeds.len());
                Some(field.seeds[pick])
            }
        } else {
            field.sample_claimed_cell()
        };
        let Some(index) = index else {
            self.active = false;
            return false;
        };

        let direction = f64::from(field.grid.get(index))
            + branch_offset(&mut field.random, opts);
        let (px, py) = field.grid.world().coords_of(index);
        self.start_at(Point::new(f64::from(px), f64::from(py)), direction, opts);
        true
    }

    fn start_at(&mut self, cell: Point, direction: f64, opts: &SceneOptions) {
        self.direction = direction;
        self.position = Point::new(
            cell.x + opts.spawn_distance * cos_degrees(direction),
            cell.y + opts.spawn_distance * sin_degrees(direction),
        );
        self.active = true;
    }

    /// Advance one nominal step and settle the candidate cell.
    pub fn step(&mut self, field: &mut Field, opts: &SceneOptions) -> StepOutcome {
        if !self.active {
            self.find_start(field, opts, false);
            return StepOutcome::Stalled;
        }

        self.position.x += cos_degrees(self.direction) * STEP_LENGTH;
        self.position.y += sin_degrees(self.direction) * STEP_LENGTH;

        if opts.modulate_path {
            self.direction += self.direction_step
                + field
                    .random
                    .next_range(-opts.modulate_path_amount, opts.modulate_path_amount)
                    * 10.0;
        } else {
            self.direction += self.direction_step;
        }

        let mut cx = self.position.x;
        let mut cy = self.position.y;
        if opts.fuzziness > 0.0 {
            cx += field.random.next_range(-opts.fuzziness, opts.fuzziness);
            cy += field.random.next_range(-opts.fuzziness, opts.fuzziness);
        }

        let world = field.grid.world();
        let Some(index) = world.index_of(round_half_up(cx) as i64, round_half_up(cy) as i64)
        else {
            self.find_start(field, opts, false);
            return StepOutcome::Respawned;
        };

        let cell = field.grid.get(index);
        if cell == EMPTY {
            field.grid.claim(index, self.direction);
            return StepOutcome::Advanced;
        }

        let diff = (f64::from(cell) - self.direction).abs();
        if diff < CLAIM_BELOW_DEG {
            field.grid.claim(index, self.direction);
            StepOutcome::Advanced
        } else if diff >= COLLIDE_FROM_DEG {
            self.find_start(field, opts, false);
            StepOutcome::Respawned
        } else {
            StepOutcome::Stalled
        }
    }

    /// Far end of the open space beside the crack.
    ///
    /// Walks perpendicular to the heading until the next cell is outside the world or claimed.
    pub fn open_space_extent(&self, grid: &Grid) -> Point {
        let t = self.direction.to_radians();
        let (dx, dy) = (OPEN_SPACE_STEP * t.sin(), -OPEN_SPACE_STEP * t.cos());
        let mut r = self.position;
        loop {
            r.x += dx;
            r.y += dy;
            match grid.at(round_half_up(r.x) as i64, round_half_up(r.y) as i64) {
                Some(EMPTY) => continue,
                _ => return r,
            }
        }
    }

    /// Paint the open space beside the crack.
    pub fn draw(
        &mut self,
        grid: &Grid,
        surface: &mut impl Surface,
        lookup: &SandLookup,
        cosmetic: CosmeticRandom,
        origin: (i64, i64),
    ) {
        if !self.active || self.painter.is_none() {
            return;
        }
        let far = self.open_space_extent(grid);
        let near = self.position;
        if let Some(painter) = self.painter.as_mut() {
            painter.render(surface, lookup, cosmetic, origin, far, near);
        }
    }
}

fn jitter(random: &mut SeededRandom) -> f64 {
    random.next_range(-2.0, 2.0).trunc()
}

/// Heading offset of a new crack relative to the cell it starts from.
fn branch_offset(random: &mut SeededRandom, opts: &SceneOptions) -> f64 {
    if opts.prefer_direction == opts.spawn_perpendicular {
        return if random.next_float() < 0.5 {
            -(90.0 + jitter(random))
        } else {
            90.0 + jitter(random)
        };
    }

    let prefer = opts.prefer_direction;
    let r = random.next_float();
    if r < 0.25 && !opts.prefer_single_angle {
        -(prefer + 90.0 + jitter(random))
    } else if r < 0.5 {
        -(prefer + jitter(random))
    } else if r < 0.75 && !opts.prefer_single_angle {
        prefer + jitter(random)
    } else {
        prefer + 90.0 + jitter(random)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sim/crack.rs"]
mod tests;
