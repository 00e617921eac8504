use crate::foundation::core::WorldSize;
use crate::foundation::math::round_half_up;

/// Value of a cell no crack has claimed yet.
pub const EMPTY: i32 = 10001;

/// Cells storing a value below this carry a real direction.
pub const CLAIMED_BELOW: i32 = 10000;

/// Dense per-cell record of the direction (degrees) a crack left behind.
///
/// Within a scene a cell goes from [`EMPTY`] to a direction at most once in the sense that it
/// never becomes empty again; later cracks may overwrite the direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    world: WorldSize,
    cells: Vec<i32>,
}

impl Grid {
    /// Allocate an all-empty grid.
    pub fn new(world: WorldSize) -> Self {
        Self {
            world,
            cells: vec![EMPTY; world.area()],
        }
    }

    /// Mark every cell empty.
    pub fn reset(&mut self) {
        self.cells.fill(EMPTY);
    }

    pub fn world(&self) -> WorldSize {
        self.world
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw cell values, row-major.
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn get(&self, index: usize) -> i32 {
        self.cells[index]
    }

    /// Value at `(x, y)`, or `None` outside the world.
    pub fn at(&self, x: i64, y: i64) -> Option<i32> {
        self.world.index_of(x, y).map(|i| self.cells[i])
    }

    /// `true` when the cell carries a direction.
    pub fn is_claimed(&self, index: usize) -> bool {
        self.cells[index] < CLAIMED_BELOW
    }

    /// Store `direction` (rounded to whole degrees) in the cell at `index`.
    ///
    /// Directions are unbounded, but a value that would collide with the sentinel range is folded
    /// back into `[0, 360)` so a claimed cell can never read as empty.
    pub fn claim(&mut self, index: usize, direction: f64) {
        let mut v = round_half_up(direction);
        if !(v.abs() < f64::from(CLAIMED_BELOW)) {
            v = round_half_up(direction.rem_euclid(360.0));
        }
        self.cells[index] = v as i32;
    }

    /// Number of cells carrying a direction.
    pub fn claimed_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v < CLAIMED_BELOW).count()
    }
}
