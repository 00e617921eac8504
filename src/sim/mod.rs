//! Crack growth: grid, cracks, sand painters and the per-replica engine.

pub mod crack;
pub mod engine;
pub mod grid;
pub mod sand_painter;
