//! CPU pixel surfaces and frame composition.

/// Blended pixel surface.
pub mod canvas;
/// Replica band stitching.
pub mod frame;
