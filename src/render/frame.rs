use crate::foundation::core::WorldSize;
use crate::foundation::error::{SubstrateError, SubstrateResult};
use crate::render::canvas::{Canvas, Surface};

/// A full composed frame as straight-alpha RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

/// One replica's rendered band, positioned in world pixels.
#[derive(Clone, Debug)]
pub struct ReplicaSlice {
    /// Replica that produced the band.
    pub replica: usize,
    /// Pixel column of the band's left edge.
    pub left: u32,
    /// Pixel row of the band's top edge.
    pub top: u32,
    /// The replica's surface.
    pub canvas: Canvas,
}

/// Stitch replica bands into one frame.
///
/// Bands are written in replica order; pixels falling outside the world are dropped.
pub fn compose_slices(world: WorldSize, slices: &[ReplicaSlice]) -> SubstrateResult<FrameRGBA> {
    world.validate()?;
    let row_bytes = world.w as usize * 4;
    let mut data = vec![0u8; row_bytes * world.h as usize];

    let mut ordered: Vec<&ReplicaSlice> = slices.iter().collect();
    ordered.sort_by_key(|s| s.replica);

    for slice in ordered {
        if slice.left >= world.w || slice.top >= world.h {
            return Err(SubstrateError::simulation(format!(
                "replica {} slice origin ({}, {}) lies outside the {}x{} world",
                slice.replica, slice.left, slice.top, world.w, world.h
            )));
        }
        let cols = slice.canvas.width().min(world.w - slice.left) as usize;
        let rows = slice.canvas.height().min(world.h - slice.top) as usize;
        let src_row_bytes = slice.canvas.width() as usize * 4;
        let src = slice.canvas.data();
        for row in 0..rows {
            let dst_start = (slice.top as usize + row) * row_bytes + slice.left as usize * 4;
            let src_start = row * src_row_bytes;
            data[dst_start..dst_start + cols * 4]
                .copy_from_slice(&src[src_start..src_start + cols * 4]);
        }
    }

    Ok(FrameRGBA {
        width: world.w,
        height: world.h,
        data,
    })
}
