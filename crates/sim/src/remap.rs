//! Vertex to oscillator index remap.
//!
//! Vertex `i` of `V` gets texture coordinate `((i + 0.5) / V, 0.5)` and reads
//! oscillator slot `floor(u * N)`. With `V == N` every vertex owns exactly one
//! oscillator; with `V > N` neighbouring vertices share one. The table is
//! built once when the mesh is bound and never changes per tick.

use crate::error::{Result, SimError};

/// Texture coordinate of vertex `index` in a mesh of `vertex_count` vertices.
pub fn vertex_uv(index: usize, vertex_count: usize) -> [f32; 2] {
    [(index as f32 + 0.5) / vertex_count as f32, 0.5]
}

/// Oscillator slot sampled by vertex `index`.
///
/// Integer form of `floor((index + 0.5) / vertex_count * point_num)`, so the
/// one-to-one case is exact.
pub fn oscillator_slot(index: usize, vertex_count: usize, point_num: u32) -> u32 {
    let numerator = (2 * index as u64 + 1) * point_num as u64;
    let slot = numerator / (2 * vertex_count as u64);
    slot.min(point_num.saturating_sub(1) as u64) as u32
}

pub fn build_index_remap(vertex_count: usize, point_num: u32) -> Result<Vec<u32>> {
    if vertex_count == 0 {
        return Err(SimError::Configuration("mesh has no vertices".into()));
    }
    if point_num == 0 {
        return Err(SimError::Configuration(
            "cannot remap a mesh onto an empty population".into(),
        ));
    }
    Ok((0..vertex_count)
        .map(|i| oscillator_slot(i, vertex_count, point_num))
        .collect())
}
