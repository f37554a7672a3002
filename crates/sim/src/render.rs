//! Per-tick render parameter bundle.

use crate::config::SurfaceStyle;

/// Everything the surface shader needs for one draw, assembled fresh each
/// tick by [`Simulation::render_params`](crate::Simulation::render_params).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderParams {
    pub style: SurfaceStyle,
    /// Mesh scale derived from the order parameter.
    pub radius: f32,
    pub elapsed_time: f32,
    pub base_freq: f32,
    pub point_num: u32,
}
