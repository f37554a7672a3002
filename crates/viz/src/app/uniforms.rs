use bytemuck::{Pod, Zeroable};

use super::camera::OrbitCamera;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ViewUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _pad: f32,
}

impl ViewUniforms {
    pub fn from_camera(camera: &OrbitCamera, aspect: f32) -> Self {
        Self {
            view_proj: camera.view_projection(aspect).to_cols_array_2d(),
            camera_pos: camera.position().to_array(),
            _pad: 0.0,
        }
    }
}
