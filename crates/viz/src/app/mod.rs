//! Windowed app framework for the surface viewer.
//!
//! [`GpuContext`] owns the window surface, depth target and view uniforms;
//! [`run`] drives an [`App`] once per frame.

pub mod camera;
pub mod context;
pub mod pipeline;
pub mod runner;
pub mod uniforms;
pub mod vertex;

pub use camera::OrbitCamera;
pub use context::GpuContext;
pub use runner::{run, App};
pub use uniforms::ViewUniforms;
