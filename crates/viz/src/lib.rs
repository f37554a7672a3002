//! Viz library crate - GPU compute surface, mesh renderer and the windowed viewer

pub mod app;
pub mod gpu;
pub mod mesh;
