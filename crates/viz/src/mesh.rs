//! Procedural surface meshes.
//!
//! Every vertex carries the oscillator slot it samples, resolved once here
//! with [`sim::remap::build_index_remap`]. Vertices are numbered row by row,
//! so neighbouring oscillators land on neighbouring bands of the surface.

use glam::Vec3;
use sim::remap::build_index_remap;
use sim::SimError;

use crate::app::vertex::SurfaceVertex;

pub struct SurfaceMesh {
    pub vertices: Vec<SurfaceVertex>,
    pub indices: Vec<u32>,
    /// Open meshes are drawn without back-face culling.
    pub double_sided: bool,
}

impl SurfaceMesh {
    /// Unit sphere with `rings` latitude bands and `segments` longitude slices.
    pub fn uv_sphere(rings: u32, segments: u32, point_num: u32) -> sim::Result<Self> {
        if rings < 2 || segments < 3 {
            return Err(SimError::Configuration(format!(
                "uv sphere needs at least 2 rings and 3 segments, got {rings}x{segments}"
            )));
        }

        let mut positions = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for ring in 0..=rings {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let phi = std::f32::consts::TAU * segment as f32 / segments as f32;
                positions.push(Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                ));
            }
        }

        let stride = segments + 1;
        let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                let c = a + 1;
                let d = b + 1;
                // counter-clockwise seen from outside
                indices.extend_from_slice(&[a, c, b, c, d, b]);
            }
        }

        let normals = positions.clone();
        Self::assemble(&positions, &normals, indices, point_num, false)
    }

    /// Flat `columns` x `rows` grid spanning [-1, 1] on the XZ plane.
    pub fn plane(columns: u32, rows: u32, point_num: u32) -> sim::Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(SimError::Configuration(format!(
                "plane needs at least one cell, got {columns}x{rows}"
            )));
        }

        let mut positions = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
        for row in 0..=rows {
            let z = row as f32 / rows as f32 * 2.0 - 1.0;
            for column in 0..=columns {
                let x = column as f32 / columns as f32 * 2.0 - 1.0;
                positions.push(Vec3::new(x, 0.0, z));
            }
        }

        let stride = columns + 1;
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let a = row * stride + column;
                let b = a + stride;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        let normals = vec![Vec3::Y; positions.len()];
        Self::assemble(&positions, &normals, indices, point_num, true)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn assemble(
        positions: &[Vec3],
        normals: &[Vec3],
        indices: Vec<u32>,
        point_num: u32,
        double_sided: bool,
    ) -> sim::Result<Self> {
        let remap = build_index_remap(positions.len(), point_num)?;
        let vertices = positions
            .iter()
            .zip(normals)
            .zip(remap)
            .map(|((position, normal), oscillator)| SurfaceVertex {
                position: position.to_array(),
                normal: normal.normalize_or_zero().to_array(),
                oscillator,
            })
            .collect();

        Ok(Self {
            vertices,
            indices,
            double_sided,
        })
    }
}
