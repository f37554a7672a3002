//! Mesh renderer for the oscillator surface.
//!
//! Binds the live phase buffer and the natural frequency table of a
//! [`GpuSurface`] to the vertex stage. Like the compute passes it keeps one
//! bind group per phase slot and picks the one matching the surface's current
//! index at draw time, so it always shows the last completed snapshot.
//! Rendering only reads simulation buffers.

use sim::{ComputeSurface, RenderParams, SimError};
use wgpu::util::DeviceExt;

use super::oscillator::GpuSurface;
use super::params::SurfaceParams;
use crate::app::pipeline::{create_pipeline, PipelinePreset, RenderTargets};
use crate::app::vertex::SurfaceVertex;
use crate::mesh::SurfaceMesh;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.03,
    a: 1.0,
};

pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,
    params_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    point_num: u32,
}

impl MeshRenderer {
    /// Upload `mesh` and bind it to `surface`'s buffers.
    pub fn new(
        device: &wgpu::Device,
        targets: RenderTargets,
        view_layout: &wgpu::BindGroupLayout,
        mesh: &SurfaceMesh,
        surface: &GpuSurface,
    ) -> sim::Result<Self> {
        let point_num = surface.point_num();
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(SimError::Configuration("surface mesh is empty".into()));
        }
        if let Some(vertex) = mesh.vertices.iter().find(|v| v.oscillator >= point_num) {
            return Err(SimError::Configuration(format!(
                "mesh samples oscillator {} but the surface holds {point_num}",
                vertex.oscillator
            )));
        }

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Surface Params"),
            size: std::mem::size_of::<SurfaceParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Surface Indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let storage_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Surface Bind Group Layout"),
            entries: &[
                // 0: surface params (uniform)
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1: phases (read)
                storage_entry(1),
                // 2: natural_freq (read)
                storage_entry(2),
            ],
        });

        let phase_buffers = surface.phase_buffers();
        let bind_group_for = |slot: usize| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Surface Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: phase_buffers[slot].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: surface.frequency_buffer().as_entire_binding(),
                    },
                ],
            })
        };
        let bind_groups = [bind_group_for(0), bind_group_for(1)];

        let pipeline = create_pipeline(
            device,
            PipelinePreset::for_mesh(mesh.double_sided),
            targets,
            include_str!("shaders/surface.wgsl"),
            &[SurfaceVertex::desc()],
            &[view_layout, &layout],
        );

        log::info!(
            "Surface mesh bound: {} vertices, {} triangles, {} oscillators",
            mesh.vertex_count(),
            mesh.index_count() / 3,
            point_num
        );

        Ok(Self {
            pipeline,
            params_buffer,
            bind_groups,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            point_num,
        })
    }

    /// Upload this tick's render bundle.
    pub fn update(&self, queue: &wgpu::Queue, params: &RenderParams) -> sim::Result<()> {
        if params.point_num != self.point_num {
            return Err(SimError::DimensionMismatch {
                what: "render params",
                expected: self.point_num as usize,
                actual: params.point_num as usize,
            });
        }
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&SurfaceParams::from(params)),
        );
        Ok(())
    }

    /// Record one draw of the surface using phase slot `current`.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color_view: &wgpu::TextureView,
        depth_view: &wgpu::TextureView,
        view_bind_group: &wgpu::BindGroup,
        current: usize,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Surface Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, view_bind_group, &[]);
        pass.set_bind_group(1, &self.bind_groups[current & 1], &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
