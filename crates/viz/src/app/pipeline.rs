use wgpu::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelinePreset {
    /// Closed meshes: back faces culled.
    OpaqueMesh,
    /// Open meshes seen from both sides.
    DoubleSided,
}

impl PipelinePreset {
    pub fn for_mesh(double_sided: bool) -> Self {
        if double_sided {
            PipelinePreset::DoubleSided
        } else {
            PipelinePreset::OpaqueMesh
        }
    }

    fn cull_mode(&self) -> Option<Face> {
        match self {
            PipelinePreset::OpaqueMesh => Some(Face::Back),
            PipelinePreset::DoubleSided => None,
        }
    }
}

/// Formats of the attachments a pipeline renders into.
#[derive(Clone, Copy, Debug)]
pub struct RenderTargets {
    pub color: TextureFormat,
    pub depth: TextureFormat,
}

/// Triangle-list render pipeline with `vs_main` / `fs_main` entry points.
pub fn create_pipeline(
    device: &Device,
    preset: PipelinePreset,
    targets: RenderTargets,
    shader_source: &str,
    vertex_layouts: &[VertexBufferLayout],
    bind_group_layouts: &[&BindGroupLayout],
) -> RenderPipeline {
    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some("surface_shader"),
        source: ShaderSource::Wgsl(shader_source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some("surface_pipeline_layout"),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    let target = Some(ColorTargetState {
        format: targets.color,
        blend: None,
        write_mask: ColorWrites::ALL,
    });

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some("surface_pipeline"),
        layout: Some(&pipeline_layout),
        cache: None,
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: vertex_layouts,
        },
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: preset.cull_mode(),
            unclipped_depth: false,
            polygon_mode: PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: targets.depth,
            depth_compare: CompareFunction::Less,
            depth_write_enabled: true,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[target],
        }),
        multiview: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_preset_cull() {
        assert_eq!(PipelinePreset::OpaqueMesh.cull_mode(), Some(Face::Back));
        assert_eq!(PipelinePreset::DoubleSided.cull_mode(), None);
    }

    #[test]
    fn test_preset_follows_mesh() {
        assert_eq!(PipelinePreset::for_mesh(false), PipelinePreset::OpaqueMesh);
        assert_eq!(PipelinePreset::for_mesh(true), PipelinePreset::DoubleSided);
    }
}
