//! GPU compute surface tests.
//!
//! Every test needs an adapter; without one it logs and returns early.
//!
//! Tests cover:
//! - GPU and CPU surfaces agree tick for tick
//! - Static uncoupled population stays put
//! - Mismatched pass inputs abort without a swap
//! - The mesh renderer binds and draws without validation errors

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use sim::{
    ComputeSurface, CpuSurface, NaturalFrequencyTable, OrderParameter, PassInputs, PhaseSeed,
    SimConfig, SimError, Simulation,
};
use viz::app::pipeline::RenderTargets;
use viz::gpu::{request_headless_device, GpuSurface, MeshRenderer};
use viz::mesh::SurfaceMesh;

/// Initialize GPU device for testing
fn init_device() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
    match request_headless_device() {
        Ok(pair) => Some(pair),
        Err(e) => {
            eprintln!("Skipping GPU test: {e}");
            None
        }
    }
}

fn read_phases(sim: &mut Simulation<GpuSurface>) -> Vec<f32> {
    let mut out = Vec::new();
    sim.surface_mut().complete_readback(&mut out).unwrap();
    out
}

#[test]
fn test_gpu_matches_cpu_trajectory() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let config = SimConfig::default()
        .with_population(300)
        .with_coupling(1.5)
        .with_seed(42);

    let mut gpu = Simulation::new(&config, GpuSurface::new(device, queue, 300).unwrap()).unwrap();
    let mut cpu = Simulation::new(&config, CpuSurface::new(300).unwrap()).unwrap();

    for _ in 0..30 {
        let g = gpu.tick(0.02).unwrap();
        let c = cpu.tick(0.02).unwrap();
        assert!((g.order.r - c.order.r).abs() < 1e-3, "R diverged: {} vs {}", g.order.r, c.order.r);
    }

    let gpu_phases = read_phases(&mut gpu);
    for (i, (g, c)) in gpu_phases.iter().zip(cpu.surface().phases()).enumerate() {
        assert!((g - c).abs() < 1e-3, "oscillator {i}: gpu {g} vs cpu {c}");
    }
}

#[test]
fn test_gpu_uncoupled_static_quadrants() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let seed = vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2];
    let config = SimConfig::default()
        .with_population(4)
        .with_coupling(0.0)
        .with_phase_seed(PhaseSeed::Explicit(seed.clone()));
    let table = NaturalFrequencyTable::from_values(vec![0.0; 4]).unwrap();
    let surface = GpuSurface::new(device, queue, 4).unwrap();
    let mut sim = Simulation::with_frequencies(&config, table, surface).unwrap();

    let report = sim.tick(1.0).unwrap();
    assert!(report.order.r < 1e-5);
    assert!(report.order.degenerate);
    assert_eq!(read_phases(&mut sim), seed);
}

#[test]
fn test_gpu_mismatch_keeps_snapshot() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let mut surface = GpuSurface::new(device, queue, 64).unwrap();
    let table = NaturalFrequencyTable::from_values(vec![1.0; 64]).unwrap();
    surface.upload_frequencies(&table).unwrap();
    surface.initialize(&vec![0.5; 64]).unwrap();

    let bad = PassInputs {
        point_num: 63,
        coupling: 1.0,
        delta_time: 0.1,
        order: OrderParameter::INITIAL,
    };
    let err = surface.update_phase(&bad).unwrap_err();
    assert!(matches!(err, SimError::DimensionMismatch { expected: 64, actual: 63, .. }));
    assert_eq!(surface.current_index(), 0);

    let mut out = Vec::new();
    surface.complete_readback(&mut out).unwrap();
    assert_eq!(out, vec![0.5; 64]);
}

#[test]
fn test_gpu_velocity_pass_uses_lagged_order() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let mut surface = GpuSurface::new(device, queue, 2).unwrap();
    surface
        .upload_frequencies(&NaturalFrequencyTable::from_values(vec![0.5, -0.5]).unwrap())
        .unwrap();
    surface.initialize(&[0.0, 1.0]).unwrap();

    let order = OrderParameter {
        r: 0.8,
        theta: 0.5,
        degenerate: false,
    };
    let inputs = PassInputs {
        point_num: 2,
        coupling: 2.0,
        delta_time: 0.0,
        order,
    };
    surface.update_velocity(&inputs).unwrap();
    let velocities = surface.read_velocities().unwrap();

    let expected = [0.5 + 2.0 * 0.8 * (0.5f32).sin(), -0.5 + 2.0 * 0.8 * (0.5f32 - 1.0).sin()];
    for (got, want) in velocities.iter().zip(expected) {
        assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
    }
}

#[test]
fn test_gpu_surface_rejects_oversized_population() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let err = GpuSurface::new(device, queue, sim::MAX_POINTS + 1).err().unwrap();
    assert!(matches!(err, SimError::Configuration(_)));
}

#[test]
fn test_renderer_draws_without_validation_errors() {
    let Some((device, queue)) = init_device() else {
        return;
    };
    let config = SimConfig::default().with_population(128).with_seed(1);
    let surface = GpuSurface::new(device.clone(), queue.clone(), 128).unwrap();
    let mut sim = Simulation::new(&config, surface).unwrap();
    sim.tick(0.016).unwrap();

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let targets = RenderTargets {
        color: wgpu::TextureFormat::Rgba8UnormSrgb,
        depth: wgpu::TextureFormat::Depth32Float,
    };
    let view_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("test_view_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });
    let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("test_view_uniforms"),
        size: std::mem::size_of::<viz::app::ViewUniforms>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let view_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("test_view_bind_group"),
        layout: &view_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: view_buffer.as_entire_binding(),
        }],
    });

    let mesh = SurfaceMesh::uv_sphere(8, 16, 128).unwrap();
    let renderer =
        MeshRenderer::new(&device, targets, &view_layout, &mesh, sim.surface()).unwrap();
    renderer.update(&queue, &sim.render_params()).unwrap();

    let texture = |format, usage| {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("test_target"),
                size: wgpu::Extent3d {
                    width: 64,
                    height: 64,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    };
    let color = texture(targets.color, wgpu::TextureUsages::RENDER_ATTACHMENT);
    let depth = texture(targets.depth, wgpu::TextureUsages::RENDER_ATTACHMENT);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    renderer.draw(
        &mut encoder,
        &color,
        &depth,
        &view_bind_group,
        sim.surface().current_index(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let error = pollster::block_on(device.pop_error_scope());
    assert!(error.is_none(), "validation error: {error:?}");

    let mismatched = sim::RenderParams {
        point_num: 64,
        ..sim.render_params()
    };
    assert!(matches!(
        renderer.update(&queue, &mismatched),
        Err(SimError::DimensionMismatch { .. })
    ));
}
