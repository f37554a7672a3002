//! Kuramoto surface viewer.
//!
//! Usage: `kuramoto_viewer [config.json] [--plane] [--headless TICKS]`
//!
//! Keys: Up/Down change the coupling K, Right/Left change base_freq.
//! Changes are queued and take effect at the next tick.
//!
//! Run with: cargo run --release -p viz --bin kuramoto_viewer

use std::path::Path;

use sim::{ParamUpdate, SimConfig, Simulation};
use viz::app::pipeline::RenderTargets;
use viz::app::{run, App, GpuContext, OrbitCamera};
use viz::gpu::{request_headless_device, GpuSurface, MeshRenderer};
use viz::mesh::SurfaceMesh;
use winit::keyboard::KeyCode;

const SPHERE_RINGS: u32 = 48;
const SPHERE_SEGMENTS: u32 = 64;
const PLANE_CELLS: u32 = 63;
const HEADLESS_DT: f32 = 1.0 / 60.0;
const REPORT_EVERY: u64 = 120;

const COUPLING_STEP: f32 = 0.25;
const FREQ_STEP: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MeshShape {
    Sphere,
    Plane,
}

struct ViewerConfig {
    sim: SimConfig,
    shape: MeshShape,
}

struct KuramotoViewer {
    sim: Simulation<GpuSurface>,
    renderer: MeshRenderer,
    camera: OrbitCamera,
}

impl App for KuramotoViewer {
    type Config = ViewerConfig;

    fn init(ctx: &GpuContext, config: ViewerConfig) -> sim::Result<Self> {
        let point_num = config.sim.point_num;
        let surface = GpuSurface::new(ctx.device.clone(), ctx.queue.clone(), point_num)?;
        let sim = Simulation::new(&config.sim, surface)?;

        let mesh = match config.shape {
            MeshShape::Sphere => SurfaceMesh::uv_sphere(SPHERE_RINGS, SPHERE_SEGMENTS, point_num)?,
            MeshShape::Plane => SurfaceMesh::plane(PLANE_CELLS, PLANE_CELLS, point_num)?,
        };
        let targets = RenderTargets {
            color: ctx.config.format,
            depth: ctx.depth_format(),
        };
        let renderer = MeshRenderer::new(
            &ctx.device,
            targets,
            &ctx.view_bind_group_layout,
            &mesh,
            sim.surface(),
        )?;
        renderer.update(&ctx.queue, &sim.render_params())?;

        Ok(Self {
            sim,
            renderer,
            camera: OrbitCamera::new(),
        })
    }

    fn update(&mut self, ctx: &GpuContext, dt: f32) -> sim::Result<()> {
        let report = self.sim.tick(dt)?;
        self.renderer.update(&ctx.queue, &self.sim.render_params())?;

        if report.tick % REPORT_EVERY == 0 {
            log::info!(
                "tick {} (t = {:.1}s): R = {:.3}, Θ = {:.3}, radius = {:.3}",
                report.tick,
                report.elapsed,
                report.order.r,
                report.order.theta,
                report.visual_radius
            );
        }
        Ok(())
    }

    fn render(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        self.renderer.draw(
            encoder,
            view,
            &ctx.depth_view,
            &ctx.view_bind_group,
            self.sim.surface().current_index(),
        );
    }

    fn on_key(&mut self, key: KeyCode, pressed: bool) {
        if !pressed {
            return;
        }
        let params = self.sim.params();
        let update = match key {
            KeyCode::ArrowUp => ParamUpdate::new()
                .with_connection_coefficient(params.connection_coefficient() + COUPLING_STEP),
            KeyCode::ArrowDown => ParamUpdate::new().with_connection_coefficient(
                (params.connection_coefficient() - COUPLING_STEP).max(0.0),
            ),
            KeyCode::ArrowRight => {
                ParamUpdate::new().with_base_freq(params.base_freq() + FREQ_STEP)
            }
            KeyCode::ArrowLeft => ParamUpdate::new().with_base_freq(params.base_freq() - FREQ_STEP),
            _ => return,
        };
        if let Err(e) = self.sim.queue_update(update) {
            log::warn!("Rejected parameter update: {e}");
        }
    }

    fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    fn title() -> &'static str {
        "Kuramoto Surface"
    }
}

/// Step the GPU simulation without a window and log the order parameter.
fn run_headless(config: &SimConfig, ticks: u64) -> Result<(), Box<dyn std::error::Error>> {
    let (device, queue) = request_headless_device()?;
    let surface = GpuSurface::new(device, queue, config.point_num)?;
    let mut sim = Simulation::new(config, surface)?;

    for _ in 0..ticks {
        match sim.tick(HEADLESS_DT) {
            Ok(report) if report.tick % REPORT_EVERY == 0 => {
                log::info!("tick {}: R = {:.4}", report.tick, report.order.r);
            }
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e.into()),
            Err(e) => log::warn!("Tick skipped: {e}"),
        }
    }

    let order = sim.flush_readback()?;
    log::info!(
        "finished {} ticks: R = {:.4}, Θ = {:.4}, radius = {:.4}",
        sim.tick_count(),
        order.r,
        order.theta,
        sim.visual_radius()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let shape = if args.iter().any(|a| a == "--plane") {
        MeshShape::Plane
    } else {
        MeshShape::Sphere
    };
    let headless_ticks = match args.iter().position(|a| a == "--headless") {
        Some(i) => Some(
            args.get(i + 1)
                .ok_or("--headless needs a tick count")?
                .parse::<u64>()?,
        ),
        None => None,
    };
    let config_path = args
        .iter()
        .enumerate()
        .find(|(i, a)| {
            !a.starts_with("--") && !(*i > 0 && args[*i - 1] == "--headless")
        })
        .map(|(_, a)| a.clone());

    let sim_config = match config_path {
        Some(path) => {
            log::info!("Loading config from {path}");
            SimConfig::load_json(Path::new(&path))?
        }
        None => SimConfig::default(),
    };

    match headless_ticks {
        Some(ticks) => run_headless(&sim_config, ticks),
        None => run::<KuramotoViewer>(ViewerConfig {
            sim: sim_config,
            shape,
        }),
    }
}
