use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

use super::{camera::OrbitCamera, context::GpuContext, uniforms::ViewUniforms};

/// Longest step handed to [`App::update`]; longer stalls are clamped.
pub const MAX_FRAME_DT: f32 = 0.1;

pub trait App: Sized + 'static {
    type Config;

    fn init(ctx: &GpuContext, config: Self::Config) -> sim::Result<Self>;

    /// Advance one frame. Fatal errors end the run; others skip the frame's
    /// update and keep showing the last good state.
    fn update(&mut self, ctx: &GpuContext, dt: f32) -> sim::Result<()>;

    fn render(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    );

    fn on_key(&mut self, _key: KeyCode, _pressed: bool) {}
    fn camera(&self) -> &OrbitCamera;
    fn camera_mut(&mut self) -> &mut OrbitCamera;
    fn title() -> &'static str {
        "App"
    }
}

pub fn run<A: App>(config: A::Config) -> Result<(), Box<dyn std::error::Error>> {
    let event_loop = EventLoop::new()?;
    let mut runner = AppRunner::<A>::new(config);
    event_loop.run_app(&mut runner)?;
    match runner.failure {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

/// Seconds between two frames, clamped to [`MAX_FRAME_DT`].
pub fn frame_delta(elapsed: Duration) -> f32 {
    elapsed.as_secs_f32().min(MAX_FRAME_DT)
}

struct AppRunner<A: App> {
    config: Option<A::Config>,
    window: Option<Arc<Window>>,
    ctx: Option<GpuContext>,
    app: Option<A>,
    last_time: Option<Instant>,
    failure: Option<String>,
}

impl<A: App> AppRunner<A> {
    fn new(config: A::Config) -> Self {
        Self {
            config: Some(config),
            window: None,
            ctx: None,
            app: None,
            last_time: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, message: String) {
        log::error!("{message}");
        self.failure = Some(message);
        event_loop.exit();
    }
}

impl<A: App> ApplicationHandler for AppRunner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let Some(config) = self.config.take() else {
            return;
        };

        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(A::title())
                .with_inner_size(winit::dpi::LogicalSize::new(1280, 720)),
        ) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, format!("Window creation failed: {e}")),
        };
        self.window = Some(window.clone());

        let ctx = match pollster::block_on(GpuContext::new(window)) {
            Ok(ctx) => ctx,
            Err(e) => return self.fail(event_loop, format!("GPU setup failed: {e}")),
        };
        match A::init(&ctx, config) {
            Ok(app) => self.app = Some(app),
            Err(e) => return self.fail(event_loop, format!("App init failed: {e}")),
        }
        self.ctx = Some(ctx);
        self.last_time = Some(Instant::now());
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(ctx) = &mut self.ctx {
                    ctx.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event,
                is_synthetic: false,
                ..
            } => {
                if let (Some(app), PhysicalKey::Code(code)) = (&mut self.app, event.physical_key) {
                    app.on_key(code, event.state == ElementState::Pressed);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if let Some(app) = &mut self.app {
                    let scroll = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                    };
                    app.camera_mut().on_scroll(scroll);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(ctx), Some(app), Some(last_time)) =
            (&mut self.ctx, &mut self.app, self.last_time)
        else {
            return;
        };

        let now = Instant::now();
        let dt = frame_delta(now - last_time);
        self.last_time = Some(now);

        app.camera_mut().update(dt);

        if let Err(e) = app.update(ctx, dt) {
            if e.is_fatal() {
                return self.fail(event_loop, format!("Simulation stopped: {e}"));
            }
            log::warn!("Frame update skipped: {e}");
        }

        let uniforms = ViewUniforms::from_camera(app.camera(), ctx.aspect());
        ctx.update_view_uniforms(&uniforms);

        let surface_texture = match ctx.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                ctx.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout, skipping frame");
                return;
            }
            Err(e) => return self.fail(event_loop, format!("Surface error: {e}")),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor::default());

        app.render(ctx, &mut encoder, &view);

        ctx.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
