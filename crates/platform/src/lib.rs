//! Platform layer: window, event loop, input and the control overlay.
//!
//! Design goals:
//! - No busy loop: redraw only while animating or after input.
//! - Proper handling of resize/scale/close and surface loss.
//! - Clear log messages to help future debugging.

mod input;
mod scene;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::MeshResolution;
use corelib::clock::SystemClock;
use renderer::{GpuState, OverlayTarget};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{ModifiersState, PhysicalKey},
    window::{Window, WindowId},
};

pub use input::Action;
pub use scene::Scene;

const TITLE: &str = "Astrocat";

/// Everything the viewer needs from the command line.
#[derive(Clone, Debug)]
pub struct PlatformConfig {
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    pub start_walking: bool,
    pub resolution: MeshResolution,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
            start_walking: false,
            resolution: MeshResolution::default(),
        }
    }
}

/// Open the viewer window and run until it is closed.
pub fn run(config: PlatformConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = Viewer::new(config);
    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Window-bound resources, created on `resumed`.
struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl WindowState {
    fn create(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            config.backends,
            config.resolution,
        ))?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(gpu.device(), gpu.surface_format(), None, 1, false);

        Ok(Self {
            window,
            gpu,
            egui_ctx,
            egui_state,
            egui_renderer,
        })
    }
}

struct Viewer {
    config: PlatformConfig,
    scene: Scene<SystemClock>,
    viewport: Option<WindowState>,
    drag: input::DragTracker,
    modifiers: ModifiersState,
    fatal: Option<anyhow::Error>,
}

impl Viewer {
    fn new(config: PlatformConfig) -> Self {
        let scene = Scene::new(SystemClock::new(), config.start_walking);
        Self {
            config,
            scene,
            viewport: None,
            drag: input::DragTracker::default(),
            modifiers: ModifiersState::empty(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn apply(&mut self, event_loop: &ActiveEventLoop, action: Action) {
        match action {
            Action::ToggleWalk => {
                self.scene.toggle_walking();
            }
            Action::Poke => self.scene.poke(),
            Action::Exit => {
                log::info!("Exit requested.");
                event_loop.exit();
            }
        }
        self.request_redraw();
    }

    fn request_redraw(&self) {
        if let Some(viewport) = &self.viewport {
            viewport.window.request_redraw();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };
        let WindowState {
            window,
            gpu,
            egui_ctx,
            egui_state,
            egui_renderer,
        } = viewport;

        let aspect = gpu.aspect();
        if let Some(fps) = self.scene.record(gpu, aspect) {
            if self.config.show_fps {
                window.set_title(&format!("{TITLE} | FPS: {fps}"));
            }
        }

        let raw_input = egui_state.take_egui_input(window);
        let show_fps = self.config.show_fps;
        let mut panel = ui::PanelResponse::default();
        let output = egui_ctx.run(raw_input, |ctx| {
            panel = ui::control_panel(ctx, &mut self.scene, show_fps);
        });
        egui_state.handle_platform_output(window, output.platform_output);
        let jobs = egui_ctx.tessellate(output.shapes, output.pixels_per_point);
        let textures = output.textures_delta;
        let pixels_per_point = output.pixels_per_point;

        let result = gpu.end_frame_with(|target: OverlayTarget<'_>| {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: target.size_in_pixels,
                pixels_per_point,
            };
            for (id, delta) in &textures.set {
                egui_renderer.update_texture(target.device, target.queue, *id, delta);
            }
            let buffers = egui_renderer.update_buffers(
                target.device,
                target.queue,
                target.encoder,
                &jobs,
                &screen,
            );
            {
                let pass = target
                    .encoder
                    .begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("OverlayPass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: target.view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        occlusion_query_set: None,
                        timestamp_writes: None,
                    });
                egui_renderer.render(&mut pass.forget_lifetime(), &jobs, &screen);
            }
            for id in &textures.free {
                egui_renderer.free_texture(id);
            }
            buffers
        });

        match result {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface {err:?}; reconfiguring.");
                gpu.recreate_surface();
                window.request_redraw();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timeout; skipping frame.");
            }
            Err(err) => {
                self.fail(event_loop, anyhow!("frame failed: {err:?}"));
                return;
            }
        }

        if panel.toggle_walk {
            self.scene.toggle_walking();
        }
        if panel.poke {
            self.scene.poke();
        }
        if panel.toggle_walk || panel.poke || panel.changed {
            self.request_redraw();
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewport.is_some() {
            return;
        }
        match WindowState::create(event_loop, &self.config) {
            Ok(viewport) => {
                viewport.window.request_redraw();
                self.viewport = Some(viewport);
            }
            Err(err) => self.fail(event_loop, err.context("failed to initialise the viewer")),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };
        let egui_response = viewport.egui_state.on_window_event(&viewport.window, &event);
        if egui_response.repaint {
            viewport.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                log::info!("Resized: {}x{}", width, height);
                viewport.gpu.resize(width, height);
                viewport.window.request_redraw();
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {:.3}", scale_factor);
                viewport.window.request_redraw();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => self.drag.release(),
            WindowEvent::CursorMoved { position, .. } => {
                if let Some((dx, dy)) = self.drag.moved(position, egui_response.consumed) {
                    self.scene.camera.drag(dx, dy);
                    self.request_redraw();
                }
            }
            _ if egui_response.consumed => {}
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    if let PhysicalKey::Code(code) = event.physical_key {
                        if let Some(action) = input::action_for_key(code) {
                            self.apply(event_loop, action);
                        }
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(action) = self.drag.press(self.modifiers.shift_key()) {
                    self.apply(event_loop, action);
                }
            }
            WindowEvent::CursorLeft { .. } => self.drag.cursor_left(),
            WindowEvent::MouseWheel { delta, .. } => {
                self.scene.camera.zoom_steps(input::wheel_steps(delta));
                self.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.scene.is_animating() {
            self.request_redraw();
        }
    }
}
