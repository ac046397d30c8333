use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit, SurfaceErrorAction, WgpuDevice, WgpuProgram};
use crate::render::{AttributeBindings, RenderError, Renderer, RendererConfig};
use crate::scene::Scene;
use crate::shader::ShaderSources;

/// Window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "strata".to_string(),
            initial_size: LogicalSize::new(800.0, 800.0),
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and presents `scene` on every redraw until the window
    /// is closed.
    ///
    /// Setup failures end the loop and are returned here. A missing device
    /// comes back as [`RenderError::DeviceUnavailable`], reachable through
    /// `anyhow::Error::downcast_ref`.
    pub fn run(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        renderer_config: RendererConfig,
        scene: Scene,
    ) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, renderer_config, scene);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Everything that lives between a successful setup and window close.
struct Session {
    entry: WindowEntry,
    renderer: Renderer<WgpuDevice>,
    program: WgpuProgram,
    bindings: AttributeBindings,
}

impl Session {
    fn shutdown(self) {
        let Session {
            entry,
            mut renderer,
            program,
            ..
        } = self;

        renderer.release_buffers();
        renderer.release_program(program);
        drop(renderer);
        drop(entry);
        log::info!("session closed");
    }
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    renderer_config: RendererConfig,
    scene: Scene,

    session: Option<Session>,
    failure: Option<anyhow::Error>,
    started: bool,
}

impl AppState {
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        renderer_config: RendererConfig,
        scene: Scene,
    ) -> Self {
        Self {
            config,
            gpu_init,
            renderer_config,
            scene,
            session: None,
            failure: None,
            started: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
        self.failure.get_or_insert(err);
        event_loop.exit();
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(session) = self.session.take() {
            session.shutdown();
        }
        event_loop.exit();
    }

    /// Window, device, program and attribute bindings, in that order.
    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build();

        let (entry, device) = match entry {
            Ok(entry) => {
                let device = entry.with_gpu(|gpu| WgpuDevice::new(gpu));
                (Some(entry), Some(device))
            }
            Err(e) => {
                log::error!("gpu initialization failed: {e:#}");
                (None, None)
            }
        };

        let mut renderer = Renderer::initialize(device, self.renderer_config.clone())?;
        let entry = entry.ok_or(RenderError::DeviceUnavailable)?;

        let program = renderer.compile_program(&ShaderSources::PAINTER)?;
        let bindings = match renderer.bind_attributes(&program) {
            Ok(bindings) => bindings,
            Err(e) => {
                renderer.release_program(program);
                return Err(e.into());
            }
        };

        Ok(Session {
            entry,
            renderer,
            program,
            bindings,
        })
    }

    /// Draws one frame. Surface errors that the surface recovers from skip
    /// the frame; anything else is returned.
    fn redraw(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let Session {
            entry,
            renderer,
            program,
            bindings,
        } = session;
        let scene = &mut self.scene;

        let retry = entry.with_gpu_mut(|gpu| -> Result<bool> {
            let mut frame = match gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    let reason = err.to_string();
                    return match gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Reconfigured => Ok(true),
                        SurfaceErrorAction::SkipFrame => {
                            log::warn!("skipping frame: {reason}");
                            Ok(false)
                        }
                        SurfaceErrorAction::Fatal => {
                            Err(anyhow::anyhow!("surface acquisition failed: {reason}"))
                        }
                    };
                }
            };

            renderer
                .render_scene(&mut frame, program, bindings, scene)
                .context("frame aborted")?;
            gpu.submit(frame);
            Ok(false)
        })?;

        if retry {
            entry.with_window(|w| w.request_redraw());
        }
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        match self.start(event_loop) {
            Ok(session) => {
                session.entry.with_window(|w| w.request_redraw());
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The scene is static; frames are only drawn on request.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.close(event_loop),

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.close(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(session) = self.session.as_mut() {
                    session.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    session.entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(session) = self.session.as_mut() {
                    let new_size = session.entry.with_window(|w| w.inner_size());
                    session.entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                    session.entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }

            _ => {}
        }
    }
}
