use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, AppCtx};
use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::event::{Event, EventQueue};
use crate::input::platform::winit::EventTranslator;
use crate::render::Renderer2d;
use crate::resource::ResourceManager;
use crate::time::{FpsCounter, FrameClock};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    /// Initial size in logical pixels.
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
    pub vsync: bool,
    /// Initial capacity of the event buffer.
    pub event_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "glint".to_string(),
            width: 800,
            height: 600,
            resizable: true,
            vsync: true,
            event_capacity: 64,
        }
    }
}

pub struct Runtime;

impl Runtime {
    /// Runs `app` until its window closes. Must be called on the main thread.
    pub fn run<A>(config: AppConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let gpu_init = GpuInit {
            vsync: config.vsync,
            ..GpuInit::default()
        };
        Self::run_with(config, gpu_init, app)
    }

    pub fn run_with<A>(config: AppConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowSurface {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// State that exists while the window does.
struct Session {
    surface: WindowSurface,
    renderer: Renderer2d,
    clock: FrameClock,
    fps: FpsCounter,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: AppConfig,
    gpu_init: GpuInit,
    app: A,

    events: EventQueue,
    resources: ResourceManager,
    translator: EventTranslator,
    session: Option<Session>,

    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: AppConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            events: EventQueue::with_capacity(config.event_capacity),
            config,
            gpu_init,
            app,
            resources: ResourceManager::new(),
            translator: EventTranslator::new(),
            session: None,
            exit_requested: false,
            error: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.request_exit(event_loop);
    }

    fn start_session(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.width as f64,
                self.config.height as f64,
            ))
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let surface = WindowSurfaceTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        let (renderer, scale_factor) = surface.with(|fields| {
            let size = fields.gpu.size();
            Renderer2d::new(
                fields.gpu.device(),
                fields.gpu.queue(),
                fields.gpu.surface_format(),
                size.width,
                size.height,
            )
            .map(|renderer| (renderer, fields.window.scale_factor()))
        })?;

        let mut session = Session {
            surface,
            renderer,
            clock: FrameClock::new(),
            fps: FpsCounter::new(std::time::Instant::now()),
        };

        session.renderer.init(&mut self.resources);
        self.events.register_handler(session.renderer.event_handler());

        let size = session.surface.borrow_gpu().size();
        let mut ctx = AppCtx {
            resources: &mut self.resources,
            renderer: &mut session.renderer,
            events: &mut self.events,
            window_size: (size.width, size.height),
            scale_factor,
        };
        self.app.init(&mut ctx).context("application init failed")?;

        log::debug!(
            "session started: {}x{} physical, scale {scale_factor}",
            size.width,
            size.height
        );

        session.clock.reset();
        self.session = Some(session);
        Ok(())
    }

    /// Flushes events, updates the app and renders one frame.
    fn redraw(&mut self) -> AppControl {
        let Some(session) = self.session.as_mut() else {
            return AppControl::Continue;
        };

        self.events.flush();

        let time = session.clock.tick();
        if let Some(count) = session.fps.tick(time.now) {
            self.events.push(Event::Fps { count });
        }

        let (size, scale_factor) = session
            .surface
            .with_window(|w| (w.inner_size(), w.scale_factor()));

        let mut ctx = AppCtx {
            resources: &mut self.resources,
            renderer: &mut session.renderer,
            events: &mut self.events,
            window_size: (size.width, size.height),
            scale_factor,
        };
        if self.app.update(time.dt, &mut ctx) == AppControl::Exit {
            return AppControl::Exit;
        }

        // Minimized.
        if size.width == 0 || size.height == 0 {
            return AppControl::Continue;
        }

        let app = &mut self.app;
        let resources = &self.resources;
        let renderer = &mut session.renderer;

        session.surface.with_mut(|fields| {
            let mut frame = match fields.gpu.begin_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    log::debug!("surface error: {err}");
                    return match fields.gpu.handle_surface_error(err) {
                        SurfaceErrorAction::Fatal => {
                            log::error!("fatal surface error; exiting");
                            AppControl::Exit
                        }
                        _ => AppControl::Continue,
                    };
                }
            };

            renderer.render(time.dt, &mut frame, resources, app);

            fields.window.pre_present_notify();
            fields.gpu.submit(frame);
            AppControl::Continue
        })
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        if let Err(err) = self.start_session(event_loop) {
            self.fail(event_loop, err);
            return;
        }

        if let Some(session) = &self.session {
            session.surface.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(session) = &self.session {
            session.surface.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };

        let translator = &mut self.translator;
        if let Some(ev) = session
            .surface
            .with_window(|w| translator.translate(w, &event))
        {
            self.events.push(ev);
        }

        match &event {
            WindowEvent::CloseRequested => {
                log::debug!("close requested");
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                session.surface.with_gpu_mut(|gpu| gpu.resize(*new_size));
                session.surface.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = session.surface.with_window(|w| w.inner_size());
                session.surface.with_gpu_mut(|gpu| gpu.resize(new_size));
                self.events.push(Event::Resize {
                    width: new_size.width,
                    height: new_size.height,
                });
            }

            WindowEvent::RedrawRequested => {
                if self.redraw() == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.app.on_exit();
        self.resources.unload();
        self.session = None;
        log::debug!("runtime exiting");
    }
}
