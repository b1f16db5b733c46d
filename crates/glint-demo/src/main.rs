use std::cell::{Cell, RefCell};
use std::f32::consts::TAU;
use std::rc::Rc;

use anyhow::Result;

use glint_engine::core::{Actor, ActorList, App, AppControl, AppCtx};
use glint_engine::event::Event;
use glint_engine::input::{ButtonAction, MouseButton, MouseDragMonitor};
use glint_engine::logging::{init_logging, LoggingConfig};
use glint_engine::math::Vec2;
use glint_engine::render::{RenderTarget, Renderer2d, Scene2d, DEFAULT_SHADER, DEFAULT_TEXTURE_SHADER};
use glint_engine::resource::{ResourceKind, ResourceManager, TextureParams};
use glint_engine::window::{AppConfig, Runtime};
use glint_engine::{Camera2d, Color};

const CHECKER_TEXTURE: &str = "demo_checker_texture";
const OVERVIEW_TEXTURE: &str = "demo_overview_texture";
const OVERVIEW_SIZE: u32 = 256;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = AppConfig {
        title: "glint demo".to_string(),
        ..AppConfig::default()
    };
    Runtime::run(config, Demo::new())
}

/// A circle circling the origin.
struct Orbiter {
    radius: f32,
    speed: f32,
    angle: f32,
    size: f32,
    color: Color,
}

impl Actor for Orbiter {
    fn update(&mut self, dt: f32) {
        self.angle = (self.angle + self.speed * dt) % TAU;
    }

    fn render(&mut self, _dt: f32, renderer: &mut Renderer2d, _resources: &ResourceManager) {
        let pos = Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius;
        renderer.draw_ellipse_v(pos, Vec2::splat(self.size), 0.0, self.color);
        renderer.draw_ellipse_border_v(pos, Vec2::splat(self.size), 0.0, 1.0, Color::WHITE);
    }
}

/// Frame around the world origin, drawn over everything else.
struct Marker {
    spin: f32,
}

impl Actor for Marker {
    fn update(&mut self, dt: f32) {
        self.spin += dt;
    }

    fn render(&mut self, _dt: f32, renderer: &mut Renderer2d, _resources: &ResourceManager) {
        renderer.draw_rect_border(0.0, 0.0, 0.2, 0.2, self.spin, 2.0, Color::from_rgba_u8(255, 200, 0, 255));
    }

    fn late_render(&self) -> bool {
        true
    }
}

struct Demo {
    camera: Camera2d,
    drag: Rc<RefCell<MouseDragMonitor>>,
    scroll: Rc<Cell<f32>>,
    toggle_segments: Rc<Cell<bool>>,
    coarse_circles: bool,
    actors: ActorList,
    /// Zoomed-out view of the actors, rendered off-screen each frame.
    overview: Option<RenderTarget>,
    overview_camera: Camera2d,
    time: f32,
}

/// Pixels to world units: the visible height spans 2 units.
fn drag_multiplier(ctx: &AppCtx<'_>) -> f32 {
    let logical_height = ctx.window_size.1 as f32 / ctx.scale_factor as f32;
    2.0 / logical_height.max(1.0)
}

impl Demo {
    fn new() -> Self {
        let mut actors = ActorList::new();
        actors.push(Marker { spin: 0.0 });
        for (i, color) in [Color::RED, Color::GREEN, Color::BLUE].into_iter().enumerate() {
            actors.push(Orbiter {
                radius: 0.35 + 0.2 * i as f32,
                speed: 1.5 - 0.4 * i as f32,
                angle: i as f32 * 2.0,
                size: 0.12,
                color,
            });
        }

        Self {
            camera: Camera2d::new(),
            drag: Rc::new(RefCell::new(MouseDragMonitor::new(MouseButton::Left, 1.0))),
            scroll: Rc::new(Cell::new(0.0)),
            toggle_segments: Rc::new(Cell::new(false)),
            coarse_circles: false,
            actors,
            overview: None,
            overview_camera: Camera2d::new(),
            time: 0.0,
        }
    }
}

impl App for Demo {
    fn init(&mut self, ctx: &mut AppCtx<'_>) -> Result<()> {
        self.drag.borrow_mut().set_multiplier(drag_multiplier(ctx));
        ctx.events.register_handler(self.drag.clone());

        ctx.events.register_fn(|event| {
            if let Event::Fps { count } = event {
                log::info!("fps: {count}");
            }
            false
        });

        let scroll = self.scroll.clone();
        let toggle = self.toggle_segments.clone();
        ctx.events.register_fn(move |event| match event {
            Event::MouseScroll { dy, .. } => {
                scroll.set(scroll.get() + dy);
                true
            }
            Event::MouseButton {
                button: MouseButton::Right,
                action: ButtonAction::Press,
                ..
            } => {
                toggle.set(true);
                true
            }
            _ => false,
        });

        // Missing files are cached as empty textures and draw untextured.
        ctx.resources.preload(
            ResourceKind::Texture,
            CHECKER_TEXTURE,
            TextureParams::new("assets/checker.png").nearest(),
        );

        match ctx.renderer.create_render_target(OVERVIEW_SIZE, OVERVIEW_SIZE, false) {
            Ok(target) => {
                ctx.resources.insert(target.to_resource(OVERVIEW_TEXTURE));
                self.overview = Some(target);
            }
            Err(err) => log::warn!("overview disabled: {err}"),
        }
        self.overview_camera.set_zoom(0.5);

        ctx.renderer.set_clear_color(Color::rgb(0.08, 0.09, 0.12));
        ctx.renderer.set_alpha(true);
        Ok(())
    }

    fn update(&mut self, dt: f32, ctx: &mut AppCtx<'_>) -> AppControl {
        self.time += dt;

        // The window may have been resized since the last frame.
        self.drag.borrow_mut().set_multiplier(drag_multiplier(ctx));
        let delta = self.drag.borrow_mut().delta_v();
        if delta != Vec2::ZERO {
            let zoom = self.camera.zoom();
            self.camera.move_by(-delta / zoom);
        }

        let steps = self.scroll.replace(0.0);
        if steps != 0.0 {
            self.camera.zoom_by(1.1f32.powf(steps));
        }

        if self.toggle_segments.replace(false) {
            self.coarse_circles = !self.coarse_circles;
            let segments = if self.coarse_circles { 6 } else { 24 };
            if let Err(err) = ctx.renderer.set_circle_segments(ctx.resources, segments) {
                log::warn!("could not change circle segments: {err}");
            }
        }

        self.actors.update(dt);

        if let Some(target) = &self.overview {
            ctx.renderer.apply_camera(&mut self.overview_camera);
            ctx.renderer.render_to_target(dt, target, ctx.resources, &mut self.actors);
        }
        AppControl::Continue
    }

    fn on_exit(&mut self) {
        log::info!("demo ran for {:.1}s", self.time);
    }
}

impl Scene2d for Demo {
    fn render(&mut self, dt: f32, renderer: &mut Renderer2d, resources: &ResourceManager) {
        renderer.apply_camera(&mut self.camera);

        renderer.draw_rect(0.0, -0.8, 3.0, 0.05, 0.0, Color::rgb(0.3, 0.3, 0.35));
        renderer.draw_rect(-1.0, 0.6, 0.25, 0.25, self.time, Color::rgba(0.9, 0.3, 0.6, 0.7));
        renderer.draw_rect_border_v(Vec2::new(-1.0, 0.6), Vec2::splat(0.3), 0.0, 1.0, Color::WHITE);

        renderer.set_shader(resources, DEFAULT_TEXTURE_SHADER);
        renderer.set_texture(resources, CHECKER_TEXTURE);
        renderer.draw_rect_v(Vec2::new(1.0, 0.6), Vec2::splat(0.4), 0.0, Color::WHITE);
        if self.overview.is_some() {
            renderer.set_texture(resources, OVERVIEW_TEXTURE);
            renderer.draw_rect(-1.2, -0.45, 0.5, 0.5, 0.0, Color::WHITE);
        }
        renderer.clear_texture();
        renderer.set_shader(resources, DEFAULT_SHADER);

        self.actors.render(dt, renderer, resources);
    }
}
