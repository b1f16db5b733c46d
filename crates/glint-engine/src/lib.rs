//! Glint: a small 2D rendering toolkit on wgpu and winit.
//!
//! A [`window::Runtime`] owns the window and GPU, translates platform input
//! into [`event::Event`]s, keeps a uri-keyed [`resource::ResourceManager`]
//! and drives an [`core::App`] that draws through [`render::Renderer2d`].

pub mod cache;
pub mod camera;
pub mod core;
pub mod device;
pub mod event;
pub mod input;
pub mod logging;
pub mod math;
pub mod render;
pub mod resource;
pub mod time;
pub mod window;

pub use camera::Camera2d;
pub use math::Color;
