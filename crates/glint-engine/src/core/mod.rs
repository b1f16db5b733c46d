//! Application-facing contracts.
//!
//! The runtime drives an [`App`] through [`AppCtx`], which lends out the
//! resource manager, renderer and event queue for the duration of a callback.

mod actors;
mod app;
mod ctx;

pub use actors::{Actor, ActorList};
pub use app::{App, AppControl};
pub use ctx::AppCtx;
