//! Application framework for the Quadrant renderer.
//!
//! This crate provides a trait-based runner that handles:
//! - Logging setup
//! - Window creation, including borderless fullscreen
//! - Renderer initialization and teardown
//! - A fixed simulation tick alongside per-frame drawing
//! - Event loop handling
//!
//! # Example
//!
//! ```no_run
//! use quadrant_app::{run_app, AppConfig, AppContext, QuadApp, RectShape, Rgb};
//!
//! struct Blink {
//!     on: bool,
//! }
//!
//! impl QuadApp for Blink {
//!     fn init(_ctx: &AppContext) -> anyhow::Result<Self> {
//!         Ok(Blink { on: false })
//!     }
//!
//!     fn tick(&mut self, _ctx: &AppContext) {
//!         self.on = !self.on;
//!     }
//!
//!     fn draw(&self, ctx: &mut AppContext) {
//!         if self.on {
//!             ctx.draw(RectShape::new(10.0, 10.0, 40.0, 40.0, Rgb::RED));
//!         }
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     run_app::<Blink>(AppConfig::new("blink"))
//! }
//! ```

mod app;
mod context;
mod runner;

pub use app::QuadApp;
pub use context::AppContext;
pub use runner::{init_logging, run_app, AppConfig, TickTimer};

// Re-export commonly used types for convenience
pub use quadrant_core::{RectShape, Rgb};
pub use quadrant_render::{FrameRenderer, RenderError, RendererConfig};
pub use winit::event::{ElementState, KeyEvent, WindowEvent};
pub use winit::keyboard::{KeyCode, PhysicalKey};
