//! Single-frame quad renderer.
//!
//! This crate provides:
//! - The static quad mesh and its vertex layout
//! - The per-draw push-constant payload
//! - Per-frame draw planning from queued rectangles
//! - [`FrameRenderer`], which owns every GPU object and draws each frame

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod push_constants;
pub mod renderer;
pub mod vertex;

pub use config::{RendererConfig, DEFAULT_FRAME_TIMEOUT};
pub use error::{FrameStage, RenderError, Result};
pub use frame::{plan_draws, ShapeQueue};
pub use geometry::QuadMesh;
pub use push_constants::ObjectPushConstants;
pub use quadrant_core::{RectShape, Rgb};
pub use renderer::FrameRenderer;
pub use vertex::{QuadVertex, QUAD_VERTICES};
