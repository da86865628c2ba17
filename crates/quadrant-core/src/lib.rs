//! Core types and math for the Quadrant renderer.
//!
//! This crate provides the GPU-independent pieces of the renderer:
//! - Rectangle shapes and 8-bit RGB colors
//! - The screen-space orthographic projection
//! - Per-shape model matrices that map the shared unit quad onto a pixel rectangle

pub mod math;
pub mod shape;

pub use math::{rect_model_matrix, screen_projection, QUAD_CORNERS};
pub use shape::{RectShape, Rgb};
