//! Shapes submitted to the renderer.

use glam::{Mat4, Vec2, Vec4};

use crate::math::{rect_model_matrix, QUAD_CORNERS};

/// An RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);

    /// Create a color from its channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalize to `[0, 1]` with an opaque alpha channel.
    #[inline]
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            1.0,
        )
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

/// Axis-aligned rectangle in pixel space.
///
/// `position` is the top-left corner, y grows downward. A shape only lives for
/// the frame it was submitted in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectShape {
    pub position: Vec2,
    pub size: Vec2,
    pub color: Rgb,
}

impl Default for RectShape {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            color: Rgb::RED,
        }
    }
}

impl RectShape {
    /// Create a rectangle at `(x, y)` with the given extent.
    pub fn new(x: f32, y: f32, width: f32, height: f32, color: Rgb) -> Self {
        Self {
            position: Vec2::new(x, y),
            size: Vec2::new(width, height),
            color,
        }
    }

    /// Move the top-left corner.
    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the extent.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = Vec2::new(width, height);
        self
    }

    /// Set the fill color.
    #[must_use]
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    /// Geometric center of the rectangle.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Model matrix placing the shared unit quad onto this rectangle.
    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        rect_model_matrix(self.position, self.size)
    }

    /// Pixel-space corners produced by transforming the unit quad, in the
    /// order top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Vec2; 4] {
        let model = self.model_matrix();
        QUAD_CORNERS.map(|corner| model.transform_point3(corner.extend(0.0)).truncate())
    }
}
