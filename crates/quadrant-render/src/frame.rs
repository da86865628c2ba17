//! Per-frame shape queue and draw planning.

use crate::push_constants::ObjectPushConstants;
use ash::vk;
use glam::Mat4;
use quadrant_core::{screen_projection, RectShape};

/// Shapes submitted for the next frame.
///
/// Shapes live for exactly one frame: `render` clears the queue whether or
/// not the frame succeeds.
#[derive(Debug, Default)]
pub struct ShapeQueue {
    shapes: Vec<RectShape>,
}

impl ShapeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: RectShape) {
        self.shapes.push(shape);
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn as_slice(&self) -> &[RectShape] {
        &self.shapes
    }

    /// Drop every queued shape, keeping the allocation around.
    pub fn clear(&mut self) {
        self.shapes.clear();
    }
}

/// Push constants for each shape, in submission order.
///
/// The view matrix is the identity, so each MVP is `projection * model`.
pub fn plan_draws(shapes: &[RectShape], extent: vk::Extent2D) -> Vec<ObjectPushConstants> {
    let projection = screen_projection(extent.width as f32, extent.height as f32);
    let view = Mat4::IDENTITY;

    shapes
        .iter()
        .map(|shape| {
            ObjectPushConstants::new(shape.color.to_vec4(), projection * view * shape.model_matrix())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::{Vec3, Vec4};
    use quadrant_core::Rgb;

    const EXTENT: vk::Extent2D = vk::Extent2D {
        width: 960,
        height: 540,
    };

    fn assert_color(got: Vec4, expected: Vec4) {
        for i in 0..4 {
            assert_relative_eq!(got[i], expected[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn single_red_square() {
        let shape = RectShape::new(0.0, 0.0, 40.0, 40.0, Rgb::new(255, 0, 0));
        let draws = plan_draws(&[shape], EXTENT);
        assert_eq!(draws.len(), 1);

        assert_color(draws[0].color(), Vec4::new(1.0, 0.0, 0.0, 1.0));

        // Undo the projection to recover the model matrix
        let projection = screen_projection(960.0, 540.0);
        let model = projection.inverse() * draws[0].mvp();

        assert_relative_eq!(model.w_axis.x, 20.0, epsilon = 1e-3);
        assert_relative_eq!(model.w_axis.y, 20.0, epsilon = 1e-3);
        assert_relative_eq!(model.w_axis.z, -1.0, epsilon = 1e-3);
        assert_relative_eq!(model.x_axis.x, 20.0, epsilon = 1e-3);
        assert_relative_eq!(model.y_axis.y, 20.0, epsilon = 1e-3);
        assert_relative_eq!(model.z_axis.z, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn colors_are_normalized() {
        let shape = RectShape::default().with_color(Rgb::new(51, 102, 255));
        let draws = plan_draws(&[shape], EXTENT);

        assert_color(draws[0].color(), Vec4::new(0.2, 0.4, 1.0, 1.0));
    }

    #[test]
    fn corners_land_in_clip_space() {
        let shape = RectShape::new(0.0, 0.0, 960.0, 540.0, Rgb::WHITE);
        let draws = plan_draws(&[shape], EXTENT);
        let mvp = draws[0].mvp();

        // The full-window rectangle covers the whole clip square
        let top_left = mvp.project_point3(Vec3::new(-1.0, -1.0, 0.0));
        let bottom_right = mvp.project_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(top_left.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(top_left.y, -1.0, epsilon = 1e-5);
        assert_relative_eq!(bottom_right.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(bottom_right.y, 1.0, epsilon = 1e-5);
        assert!((0.0..=1.0).contains(&top_left.z));
    }

    #[test]
    fn order_is_preserved() {
        let shapes: Vec<_> = (0..5u8)
            .map(|i| RectShape::default().with_color(Rgb::new(i, 0, 0)))
            .collect();
        let draws = plan_draws(&shapes, EXTENT);

        for (i, draw) in draws.iter().enumerate() {
            assert_relative_eq!(draw.color[0], i as f32 / 255.0);
        }
    }

    #[test]
    fn empty_frame_plans_nothing() {
        assert!(plan_draws(&[], EXTENT).is_empty());
    }

    #[test]
    fn queue_clears_completely() {
        let mut queue = ShapeQueue::new();
        for _ in 0..3 {
            queue.push(RectShape::default());
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.as_slice()[0], RectShape::default());

        queue.clear();
        assert!(queue.is_empty());
    }
}
