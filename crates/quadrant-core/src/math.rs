//! Screen-space math.
//!
//! Pixel space has its origin in the top-left corner of the output with y
//! pointing down. The projection below maps `y = 0` to clip-space `-1`, which
//! Vulkan rasterizes at the top of the framebuffer, so no y-flip is needed.

use glam::{Mat4, Vec2, Vec3};

/// Near plane of the screen projection. Depth is unused, the value is nominal.
pub const NEAR_PLANE: f32 = 0.1;

/// Far plane of the screen projection.
pub const FAR_PLANE: f32 = 100.0;

/// View-space depth at which every shape is placed.
pub const SHAPE_DEPTH: f32 = -1.0;

/// Corners of the shared unit quad in the order top-left, top-right,
/// bottom-right, bottom-left (pixel-space orientation).
pub const QUAD_CORNERS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(-1.0, 1.0),
];

/// Orthographic projection covering `width x height` pixels.
#[inline]
pub fn screen_projection(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, 0.0, height, NEAR_PLANE, FAR_PLANE)
}

/// Model matrix mapping the unit quad (`[-1, 1]` on both axes) onto the pixel
/// rectangle whose top-left corner is `position` and whose extent is `size`.
///
/// The quad is translated to the rectangle center and scaled by the half
/// extents. The z scale is zero, flattening the quad onto [`SHAPE_DEPTH`].
#[inline]
pub fn rect_model_matrix(position: Vec2, size: Vec2) -> Mat4 {
    let half = size * 0.5;
    let center = position + half;

    Mat4::from_translation(Vec3::new(center.x, center.y, SHAPE_DEPTH))
        * Mat4::from_scale(Vec3::new(half.x, half.y, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn model_matrix_translation_and_scale() {
        let model = rect_model_matrix(Vec2::ZERO, Vec2::new(40.0, 40.0));

        assert_eq!(model.w_axis.truncate(), Vec3::new(20.0, 20.0, -1.0));
        assert_eq!(model.x_axis.x, 20.0);
        assert_eq!(model.y_axis.y, 20.0);
        assert_eq!(model.z_axis.z, 0.0);
    }

    #[test]
    fn model_matrix_maps_quad_onto_rect() {
        let position = Vec2::new(13.5, 250.0);
        let size = Vec2::new(64.0, 17.25);
        let model = rect_model_matrix(position, size);

        let expected = [
            position,
            position + Vec2::new(size.x, 0.0),
            position + size,
            position + Vec2::new(0.0, size.y),
        ];

        for (corner, want) in QUAD_CORNERS.iter().zip(expected) {
            let got = model.transform_point3(corner.extend(0.0));
            assert!(got.truncate().abs_diff_eq(want, 1e-4), "{got} != {want}");
            assert_abs_diff_eq!(got.z, SHAPE_DEPTH);
        }
    }

    #[test]
    fn projection_maps_top_left_to_clip_origin_corner() {
        let projection = screen_projection(960.0, 540.0);

        let top_left = projection.project_point3(Vec3::new(0.0, 0.0, SHAPE_DEPTH));
        assert_abs_diff_eq!(top_left.x, -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(top_left.y, -1.0, epsilon = 1e-6);

        let bottom_right = projection.project_point3(Vec3::new(960.0, 540.0, SHAPE_DEPTH));
        assert_abs_diff_eq!(bottom_right.x, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bottom_right.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn shape_depth_lies_inside_clip_volume() {
        let projection = screen_projection(100.0, 100.0);
        let p = projection.project_point3(Vec3::new(50.0, 50.0, SHAPE_DEPTH));
        assert!((0.0..=1.0).contains(&p.z), "depth {} outside [0, 1]", p.z);
    }
}
