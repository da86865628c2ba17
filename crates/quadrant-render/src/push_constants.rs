//! Per-draw push-constant payload.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Color followed by the column-major MVP matrix, visible to the vertex stage.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectPushConstants {
    pub color: [f32; 4],
    pub mvp: [[f32; 4]; 4],
}

impl ObjectPushConstants {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(color: Vec4, mvp: Mat4) -> Self {
        Self {
            color: color.to_array(),
            mvp: mvp.to_cols_array_2d(),
        }
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }

    pub fn mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp)
    }

    /// The range the pipeline layout must declare.
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX,
            offset: 0,
            size: Self::SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::offset_of;

    #[test]
    fn wire_layout() {
        assert_eq!(ObjectPushConstants::SIZE, 80);
        assert_eq!(offset_of!(ObjectPushConstants, color), 0);
        assert_eq!(offset_of!(ObjectPushConstants, mvp), 16);
    }

    #[test]
    fn matrix_is_column_major() {
        let mvp = Mat4::from_translation(glam::Vec3::new(7.0, 8.0, 9.0));
        let push = ObjectPushConstants::new(Vec4::ONE, mvp);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&push));

        // Translation lives in the fourth column: floats 12..15 of the matrix
        assert_eq!(&floats[4 + 12..4 + 15], &[7.0, 8.0, 9.0]);
        assert_eq!(push.mvp(), mvp);
    }

    #[test]
    fn range_covers_payload() {
        let range = ObjectPushConstants::range();
        assert_eq!(range.offset, 0);
        assert_eq!(range.size, 80);
        assert_eq!(range.stage_flags, vk::ShaderStageFlags::VERTEX);
    }
}
