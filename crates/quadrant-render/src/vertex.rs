//! Vertex format of the shared quad mesh.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use quadrant_gpu::VertexInput;
use std::mem::offset_of;

/// Interleaved position and color.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl QuadVertex {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    const fn new(x: f32, y: f32) -> Self {
        // Placeholder color; the draw tint comes from push constants
        Self {
            position: [x, y, 0.0],
            color: [1.0, 0.0, 0.0],
        }
    }

    /// The single per-vertex binding.
    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: Self::SIZE,
            input_rate: vk::VertexInputRate::VERTEX,
        }
    }

    /// Position at location 0, color at location 1.
    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 2] {
        [
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(Self, color) as u32,
            },
        ]
    }

    /// Vertex input state for pipeline configuration.
    pub fn vertex_input() -> VertexInput {
        VertexInput {
            bindings: vec![Self::binding_description()],
            attributes: Self::attribute_descriptions().to_vec(),
        }
    }
}

/// Two triangles covering [-1, 1] x [-1, 1] at z = 0.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex::new(-1.0, 1.0),
    QuadVertex::new(1.0, 1.0),
    QuadVertex::new(1.0, -1.0),
    QuadVertex::new(1.0, -1.0),
    QuadVertex::new(-1.0, -1.0),
    QuadVertex::new(-1.0, 1.0),
];

/// Vertices issued per shape.
pub const QUAD_VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_two_vec3() {
        assert_eq!(QuadVertex::SIZE, 24);

        let binding = QuadVertex::binding_description();
        assert_eq!(binding.stride, 24);
        assert_eq!(binding.input_rate, vk::VertexInputRate::VERTEX);

        let [position, color] = QuadVertex::attribute_descriptions();
        assert_eq!((position.location, position.offset), (0, 0));
        assert_eq!((color.location, color.offset), (1, 12));
        assert_eq!(position.format, vk::Format::R32G32B32_SFLOAT);
        assert_eq!(color.format, vk::Format::R32G32B32_SFLOAT);
    }

    #[test]
    fn quad_covers_unit_square() {
        assert_eq!(QUAD_VERTEX_COUNT, 6);
        for vertex in &QUAD_VERTICES {
            assert_eq!(vertex.position[0].abs(), 1.0);
            assert_eq!(vertex.position[1].abs(), 1.0);
            assert_eq!(vertex.position[2], 0.0);
        }

        // All four corners appear
        for corner in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            assert!(QUAD_VERTICES
                .iter()
                .any(|v| (v.position[0], v.position[1]) == corner));
        }
    }

    #[test]
    fn triangles_share_winding() {
        let signed_area = |t: &[QuadVertex]| {
            let [ax, ay, _] = t[0].position;
            let [bx, by, _] = t[1].position;
            let [cx, cy, _] = t[2].position;
            (bx - ax) * (cy - ay) - (by - ay) * (cx - ax)
        };
        let first = signed_area(&QUAD_VERTICES[0..3]);
        let second = signed_area(&QUAD_VERTICES[3..6]);
        assert!(first != 0.0);
        assert_eq!(first.signum(), second.signum());
    }
}
