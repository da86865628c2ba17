//! The static quad mesh shared by every shape.

use crate::vertex::{QuadVertex, QUAD_VERTICES, QUAD_VERTEX_COUNT};
use ash::vk;
use gpu_allocator::MemoryLocation;
use parking_lot::Mutex;
use quadrant_gpu::error::Result;
use quadrant_gpu::memory::{GpuAllocator, GpuBuffer};
use std::sync::Arc;

/// Size in bytes of the quad vertex buffer.
pub const QUAD_BUFFER_SIZE: u64 = QUAD_VERTEX_COUNT as u64 * QuadVertex::SIZE as u64;

/// Host-visible vertex buffer holding [`QUAD_VERTICES`].
///
/// Written once at upload and never touched again. The buffer and its
/// allocation are returned to the allocator on drop.
pub struct QuadMesh {
    buffer: GpuBuffer,
    allocator: Arc<Mutex<GpuAllocator>>,
}

impl QuadMesh {
    /// Allocate the vertex buffer and copy the quad into it.
    pub fn upload(allocator: &Arc<Mutex<GpuAllocator>>) -> Result<Self> {
        let mut buffer = allocator.lock().create_buffer(
            QUAD_BUFFER_SIZE,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            MemoryLocation::CpuToGpu,
            "quad_vertices",
        )?;

        if let Err(e) = buffer.write(&QUAD_VERTICES) {
            allocator.lock().free_buffer(&mut buffer)?;
            return Err(e);
        }

        tracing::debug!("Quad mesh uploaded ({QUAD_BUFFER_SIZE} bytes)");

        Ok(Self {
            buffer,
            allocator: Arc::clone(allocator),
        })
    }

    /// Get the raw vertex buffer handle.
    pub fn buffer(&self) -> vk::Buffer {
        self.buffer.buffer
    }

    pub fn vertex_count(&self) -> u32 {
        QUAD_VERTEX_COUNT
    }
}

impl Drop for QuadMesh {
    fn drop(&mut self) {
        if let Err(e) = self.allocator.lock().free_buffer(&mut self.buffer) {
            tracing::warn!("Failed to free quad mesh: {e}");
        }
        tracing::trace!("Quad mesh destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_holds_exactly_six_vertices() {
        assert_eq!(QUAD_BUFFER_SIZE, 6 * 24);
        assert_eq!(
            QUAD_BUFFER_SIZE as usize,
            std::mem::size_of_val(&QUAD_VERTICES)
        );
    }
}
