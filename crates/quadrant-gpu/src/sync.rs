//! Synchronization primitives.

use crate::error::{GpuError, Result};
use ash::vk;
use std::sync::Arc;

/// Host-visible completion signal, destroyed on drop.
pub struct Fence {
    fence: vk::Fence,
    device: Arc<ash::Device>,
}

impl Fence {
    /// Create a fence, optionally already signaled.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new(device: Arc<ash::Device>, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = device.create_fence(&create_info, None)?;
        Ok(Self { fence, device })
    }

    /// Get the raw fence handle.
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Wait for the fence to be signaled, for at most `timeout_ns`.
    ///
    /// # Safety
    /// The fence must belong to this device.
    #[cfg_attr(feature = "profiling-tracy", tracing::instrument(level = "trace", skip_all))]
    pub unsafe fn wait(&self, timeout_ns: u64) -> Result<()> {
        match self.device.wait_for_fences(&[self.fence], true, timeout_ns) {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(GpuError::Timeout(timeout_ns)),
            Err(e) => Err(GpuError::from(e)),
        }
    }

    /// Reset the fence to unsignaled state.
    ///
    /// # Safety
    /// The fence must not be pending on a queue.
    #[cfg_attr(feature = "profiling-tracy", tracing::instrument(level = "trace", skip_all))]
    pub unsafe fn reset(&self) -> Result<()> {
        self.device.reset_fences(&[self.fence])?;
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// GPU-side ordering primitive, destroyed on drop.
pub struct Semaphore {
    semaphore: vk::Semaphore,
    device: Arc<ash::Device>,
}

impl Semaphore {
    /// Create a binary semaphore.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new(device: Arc<ash::Device>) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = device.create_semaphore(&create_info, None)?;
        Ok(Self { semaphore, device })
    }

    /// Get the raw semaphore handle.
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Synchronization for a single frame in flight.
///
/// Field order is drop order: the fence goes first, then both semaphores.
pub struct FrameSync {
    /// Fence signaled when the frame's GPU work completes. Created signaled
    /// so the first wait returns immediately.
    pub in_flight: Fence,
    /// Semaphore signaled when the swapchain image is available
    pub image_available: Semaphore,
    /// Semaphore signaled when rendering is complete
    pub render_finished: Semaphore,
}

impl FrameSync {
    /// Create frame synchronization resources.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new(device: &Arc<ash::Device>) -> Result<Self> {
        Ok(Self {
            in_flight: Fence::new(Arc::clone(device), true)?,
            image_available: Semaphore::new(Arc::clone(device))?,
            render_finished: Semaphore::new(Arc::clone(device))?,
        })
    }
}
