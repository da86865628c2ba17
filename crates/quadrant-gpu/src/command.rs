//! Command recording for a single frame in flight.

use crate::error::{GpuError, Result};
use ash::vk;
use std::sync::Arc;

/// A command pool and the one primary buffer re-recorded every frame.
///
/// The pool is created with `RESET_COMMAND_BUFFER`; destroying it on drop
/// also frees the buffer.
pub struct FrameCommands {
    buffer: vk::CommandBuffer,
    pool: vk::CommandPool,
    device: Arc<ash::Device>,
}

impl FrameCommands {
    /// Create the pool on `queue_family` and allocate its buffer.
    ///
    /// # Safety
    /// The device must be valid and the queue family must exist.
    pub unsafe fn new(device: Arc<ash::Device>, queue_family: u32) -> Result<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let pool = device.create_command_pool(&create_info, None)?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let buffer = match device.allocate_command_buffers(&alloc_info) {
            Ok(buffers) => buffers.into_iter().next(),
            Err(e) => {
                device.destroy_command_pool(pool, None);
                return Err(e.into());
            }
        };
        let Some(buffer) = buffer else {
            device.destroy_command_pool(pool, None);
            return Err(GpuError::InvalidState(
                "Driver returned no command buffer".to_string(),
            ));
        };

        tracing::debug!("Frame command buffer allocated on queue family {queue_family}");

        Ok(Self {
            buffer,
            pool,
            device,
        })
    }

    /// The raw command buffer, for `cmd_*` calls between `begin` and `end`.
    pub fn buffer(&self) -> vk::CommandBuffer {
        self.buffer
    }

    /// Discard the previous recording and start a one-time-submit one.
    ///
    /// # Safety
    /// The buffer must not be pending on a queue.
    pub unsafe fn begin(&self) -> Result<()> {
        self.device
            .reset_command_buffer(self.buffer, vk::CommandBufferResetFlags::empty())?;
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(self.buffer, &begin_info)?;
        Ok(())
    }

    /// Finish recording.
    ///
    /// # Safety
    /// Recording must have been started with [`FrameCommands::begin`].
    pub unsafe fn end(&self) -> Result<()> {
        self.device.end_command_buffer(self.buffer)?;
        Ok(())
    }

    /// Submit the recorded buffer to `queue`.
    ///
    /// Each semaphore in `waits` is waited on at the matching entry of
    /// `wait_stages`. `signals` and `fence` are signaled on completion.
    ///
    /// # Safety
    /// All handles must be valid and the buffer must be fully recorded.
    #[cfg_attr(feature = "profiling-tracy", tracing::instrument(level = "trace", skip_all))]
    pub unsafe fn submit(
        &self,
        queue: vk::Queue,
        waits: &[vk::Semaphore],
        wait_stages: &[vk::PipelineStageFlags],
        signals: &[vk::Semaphore],
        fence: vk::Fence,
    ) -> Result<()> {
        check_wait_stages(waits, wait_stages)?;

        let buffers = [self.buffer];
        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&buffers)
            .wait_semaphores(waits)
            .wait_dst_stage_mask(wait_stages)
            .signal_semaphores(signals);

        self.device.queue_submit(queue, &[submit_info], fence)?;
        Ok(())
    }
}

impl Drop for FrameCommands {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_command_pool(self.pool, None);
        }
        tracing::trace!("Frame command pool destroyed");
    }
}

/// Every wait semaphore needs exactly one stage mask.
fn check_wait_stages(
    waits: &[vk::Semaphore],
    wait_stages: &[vk::PipelineStageFlags],
) -> Result<()> {
    if waits.len() == wait_stages.len() {
        Ok(())
    } else {
        Err(GpuError::InvalidState(format!(
            "{} wait semaphores but {} wait stages",
            waits.len(),
            wait_stages.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_stages_must_pair_with_semaphores() {
        assert!(check_wait_stages(&[], &[]).is_ok());
        assert!(check_wait_stages(
            &[vk::Semaphore::null()],
            &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT]
        )
        .is_ok());

        let err = check_wait_stages(&[vk::Semaphore::null()], &[]).unwrap_err();
        assert!(matches!(err, GpuError::InvalidState(_)));
    }
}
