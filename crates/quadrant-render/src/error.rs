//! Renderer error taxonomy.
//!
//! Each initialization step and each per-frame step has its own variant so
//! callers can tell where startup or a frame failed. The underlying
//! [`GpuError`] is kept as the source.

use quadrant_gpu::GpuError;
use std::fmt;
use thiserror::Error;

/// Step of `FrameRenderer::render` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    WaitFence,
    ResetFence,
    Acquire,
    Record,
    Submit,
    Present,
}

impl fmt::Display for FrameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitFence => "fence wait",
            Self::ResetFence => "fence reset",
            Self::Acquire => "image acquire",
            Self::Record => "command recording",
            Self::Submit => "queue submit",
            Self::Present => "present",
        };
        f.write_str(name)
    }
}

/// Renderer errors.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Instance, device, allocator or surface creation failed.
    #[error("Context initialization failed: {0}")]
    ContextInit(#[source] GpuError),

    #[error("Swapchain creation failed: {0}")]
    Swapchain(#[source] GpuError),

    /// Command pool, command buffer, fence or semaphore creation failed.
    #[error("Command or sync setup failed: {0}")]
    SyncOrCommandSetup(#[source] GpuError),

    #[error("Render pass or framebuffer creation failed: {0}")]
    RenderPassOrFramebuffer(#[source] GpuError),

    /// A shader binary was missing, unreadable or rejected.
    #[error("Shader load failed: {0}")]
    ShaderLoad(#[source] GpuError),

    /// Pipeline layout creation or pipeline compilation failed.
    #[error("Pipeline compilation failed: {0}")]
    PipelineCompile(#[source] GpuError),

    #[error("Vertex buffer allocation failed: {0}")]
    BufferAlloc(#[source] GpuError),

    /// A per-frame step failed. Frames are never retried.
    #[error("Frame {stage} failed: {source}")]
    FrameOperation {
        stage: FrameStage,
        #[source]
        source: GpuError,
    },
}

impl RenderError {
    pub(crate) fn frame(stage: FrameStage) -> impl FnOnce(GpuError) -> Self {
        move |source| Self::FrameOperation { stage, source }
    }

    /// Short name of the step that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::ContextInit(_) => "context",
            Self::Swapchain(_) => "swapchain",
            Self::SyncOrCommandSetup(_) => "command/sync",
            Self::RenderPassOrFramebuffer(_) => "render pass/framebuffers",
            Self::ShaderLoad(_) => "shader load",
            Self::PipelineCompile(_) => "pipeline",
            Self::BufferAlloc(_) => "vertex buffer",
            Self::FrameOperation { stage, .. } => match stage {
                FrameStage::WaitFence => "frame: fence wait",
                FrameStage::ResetFence => "frame: fence reset",
                FrameStage::Acquire => "frame: acquire",
                FrameStage::Record => "frame: record",
                FrameStage::Submit => "frame: submit",
                FrameStage::Present => "frame: present",
            },
        }
    }

    /// Returns `true` if this error came from a bounded wait running out.
    pub fn is_timeout(&self) -> bool {
        matches!(self.gpu_error(), GpuError::Timeout(_))
    }

    /// The underlying GPU error.
    pub fn gpu_error(&self) -> &GpuError {
        match self {
            Self::ContextInit(e)
            | Self::Swapchain(e)
            | Self::SyncOrCommandSetup(e)
            | Self::RenderPassOrFramebuffer(e)
            | Self::ShaderLoad(e)
            | Self::PipelineCompile(e)
            | Self::BufferAlloc(e) => e,
            Self::FrameOperation { source, .. } => source,
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk;

    #[test]
    fn frame_errors_name_their_stage() {
        let err = RenderError::frame(FrameStage::Acquire)(GpuError::Timeout(5));
        assert_eq!(err.stage(), "frame: acquire");
        assert!(err.is_timeout());
        assert!(err.to_string().contains("image acquire"));
    }

    #[test]
    fn source_is_preserved() {
        let err = RenderError::Swapchain(GpuError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR));
        assert_eq!(err.stage(), "swapchain");
        assert!(!err.is_timeout());
        assert!(std::error::Error::source(&err).is_some());
        assert!(matches!(
            err.gpu_error(),
            GpuError::Vulkan(vk::Result::ERROR_SURFACE_LOST_KHR)
        ));
    }
}
