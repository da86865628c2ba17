//! Vulkan resource layer for the Quadrant renderer.
//!
//! This crate provides:
//! - Vulkan instance, debug messenger and device management
//! - GPU capability detection
//! - Memory allocation via gpu-allocator
//! - Surface and FIFO swapchain handling
//! - Per-frame command recording, fences and semaphores
//! - Render pass, framebuffers, shader modules and graphics pipelines
//!
//! Every native object is owned by a value that releases it on drop.

pub mod capabilities;
pub mod command;
pub mod context;
pub mod debug;
pub mod error;
pub mod instance;
pub mod memory;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use capabilities::{GpuCapabilities, GpuVendor};
pub use command::FrameCommands;
pub use context::{GpuContext, GpuContextBuilder};
pub use error::{GpuError, Result};
pub use memory::{GpuAllocator, GpuBuffer};
pub use pipeline::{
    GraphicsPipeline, GraphicsPipelineConfig, PipelineLayout, ShaderStage, VertexInput,
};
pub use render_pass::{Framebuffers, RenderPass};
pub use shader::ShaderModule;
pub use surface::{SurfaceCapabilities, SurfaceContext};
pub use swapchain::Swapchain;
pub use sync::{Fence, FrameSync, Semaphore};
