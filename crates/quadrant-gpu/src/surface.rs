//! Surface management for windowed rendering.
//!
//! The surface itself is created by [`GpuContextBuilder::build_for_window`]
//! because device selection depends on it; this module owns it afterwards.
//!
//! [`GpuContextBuilder::build_for_window`]: crate::GpuContextBuilder::build_for_window

use crate::context::GpuContext;
use crate::error::Result;
use crate::swapchain::{calculate_extent, select_surface_format, Swapchain, PRESENT_MODE};
use ash::vk;

/// Surface context for windowed rendering.
///
/// Owns the Vulkan surface and the extension loaders. The surface is
/// destroyed on drop, which must happen before the [`GpuContext`] is dropped.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
    /// Swapchain extension loader.
    pub swapchain_loader: ash::khr::swapchain::Device,
}

impl SurfaceContext {
    pub(crate) fn new(
        gpu: &GpuContext,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
    ) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(gpu.instance(), gpu.device());

        Self {
            surface,
            surface_loader,
            swapchain_loader,
        }
    }

    /// Query surface capabilities.
    pub fn capabilities(&self, gpu: &GpuContext) -> Result<SurfaceCapabilities> {
        unsafe {
            let caps = self
                .surface_loader
                .get_physical_device_surface_capabilities(gpu.physical_device(), self.surface)?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(gpu.physical_device(), self.surface)?;

            Ok(SurfaceCapabilities {
                capabilities: caps,
                formats,
            })
        }
    }

    /// Create the FIFO swapchain for this surface.
    ///
    /// `width` and `height` should match the window's pixel size. Failure is
    /// returned as-is; no smaller extent is attempted.
    pub fn create_swapchain(&self, gpu: &GpuContext, width: u32, height: u32) -> Result<Swapchain> {
        let caps = self.capabilities(gpu)?;

        let surface_format = select_surface_format(&caps.formats)?;
        let extent = calculate_extent(&caps.capabilities, width, height);

        if extent.width != width || extent.height != height {
            tracing::warn!(
                "Requested {width}x{height} but surface dictates {}x{}",
                extent.width,
                extent.height
            );
        }

        unsafe {
            Swapchain::new(
                gpu.shared_device(),
                self.swapchain_loader.clone(),
                self.surface,
                &caps.capabilities,
                surface_format,
                PRESENT_MODE,
                extent,
                gpu.graphics_queue_family(),
            )
        }
    }
}

impl Drop for SurfaceContext {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
        tracing::trace!("Surface destroyed");
    }
}

/// Surface capabilities query result.
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
}
