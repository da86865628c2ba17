//! Color-only render pass and per-image framebuffers.

use crate::error::Result;
use ash::vk;
use std::sync::Arc;

/// Description of the single color attachment: cleared on load, stored on
/// store, undefined on entry and ready to present on exit.
pub fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

/// Render pass with one color attachment and one graphics subpass.
pub struct RenderPass {
    render_pass: vk::RenderPass,
    device: Arc<ash::Device>,
}

impl RenderPass {
    /// Create the color-only render pass for images of `format`.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new_color_only(device: Arc<ash::Device>, format: vk::Format) -> Result<Self> {
        let attachments = [color_attachment(format)];

        let color_refs = [vk::AttachmentReference::default()
            .attachment(0)
            .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)];

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses);

        let render_pass = device.create_render_pass(&create_info, None)?;
        tracing::debug!("Render pass created for {format:?}");

        Ok(Self {
            render_pass,
            device,
        })
    }

    /// Get the raw render pass handle.
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_render_pass(self.render_pass, None);
        }
        tracing::trace!("Render pass destroyed");
    }
}

/// One single-layer framebuffer per swapchain image view.
pub struct Framebuffers {
    framebuffers: Vec<vk::Framebuffer>,
    device: Arc<ash::Device>,
}

impl Framebuffers {
    /// Build one framebuffer per view.
    ///
    /// The batch is all-or-nothing: if any creation fails, the framebuffers
    /// already built are destroyed and the error is returned.
    ///
    /// # Safety
    /// The render pass and views must be valid and compatible.
    pub unsafe fn new(
        device: Arc<ash::Device>,
        render_pass: &RenderPass,
        views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let mut this = Self {
            framebuffers: Vec::with_capacity(views.len()),
            device,
        };

        for view in views {
            let attachments = std::slice::from_ref(view);
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            // Dropping `this` on error releases the partial batch
            let framebuffer = this.device.create_framebuffer(&create_info, None)?;
            this.framebuffers.push(framebuffer);
        }

        tracing::debug!(
            "{} framebuffers created ({}x{})",
            this.framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(this)
    }

    /// Framebuffer targeting swapchain image `index`.
    pub fn get(&self, index: usize) -> Option<vk::Framebuffer> {
        self.framebuffers.get(index).copied()
    }

    /// Number of framebuffers.
    pub fn len(&self) -> usize {
        self.framebuffers.len()
    }

    /// Returns `true` if there are no framebuffers.
    pub fn is_empty(&self) -> bool {
        self.framebuffers.is_empty()
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.destroy_framebuffer(framebuffer, None);
            }
        }
        tracing::trace!("{} framebuffers destroyed", self.framebuffers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_attachment_clears_and_presents() {
        let attachment = color_attachment(vk::Format::B8G8R8A8_SRGB);

        assert_eq!(attachment.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(attachment.samples, vk::SampleCountFlags::TYPE_1);
        assert_eq!(attachment.load_op, vk::AttachmentLoadOp::CLEAR);
        assert_eq!(attachment.store_op, vk::AttachmentStoreOp::STORE);
        assert_eq!(attachment.initial_layout, vk::ImageLayout::UNDEFINED);
        assert_eq!(attachment.final_layout, vk::ImageLayout::PRESENT_SRC_KHR);
    }
}
