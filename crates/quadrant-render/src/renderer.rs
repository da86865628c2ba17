//! The frame renderer.
//!
//! [`FrameRenderer`] brings up every GPU object the quad renderer needs, then
//! draws one frame per [`FrameRenderer::render`] call with a single frame in
//! flight. Shapes are queued with [`FrameRenderer::draw`] and become one draw
//! call each, sharing the quad mesh and differing only in push constants.

use crate::config::RendererConfig;
use crate::error::{FrameStage, RenderError, Result};
use crate::frame::{plan_draws, ShapeQueue};
use crate::geometry::QuadMesh;
use crate::push_constants::ObjectPushConstants;
use crate::vertex::QuadVertex;
use ash::vk;
use quadrant_core::{RectShape, Rgb};
use quadrant_gpu::{
    FrameCommands, FrameSync, Framebuffers, GpuContext, GpuContextBuilder, GpuError,
    GraphicsPipeline, GraphicsPipelineConfig, PipelineLayout, RenderPass, ShaderModule,
    ShaderStage, SurfaceContext, Swapchain,
};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Renders queued rectangles to a window.
///
/// Fields are declared in teardown order: each one is dropped before
/// everything it was created from. `Drop` waits for the device to go idle
/// first.
pub struct FrameRenderer {
    mesh: QuadMesh,
    pipeline_layout: PipelineLayout,
    pipeline: GraphicsPipeline,
    // Only referenced by the compiled pipeline, kept alive until after it
    #[allow(dead_code)]
    vertex_shader: ShaderModule,
    #[allow(dead_code)]
    fragment_shader: ShaderModule,
    sync: FrameSync,
    commands: FrameCommands,
    render_pass: RenderPass,
    framebuffers: Framebuffers,
    swapchain: Swapchain,
    #[allow(dead_code)]
    surface: SurfaceContext,
    gpu: GpuContext,

    // Plain values
    shapes: ShapeQueue,
    frame_count: u64,
    frame_timeout_ns: u64,
    clear_color: Rgb,
}

impl FrameRenderer {
    /// Bring up the renderer for `window`.
    ///
    /// Runs context creation, swapchain creation, command and sync setup,
    /// render pass and framebuffer creation, geometry upload, shader loading,
    /// layout creation and pipeline compilation, in that order. The first
    /// failure stops the sequence; everything created before it is released.
    pub fn new<W>(window: &W, config: &RendererConfig) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        if config.width == 0 || config.height == 0 {
            return Err(RenderError::Swapchain(GpuError::InvalidState(format!(
                "output extent {}x{} is empty",
                config.width, config.height
            ))));
        }

        let (gpu, surface) = GpuContextBuilder::new()
            .app_name(config.app_name.clone())
            .validation(config.validation)
            .build_for_window(window)
            .map_err(RenderError::ContextInit)?;

        let swapchain = surface
            .create_swapchain(&gpu, config.width, config.height)
            .map_err(RenderError::Swapchain)?;

        let device = gpu.shared_device();

        let commands = unsafe { FrameCommands::new(device.clone(), gpu.graphics_queue_family()) }
            .map_err(RenderError::SyncOrCommandSetup)?;
        let sync = unsafe { FrameSync::new(&device) }.map_err(RenderError::SyncOrCommandSetup)?;

        let render_pass = unsafe { RenderPass::new_color_only(device.clone(), swapchain.format) }
            .map_err(RenderError::RenderPassOrFramebuffer)?;
        let framebuffers = unsafe {
            Framebuffers::new(
                device.clone(),
                &render_pass,
                &swapchain.image_views,
                swapchain.extent,
            )
        }
        .map_err(RenderError::RenderPassOrFramebuffer)?;

        let mesh = QuadMesh::upload(gpu.allocator()).map_err(RenderError::BufferAlloc)?;

        let vertex_shader = unsafe { ShaderModule::load(device.clone(), &config.vertex_shader) }
            .map_err(RenderError::ShaderLoad)?;
        let fragment_shader =
            unsafe { ShaderModule::load(device.clone(), &config.fragment_shader) }
                .map_err(RenderError::ShaderLoad)?;

        let pipeline_layout =
            unsafe { PipelineLayout::new(device.clone(), &[ObjectPushConstants::range()]) }
                .map_err(RenderError::PipelineCompile)?;

        let pipeline = unsafe {
            GraphicsPipelineConfig::new()
                .with_stage(ShaderStage::vertex(vertex_shader.handle()))
                .with_stage(ShaderStage::fragment(fragment_shader.handle()))
                .with_vertex_input(QuadVertex::vertex_input())
                .with_topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .with_polygon_mode(vk::PolygonMode::FILL)
                .with_full_extent(swapchain.extent)
                .with_layout(pipeline_layout.handle())
                .compile(device, &render_pass)
        }
        .map_err(RenderError::PipelineCompile)?;

        tracing::info!(
            "Renderer ready: {}x{}, {} swapchain images",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.image_count()
        );

        Ok(Self {
            mesh,
            pipeline_layout,
            pipeline,
            vertex_shader,
            fragment_shader,
            sync,
            commands,
            render_pass,
            framebuffers,
            swapchain,
            surface,
            gpu,
            shapes: ShapeQueue::new(),
            frame_count: 0,
            frame_timeout_ns: config.frame_timeout_ns,
            clear_color: config.clear_color,
        })
    }

    /// Queue a shape for the next frame. No GPU work happens here.
    pub fn draw(&mut self, shape: RectShape) {
        self.shapes.push(shape);
    }

    /// Draw every queued shape and present the result.
    ///
    /// The queue is empty afterwards whether or not the frame succeeded. A
    /// failure is not retried and should end the render loop.
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn render(&mut self) -> Result<()> {
        let result = self.render_frame();
        self.shapes.clear();

        if result.is_ok() {
            self.frame_count += 1;
        }
        result
    }

    fn render_frame(&self) -> Result<()> {
        let timeout = self.frame_timeout_ns;
        let queue = self.gpu.graphics_queue();

        unsafe {
            // Sole backpressure: the previous frame must be retired first
            self.sync
                .in_flight
                .wait(timeout)
                .map_err(RenderError::frame(FrameStage::WaitFence))?;
            self.sync
                .in_flight
                .reset()
                .map_err(RenderError::frame(FrameStage::ResetFence))?;

            let (image_index, suboptimal) = self
                .swapchain
                .acquire_next_image(self.sync.image_available.handle(), timeout)
                .map_err(RenderError::frame(FrameStage::Acquire))?;
            if suboptimal {
                tracing::debug!("Acquired image {image_index} from a suboptimal swapchain");
            }

            let draws = plan_draws(self.shapes.as_slice(), self.swapchain.extent);
            self.record(image_index, &draws)
                .map_err(RenderError::frame(FrameStage::Record))?;

            self.commands
                .submit(
                    queue,
                    &[self.sync.image_available.handle()],
                    &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT],
                    &[self.sync.render_finished.handle()],
                    self.sync.in_flight.handle(),
                )
                .map_err(RenderError::frame(FrameStage::Submit))?;

            let suboptimal = self
                .swapchain
                .present(queue, image_index, &[self.sync.render_finished.handle()])
                .map_err(RenderError::frame(FrameStage::Present))?;
            if suboptimal {
                tracing::debug!("Presented to a suboptimal swapchain");
            }

            tracing::trace!(
                "Frame {} presented image {image_index} with {} draws",
                self.frame_count,
                draws.len()
            );
        }

        Ok(())
    }

    /// Re-record the command buffer for swapchain image `image_index`.
    unsafe fn record(
        &self,
        image_index: u32,
        draws: &[ObjectPushConstants],
    ) -> quadrant_gpu::Result<()> {
        let device = self.gpu.device();
        let cmd = self.commands.buffer();

        let framebuffer = self.framebuffers.get(image_index as usize).ok_or_else(|| {
            GpuError::InvalidState(format!("No framebuffer for image {image_index}"))
        })?;

        self.commands.begin()?;

        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue {
                float32: self.clear_color.to_vec4().to_array(),
            },
        }];
        let render_pass_begin = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.swapchain.extent,
            })
            .clear_values(&clear_values);

        device.cmd_begin_render_pass(cmd, &render_pass_begin, vk::SubpassContents::INLINE);
        device.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        device.cmd_bind_vertex_buffers(cmd, 0, &[self.mesh.buffer()], &[0]);

        for draw in draws {
            device.cmd_push_constants(
                cmd,
                self.pipeline_layout.handle(),
                vk::ShaderStageFlags::VERTEX,
                0,
                bytemuck::bytes_of(draw),
            );
            device.cmd_draw(cmd, self.mesh.vertex_count(), 1, 0, 0);
        }

        device.cmd_end_render_pass(cmd);
        self.commands.end()
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of shapes waiting for the next `render`.
    pub fn queued_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Output extent in pixels, as chosen by the surface.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent
    }

    /// Number of images in the swapchain.
    pub fn swapchain_image_count(&self) -> usize {
        self.swapchain.image_count()
    }

    /// Number of framebuffers, one per swapchain image.
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Access the underlying GPU context.
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Shut the renderer down.
    ///
    /// Waits for the device to go idle, then releases every GPU object in
    /// reverse order of creation. Taking `self` makes a second call
    /// impossible.
    pub fn destroy(self) {
        tracing::info!("Destroying renderer after {} frames", self.frame_count);
        drop(self);
    }
}

impl Drop for FrameRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.gpu.wait_idle() {
            tracing::warn!("Device did not go idle before teardown: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raw_window_handle::{DisplayHandle, HandleError, WindowHandle};

    /// A window that never hands out its handles.
    struct NoWindow;

    impl HasDisplayHandle for NoWindow {
        fn display_handle(&self) -> std::result::Result<DisplayHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    impl HasWindowHandle for NoWindow {
        fn window_handle(&self) -> std::result::Result<WindowHandle<'_>, HandleError> {
            Err(HandleError::Unavailable)
        }
    }

    #[test]
    fn empty_extent_is_rejected_before_any_gpu_work() {
        for (width, height) in [(0, 540), (960, 0), (0, 0)] {
            let config = RendererConfig::new(width, height);
            let err = FrameRenderer::new(&NoWindow, &config).err().unwrap();
            assert!(matches!(
                err,
                RenderError::Swapchain(GpuError::InvalidState(_))
            ));
        }
    }
}
