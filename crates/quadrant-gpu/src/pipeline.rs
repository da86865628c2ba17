//! Pipeline layout and graphics pipeline creation.
//!
//! A [`GraphicsPipelineConfig`] is an immutable value describing every
//! configurable aspect of the pipeline. [`GraphicsPipelineConfig::compile`]
//! turns it into a [`GraphicsPipeline`] against a render pass. The pipeline
//! owns only the pipeline object; the layout and shader modules it references
//! are owned by the caller and must outlive it.

use crate::error::{GpuError, Result};
use crate::render_pass::RenderPass;
use ash::vk;
use std::ffi::CStr;
use std::sync::Arc;

/// Entry point name used for every shader stage.
pub const SHADER_ENTRY_POINT: &CStr = c"main";

/// Pipeline layout with push-constant ranges and no descriptor sets.
pub struct PipelineLayout {
    layout: vk::PipelineLayout,
    device: Arc<ash::Device>,
}

impl PipelineLayout {
    /// Create a layout exposing `push_constant_ranges`.
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn new(
        device: Arc<ash::Device>,
        push_constant_ranges: &[vk::PushConstantRange],
    ) -> Result<Self> {
        let layout_info =
            vk::PipelineLayoutCreateInfo::default().push_constant_ranges(push_constant_ranges);

        let layout = device
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| GpuError::PipelineCreation(e.to_string()))?;

        Ok(Self { layout, device })
    }

    /// Get the raw layout handle.
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

/// One programmable stage of the pipeline.
#[derive(Clone, Copy, Debug)]
pub struct ShaderStage {
    pub stage: vk::ShaderStageFlags,
    pub module: vk::ShaderModule,
}

impl ShaderStage {
    pub fn vertex(module: vk::ShaderModule) -> Self {
        Self {
            stage: vk::ShaderStageFlags::VERTEX,
            module,
        }
    }

    pub fn fragment(module: vk::ShaderModule) -> Self {
        Self {
            stage: vk::ShaderStageFlags::FRAGMENT,
            module,
        }
    }
}

/// Vertex bindings and attributes.
#[derive(Clone, Debug, Default)]
pub struct VertexInput {
    pub bindings: Vec<vk::VertexInputBindingDescription>,
    pub attributes: Vec<vk::VertexInputAttributeDescription>,
}

/// Graphics pipeline configuration.
///
/// Unset aspects fall back to: no vertex input, triangle list, fill mode.
/// Stages, viewport, scissor and layout are required. Depth clamp, culling,
/// front face, line width, multisampling and blending are fixed.
#[derive(Clone, Debug, Default)]
pub struct GraphicsPipelineConfig {
    pub stages: Vec<ShaderStage>,
    pub vertex_input: Option<VertexInput>,
    pub topology: Option<vk::PrimitiveTopology>,
    pub polygon_mode: Option<vk::PolygonMode>,
    pub viewport: Option<vk::Viewport>,
    pub scissor: Option<vk::Rect2D>,
    pub layout: Option<vk::PipelineLayout>,
}

impl GraphicsPipelineConfig {
    /// Start an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_stage(mut self, stage: ShaderStage) -> Self {
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn with_vertex_input(mut self, vertex_input: VertexInput) -> Self {
        self.vertex_input = Some(vertex_input);
        self
    }

    #[must_use]
    pub fn with_topology(mut self, topology: vk::PrimitiveTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    #[must_use]
    pub fn with_polygon_mode(mut self, polygon_mode: vk::PolygonMode) -> Self {
        self.polygon_mode = Some(polygon_mode);
        self
    }

    /// Set viewport and scissor to cover `extent`, with depth range [0, 1].
    #[must_use]
    pub fn with_full_extent(mut self, extent: vk::Extent2D) -> Self {
        self.viewport = Some(full_viewport(extent));
        self.scissor = Some(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        });
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: vk::Viewport) -> Self {
        self.viewport = Some(viewport);
        self
    }

    #[must_use]
    pub fn with_scissor(mut self, scissor: vk::Rect2D) -> Self {
        self.scissor = Some(scissor);
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: vk::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Check that every required aspect is present and usable.
    pub fn validate(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(GpuError::PipelineCreation("no shader stages".to_string()));
        }
        if let Some(stage) = self.stages.iter().find(|s| s.module == vk::ShaderModule::null()) {
            return Err(GpuError::PipelineCreation(format!(
                "null shader module for stage {:?}",
                stage.stage
            )));
        }
        if self.viewport.is_none() || self.scissor.is_none() {
            return Err(GpuError::PipelineCreation(
                "viewport and scissor must be set".to_string(),
            ));
        }
        match self.layout {
            Some(layout) if layout != vk::PipelineLayout::null() => Ok(()),
            _ => Err(GpuError::PipelineCreation("pipeline layout not set".to_string())),
        }
    }

    /// Compile this configuration against subpass 0 of `render_pass`.
    ///
    /// Nothing is returned unless the driver accepts the full state.
    ///
    /// # Safety
    /// The device must be valid, and the shader modules and layout named by
    /// this configuration must be alive.
    pub unsafe fn compile(
        &self,
        device: Arc<ash::Device>,
        render_pass: &RenderPass,
    ) -> Result<GraphicsPipeline> {
        self.validate()?;
        let layout = self.layout.unwrap_or_default();

        let shader_stages: Vec<_> = self
            .stages
            .iter()
            .map(|s| {
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(s.stage)
                    .module(s.module)
                    .name(SHADER_ENTRY_POINT)
            })
            .collect();

        let default_input = VertexInput::default();
        let input = self.vertex_input.as_ref().unwrap_or(&default_input);
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&input.bindings)
            .vertex_attribute_descriptions(&input.attributes);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology.unwrap_or(vk::PrimitiveTopology::TRIANGLE_LIST))
            .primitive_restart_enable(false);

        let viewports: Vec<_> = self.viewport.into_iter().collect();
        let scissors: Vec<_> = self.scissor.into_iter().collect();
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization =
            rasterization_state(self.polygon_mode.unwrap_or(vk::PolygonMode::FILL));
        let multisampling = multisample_state();

        let color_blend_attachments = [color_blend_attachment()];
        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass.handle())
            .subpass(0);

        let pipelines = device
            .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
            .map_err(|(pipelines, e)| {
                // Some drivers hand back partial results alongside the error
                for pipeline in pipelines {
                    if pipeline != vk::Pipeline::null() {
                        device.destroy_pipeline(pipeline, None);
                    }
                }
                GpuError::PipelineCreation(e.to_string())
            })?;

        let pipeline = pipelines
            .first()
            .copied()
            .ok_or_else(|| GpuError::PipelineCreation("driver returned no pipeline".to_string()))?;

        tracing::debug!("Graphics pipeline compiled with {} stages", self.stages.len());

        Ok(GraphicsPipeline { pipeline, device })
    }
}

/// A compiled graphics pipeline. Only the pipeline object is released on drop.
pub struct GraphicsPipeline {
    pipeline: vk::Pipeline,
    device: Arc<ash::Device>,
}

impl GraphicsPipeline {
    /// Get the raw pipeline handle.
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_pipeline(self.pipeline, None);
        }
        tracing::trace!("Graphics pipeline destroyed");
    }
}

/// Viewport covering `extent` with the standard depth range.
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// No depth clamp, no culling, clockwise front face, line width 1.
pub fn rasterization_state(
    polygon_mode: vk::PolygonMode,
) -> vk::PipelineRasterizationStateCreateInfo<'static> {
    vk::PipelineRasterizationStateCreateInfo::default()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(polygon_mode)
        .cull_mode(vk::CullModeFlags::NONE)
        .front_face(vk::FrontFace::CLOCKWISE)
        .depth_bias_enable(false)
        .line_width(1.0)
}

/// Single-sample rasterization.
pub fn multisample_state() -> vk::PipelineMultisampleStateCreateInfo<'static> {
    vk::PipelineMultisampleStateCreateInfo::default()
        .rasterization_samples(vk::SampleCountFlags::TYPE_1)
        .sample_shading_enable(false)
        .min_sample_shading(1.0)
}

/// Opaque writes to all four channels.
pub fn color_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::default()
        .blend_enable(false)
        .color_write_mask(vk::ColorComponentFlags::RGBA)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn fake_module() -> vk::ShaderModule {
        vk::ShaderModule::from_raw(1)
    }

    fn complete_config() -> GraphicsPipelineConfig {
        GraphicsPipelineConfig::new()
            .with_stage(ShaderStage::vertex(fake_module()))
            .with_stage(ShaderStage::fragment(fake_module()))
            .with_full_extent(vk::Extent2D {
                width: 960,
                height: 540,
            })
            .with_layout(vk::PipelineLayout::from_raw(2))
    }

    #[test]
    fn complete_config_validates() {
        assert!(complete_config().validate().is_ok());
    }

    #[test]
    fn missing_pieces_are_rejected() {
        assert!(GraphicsPipelineConfig::new().validate().is_err());

        let mut no_layout = complete_config();
        no_layout.layout = None;
        assert!(no_layout.validate().is_err());

        let mut no_scissor = complete_config();
        no_scissor.scissor = None;
        assert!(no_scissor.validate().is_err());

        let null_module =
            complete_config().with_stage(ShaderStage::fragment(vk::ShaderModule::null()));
        assert!(null_module.validate().is_err());
    }

    #[test]
    fn setters_leave_other_aspects_untouched() {
        let config = complete_config().with_topology(vk::PrimitiveTopology::LINE_LIST);
        assert_eq!(config.topology, Some(vk::PrimitiveTopology::LINE_LIST));
        assert_eq!(config.polygon_mode, None);
        assert_eq!(config.stages.len(), 2);
        assert_eq!(config.stages[0].stage, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn full_extent_viewport_and_scissor() {
        let config = complete_config();
        let viewport = config.viewport.unwrap();
        assert_eq!((viewport.width, viewport.height), (960.0, 540.0));
        assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));

        let scissor = config.scissor.unwrap();
        assert_eq!((scissor.offset.x, scissor.offset.y), (0, 0));
        assert_eq!((scissor.extent.width, scissor.extent.height), (960, 540));
    }

    #[test]
    fn fixed_state_matches_opaque_2d() {
        let raster = rasterization_state(vk::PolygonMode::FILL);
        assert_eq!(raster.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(raster.front_face, vk::FrontFace::CLOCKWISE);
        assert_eq!(raster.depth_clamp_enable, vk::FALSE);
        assert_eq!(raster.line_width, 1.0);

        let multisample = multisample_state();
        assert_eq!(multisample.rasterization_samples, vk::SampleCountFlags::TYPE_1);

        let blend = color_blend_attachment();
        assert_eq!(blend.blend_enable, vk::FALSE);
        assert_eq!(blend.color_write_mask, vk::ColorComponentFlags::RGBA);
    }
}
