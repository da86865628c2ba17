//! Device-level tests against a headless context.
//!
//! These need a Vulkan driver and are skipped unless run with `--ignored`.

use ash::vk;
use gpu_allocator::MemoryLocation;
use quadrant_gpu::{
    FrameCommands, FrameSync, GpuContextBuilder, GpuError, PipelineLayout, RenderPass,
    ShaderModule,
};

#[test]
#[ignore = "Requires GPU hardware"]
fn headless_context_creation() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();

    assert!(gpu
        .capabilities()
        .meets_requirements(quadrant_gpu::instance::MIN_API_VERSION));
    assert!(!gpu.has_debug_messenger());
    gpu.wait_idle().unwrap();
}

#[test]
#[ignore = "Requires GPU hardware"]
fn fresh_fence_does_not_block() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();
    let sync = unsafe { FrameSync::new(&gpu.shared_device()) }.unwrap();

    unsafe {
        sync.in_flight.wait(1_000_000_000).unwrap();
        sync.in_flight.reset().unwrap();
    }

    // Unsignaled now, so a zero-length wait times out
    let result = unsafe { sync.in_flight.wait(0) };
    assert!(matches!(result, Err(GpuError::Timeout(0))));
}

#[test]
#[ignore = "Requires GPU hardware"]
fn command_buffer_records_and_submits() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();
    let device = gpu.shared_device();

    let commands =
        unsafe { FrameCommands::new(device.clone(), gpu.graphics_queue_family()) }.unwrap();
    assert_ne!(commands.buffer(), vk::CommandBuffer::null());
    let sync = unsafe { FrameSync::new(&device) }.unwrap();

    // The second round re-records the same buffer after a reset
    for _ in 0..2 {
        unsafe {
            sync.in_flight.wait(1_000_000_000).unwrap();
            sync.in_flight.reset().unwrap();
            commands.begin().unwrap();
            commands.end().unwrap();
            commands
                .submit(gpu.graphics_queue(), &[], &[], &[], sync.in_flight.handle())
                .unwrap();
        }
    }

    unsafe { sync.in_flight.wait(1_000_000_000) }.unwrap();
}

#[test]
#[ignore = "Requires GPU hardware"]
fn host_visible_buffer_accepts_writes() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();
    let mut allocator = gpu.allocator().lock();

    let mut buffer = allocator
        .create_buffer(
            64,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            MemoryLocation::CpuToGpu,
            "test_buffer",
        )
        .unwrap();
    buffer.write(&[1.0f32; 16]).unwrap();

    // Too much data is refused rather than truncated
    assert!(buffer.write(&[0u8; 65]).is_err());

    allocator.free_buffer(&mut buffer).unwrap();
}

#[test]
#[ignore = "Requires GPU hardware"]
fn render_pass_and_layout_creation() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();

    let render_pass =
        unsafe { RenderPass::new_color_only(gpu.shared_device(), vk::Format::B8G8R8A8_SRGB) }
            .unwrap();
    assert_ne!(render_pass.handle(), vk::RenderPass::null());

    let range = vk::PushConstantRange::default()
        .stage_flags(vk::ShaderStageFlags::VERTEX)
        .offset(0)
        .size(80);
    let layout = unsafe { PipelineLayout::new(gpu.shared_device(), &[range]) }.unwrap();
    assert_ne!(layout.handle(), vk::PipelineLayout::null());
}

#[test]
#[ignore = "Requires GPU hardware"]
fn missing_shader_fails_to_load() {
    let gpu = GpuContextBuilder::new().validation(false).build().unwrap();

    let result = unsafe { ShaderModule::load(gpu.shared_device(), "no-such-shader.spv") };
    assert!(matches!(result, Err(GpuError::ShaderLoad { .. })));
}
