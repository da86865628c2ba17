//! GPU context management.

use crate::capabilities::GpuCapabilities;
use crate::debug::DebugMessenger;
use crate::error::{GpuError, Result};
use crate::instance::{
    create_instance, debug_utils_available, select_physical_device, DeviceSelection,
    PresentTarget, MIN_API_VERSION,
};
use crate::memory::GpuAllocator;
use crate::surface::SurfaceContext;
use ash::vk;
use parking_lot::Mutex;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use std::ffi::c_char;
use std::sync::Arc;

/// Main GPU context holding Vulkan resources.
///
/// Dropping the context shuts down the allocator, then destroys the device,
/// the debug messenger and the instance, in that order. Every object created
/// from the device must be gone by then.
pub struct GpuContext {
    // Entry must be kept alive for the lifetime of the context
    #[allow(dead_code)]
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) debug_messenger: Option<DebugMessenger>,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: Arc<ash::Device>,
    pub(crate) capabilities: GpuCapabilities,
    pub(crate) allocator: Arc<Mutex<GpuAllocator>>,
    pub(crate) graphics_queue_family: u32,
    pub(crate) graphics_queue: vk::Queue,
}

impl GpuContext {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get a shared handle to the device, for objects that release themselves on drop.
    pub fn shared_device(&self) -> Arc<ash::Device> {
        Arc::clone(&self.device)
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Get GPU capabilities.
    pub fn capabilities(&self) -> &GpuCapabilities {
        &self.capabilities
    }

    /// Get the graphics queue.
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    /// Get the graphics queue family index.
    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get access to the GPU allocator.
    pub fn allocator(&self) -> &Arc<Mutex<GpuAllocator>> {
        &self.allocator
    }

    /// Returns `true` when a validation messenger is installed.
    pub fn has_debug_messenger(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Wait for device to be idle.
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            // Shutdown allocator BEFORE destroying device
            // This frees all VkDeviceMemory allocations
            self.allocator.lock().shutdown();
            tracing::trace!("Allocator shut down");

            self.device.destroy_device(None);
            tracing::trace!("Device destroyed");

            if let Some(messenger) = self.debug_messenger.take() {
                messenger.destroy();
                tracing::trace!("Debug messenger destroyed");
            }

            self.instance.destroy_instance(None);
            tracing::trace!("Instance destroyed");
        }
    }
}

/// Builder for creating a GPU context.
pub struct GpuContextBuilder {
    app_name: String,
    enable_validation: bool,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Quadrant".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers and the debug messenger.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Build a context without presentation support.
    pub fn build(self) -> Result<GpuContext> {
        let instance = self.create_instance(None)?;

        match unsafe { finish_context(instance, None) } {
            Ok(context) => Ok(context),
            Err((instance, e)) => {
                unsafe { instance.destroy() };
                Err(e)
            }
        }
    }

    /// Build a context able to present to `window`.
    ///
    /// Creates the instance with the window system's surface extensions,
    /// creates the surface, then selects a device whose graphics queue can
    /// present to it. The returned surface must be dropped before the context.
    pub fn build_for_window<W>(self, window: &W) -> Result<(GpuContext, SurfaceContext)>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?
            .as_raw();
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?
            .as_raw();

        let instance = self.create_instance(Some(display))?;

        let surface = match unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                display,
                window_handle,
                None,
            )
        } {
            Ok(surface) => surface,
            Err(e) => {
                unsafe { instance.destroy() };
                return Err(GpuError::SurfaceCreation(e.to_string()));
            }
        };

        let surface_loader = ash::khr::surface::Instance::new(&instance.entry, &instance.instance);
        let target = PresentTarget {
            loader: &surface_loader,
            surface,
        };

        match unsafe { finish_context(instance, Some(target)) } {
            Ok(context) => {
                let surface = SurfaceContext::new(&context, surface, surface_loader);
                Ok((context, surface))
            }
            Err((instance, e)) => {
                unsafe {
                    surface_loader.destroy_surface(surface, None);
                    instance.destroy();
                }
                Err(e)
            }
        }
    }

    fn create_instance(&self, display: Option<RawDisplayHandle>) -> Result<InstanceParts> {
        // Load Vulkan entry point
        let entry =
            unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loading(e.to_string()))?;

        let enable_debug_utils = self.enable_validation && unsafe { debug_utils_available(&entry) };

        let instance = unsafe {
            create_instance(
                &entry,
                &self.app_name,
                self.enable_validation,
                enable_debug_utils,
                display,
            )
        }?;

        let debug_messenger = if enable_debug_utils {
            match unsafe { DebugMessenger::new(&entry, &instance) } {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    // Diagnostics only; carry on without them
                    tracing::warn!("Debug messenger unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };

        tracing::debug!(
            "Vulkan instance created (validation: {}, messenger: {})",
            self.enable_validation,
            debug_messenger.is_some()
        );

        Ok(InstanceParts {
            entry,
            instance,
            debug_messenger,
        })
    }
}

/// Instance-level objects created before a device exists.
struct InstanceParts {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_messenger: Option<DebugMessenger>,
}

impl InstanceParts {
    /// Tear down after a failed build.
    unsafe fn destroy(self) {
        if let Some(messenger) = &self.debug_messenger {
            messenger.destroy();
        }
        self.instance.destroy_instance(None);
    }
}

/// Select a device, create it and its allocator.
///
/// On failure the instance parts are handed back so the caller can release
/// whatever it created on top of them first.
unsafe fn finish_context(
    parts: InstanceParts,
    present: Option<PresentTarget<'_>>,
) -> std::result::Result<GpuContext, (InstanceParts, GpuError)> {
    let selection = match select_physical_device(&parts.instance, present) {
        Ok(selection) => selection,
        Err(e) => return Err((parts, e)),
    };

    let capabilities = GpuCapabilities::query(&parts.instance, selection.physical_device);

    if !capabilities.meets_requirements(MIN_API_VERSION) {
        return Err((parts, GpuError::NoSuitableDevice));
    }

    tracing::info!("Selected GPU: {}", capabilities.summary());

    let (device, graphics_queue) =
        match create_device(&parts.instance, selection, present.is_some()) {
            Ok(created) => created,
            Err(e) => return Err((parts, e)),
        };

    let device = Arc::new(device);

    // Create GPU allocator
    let allocator =
        match GpuAllocator::new(&parts.instance, Arc::clone(&device), selection.physical_device) {
            Ok(allocator) => allocator,
            Err(e) => {
                device.destroy_device(None);
                return Err((parts, e));
            }
        };

    let InstanceParts {
        entry,
        instance,
        debug_messenger,
    } = parts;

    Ok(GpuContext {
        entry,
        instance,
        debug_messenger,
        physical_device: selection.physical_device,
        device,
        capabilities,
        allocator: Arc::new(Mutex::new(allocator)),
        graphics_queue_family: selection.graphics_queue_family,
        graphics_queue,
    })
}

/// Required device extensions.
fn required_device_extensions(presenting: bool) -> Vec<*const c_char> {
    let mut extensions = Vec::new();

    if presenting {
        extensions.push(ash::khr::swapchain::NAME.as_ptr());
    }

    // MoltenVK exposes a portability subset that must be enabled explicitly
    #[cfg(target_os = "macos")]
    extensions.push(ash::khr::portability_subset::NAME.as_ptr());

    extensions
}

/// Create the logical device and retrieve the graphics queue.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn create_device(
    instance: &ash::Instance,
    selection: DeviceSelection,
    presenting: bool,
) -> Result<(ash::Device, vk::Queue)> {
    let queue_priority = 1.0_f32;
    let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(selection.graphics_queue_family)
        .queue_priorities(std::slice::from_ref(&queue_priority))];

    let extension_names = required_device_extensions(presenting);
    let features = vk::PhysicalDeviceFeatures::default();

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&features);

    let device = instance.create_device(selection.physical_device, &device_create_info, None)?;

    let graphics_queue = device.get_device_queue(selection.graphics_queue_family, 0);

    tracing::debug!(
        "Logical device created (graphics family {})",
        selection.graphics_queue_family
    );

    Ok((device, graphics_queue))
}
