//! Vulkan instance creation and physical device selection.

use crate::error::{GpuError, Result};
use ash::vk;
use raw_window_handle::RawDisplayHandle;
use std::ffi::{c_char, CStr, CString};

/// Minimum Vulkan API version a device must report.
pub const MIN_API_VERSION: u32 = vk::API_VERSION_1_0;

/// Validation layers to enable when diagnostics are requested.
pub fn validation_layers() -> Vec<&'static CStr> {
    vec![
        // Standard validation layer
        c"VK_LAYER_KHRONOS_validation",
    ]
}

/// Instance extensions needed to present to windows on `display`.
///
/// Returns only the portability extension (where required) for headless use.
pub fn required_instance_extensions(
    display: Option<RawDisplayHandle>,
) -> Result<Vec<*const c_char>> {
    let mut extensions = Vec::new();

    if let Some(display) = display {
        let window_extensions = ash_window::enumerate_required_extensions(display)
            .map_err(|e| GpuError::SurfaceCreation(format!("Unsupported display: {e}")))?;
        extensions.extend_from_slice(window_extensions);
    }

    #[cfg(target_os = "macos")]
    extensions.push(ash::khr::portability_enumeration::NAME.as_ptr());

    Ok(extensions)
}

/// Check whether `VK_EXT_debug_utils` can be enabled on this loader.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn debug_utils_available(entry: &ash::Entry) -> bool {
    let Ok(extensions) = entry.enumerate_instance_extension_properties(None) else {
        return false;
    };

    extensions.iter().any(|props| {
        CStr::from_ptr(props.extension_name.as_ptr()) == ash::ext::debug_utils::NAME
    })
}

/// Create a Vulkan instance.
///
/// Validation layers that are not installed are skipped with a warning, so
/// requesting diagnostics never turns a working setup into a failing one.
///
/// # Safety
/// The entry must be a valid Vulkan entry point.
pub unsafe fn create_instance(
    entry: &ash::Entry,
    app_name: &str,
    enable_validation: bool,
    enable_debug_utils: bool,
    display: Option<RawDisplayHandle>,
) -> Result<ash::Instance> {
    let app_name = CString::new(app_name)
        .map_err(|e| GpuError::InvalidState(format!("Invalid application name: {e}")))?;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(c"Quadrant")
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(MIN_API_VERSION);

    let mut extension_names = required_instance_extensions(display)?;
    if enable_debug_utils {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
    }

    // Keep only the layers that are actually installed
    let layers = if enable_validation {
        let available_layers = entry.enumerate_instance_layer_properties()?;
        validation_layers()
            .into_iter()
            .filter(|layer| {
                let found = available_layers
                    .iter()
                    .any(|props| CStr::from_ptr(props.layer_name.as_ptr()) == *layer);
                if !found {
                    tracing::warn!("Validation layer {:?} not available", layer);
                }
                found
            })
            .collect()
    } else {
        vec![]
    };

    let layer_names: Vec<*const c_char> = layers.iter().map(|l| l.as_ptr()).collect();

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None)?;

    Ok(instance)
}

/// Surface a selected device must be able to present to.
#[derive(Clone, Copy)]
pub struct PresentTarget<'a> {
    pub loader: &'a ash::khr::surface::Instance,
    pub surface: vk::SurfaceKHR,
}

/// Result of physical device selection.
#[derive(Debug, Clone, Copy)]
pub struct DeviceSelection {
    pub physical_device: vk::PhysicalDevice,
    pub graphics_queue_family: u32,
}

/// Select the best physical device.
///
/// A device qualifies when it reports at least [`MIN_API_VERSION`] and has a
/// graphics queue family. When `present` is given, that family must also be
/// able to present to the surface and the device must support swapchains.
///
/// # Safety
/// The instance (and surface, if given) must be valid.
pub unsafe fn select_physical_device(
    instance: &ash::Instance,
    present: Option<PresentTarget<'_>>,
) -> Result<DeviceSelection> {
    let devices = instance.enumerate_physical_devices()?;

    if devices.is_empty() {
        return Err(GpuError::NoSuitableDevice);
    }

    // Score devices and pick the best
    let mut best: Option<(i32, DeviceSelection)> = None;

    for device in devices {
        let Some(graphics_queue_family) = find_graphics_queue_family(instance, device, present)
        else {
            continue;
        };

        if present.is_some() && !supports_swapchain(instance, device) {
            continue;
        }

        let Some(score) = score_physical_device(instance, device) else {
            continue;
        };

        if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
            best = Some((
                score,
                DeviceSelection {
                    physical_device: device,
                    graphics_queue_family,
                },
            ));
        }
    }

    best.map(|(_, selection)| selection)
        .ok_or(GpuError::NoSuitableDevice)
}

/// Find a queue family with graphics support (and presentation, if required).
unsafe fn find_graphics_queue_family(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    present: Option<PresentTarget<'_>>,
) -> Option<u32> {
    let families = instance.get_physical_device_queue_family_properties(device);

    families.iter().enumerate().find_map(|(index, family)| {
        let index = u32::try_from(index).ok()?;
        if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            return None;
        }

        match present {
            Some(target) => target
                .loader
                .get_physical_device_surface_support(device, index, target.surface)
                .unwrap_or(false)
                .then_some(index),
            None => Some(index),
        }
    })
}

/// Check for `VK_KHR_swapchain` support.
unsafe fn supports_swapchain(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    instance
        .enumerate_device_extension_properties(device)
        .unwrap_or_default()
        .iter()
        .any(|ext| CStr::from_ptr(ext.extension_name.as_ptr()) == ash::khr::swapchain::NAME)
}

/// Score a physical device for selection. `None` means unsuitable.
unsafe fn score_physical_device(instance: &ash::Instance, device: vk::PhysicalDevice) -> Option<i32> {
    let properties = instance.get_physical_device_properties(device);

    if !meets_api_version(properties.api_version, MIN_API_VERSION) {
        return None;
    }

    // Start at 1 so any qualifying device beats "none"
    let mut score = 1;

    // Prefer discrete GPUs
    match properties.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => score += 1000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => score += 100,
        vk::PhysicalDeviceType::VIRTUAL_GPU => score += 50,
        _ => {}
    }

    Some(score)
}

/// Compare a reported API version against a required minimum.
pub fn meets_api_version(reported: u32, minimum: u32) -> bool {
    let reported = (vk::api_version_major(reported), vk::api_version_minor(reported));
    let minimum = (vk::api_version_major(minimum), vk::api_version_minor(minimum));
    reported >= minimum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_comparison() {
        assert!(meets_api_version(vk::API_VERSION_1_3, vk::API_VERSION_1_0));
        assert!(meets_api_version(vk::API_VERSION_1_0, vk::API_VERSION_1_0));
        assert!(!meets_api_version(vk::API_VERSION_1_0, vk::API_VERSION_1_2));
        assert!(meets_api_version(vk::make_api_version(0, 2, 0, 0), vk::API_VERSION_1_3));
    }

    #[test]
    fn headless_needs_no_window_extensions() {
        let extensions = required_instance_extensions(None).unwrap();
        assert_eq!(extensions.len(), usize::from(cfg!(target_os = "macos")));
    }

    #[test]
    fn validation_layer_is_khronos() {
        assert_eq!(validation_layers(), vec![c"VK_LAYER_KHRONOS_validation"]);
    }
}
