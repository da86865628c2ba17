//! SPIR-V shader modules.

use crate::error::{GpuError, Result};
use ash::vk;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// A compiled shader module, destroyed on drop.
pub struct ShaderModule {
    module: vk::ShaderModule,
    device: Arc<ash::Device>,
}

impl ShaderModule {
    /// Read a SPIR-V binary from `path` and create a module from it.
    ///
    /// Relative paths resolve against the process working directory. A
    /// missing, unreadable or misaligned file yields [`GpuError::ShaderLoad`].
    ///
    /// # Safety
    /// The device must be valid.
    pub unsafe fn load(device: Arc<ash::Device>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let code = read_spirv(path)?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = device
            .create_shader_module(&create_info, None)
            .map_err(|e| GpuError::ShaderLoad {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!("Loaded shader {} ({} words)", path.display(), code.len());

        Ok(Self { module, device })
    }

    /// Get the raw module handle.
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}

/// Read a SPIR-V file into aligned words.
pub fn read_spirv(path: &Path) -> Result<Vec<u32>> {
    let shader_error = |reason: String| GpuError::ShaderLoad {
        path: path.display().to_string(),
        reason,
    };

    let mut file = File::open(path).map_err(|e| shader_error(e.to_string()))?;
    let code = ash::util::read_spv(&mut file).map_err(|e| shader_error(e.to_string()))?;

    if code.is_empty() {
        return Err(shader_error("file is empty".to_string()));
    }

    Ok(code)
}
