//! Renderer configuration.

use quadrant_core::Rgb;
use std::path::PathBuf;

/// Bound on every fence wait and image acquire, in nanoseconds (one second).
pub const DEFAULT_FRAME_TIMEOUT: u64 = 1_000_000_000;

/// File name of the compiled vertex shader.
pub const DEFAULT_VERTEX_SHADER: &str = "vertexshader.spv";

/// File name of the compiled fragment shader.
pub const DEFAULT_FRAGMENT_SHADER: &str = "fragmentshader.spv";

/// Settings consumed by `FrameRenderer::new`.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Output size in pixels; should match the window's inner size.
    pub width: u32,
    pub height: u32,
    /// Enable validation layers and the debug messenger. Diagnostics only.
    pub validation: bool,
    pub app_name: String,
    /// Relative paths resolve against the working directory.
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub frame_timeout_ns: u64,
    pub clear_color: Rgb,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            validation: cfg!(debug_assertions),
            app_name: "Quadrant".to_string(),
            vertex_shader: PathBuf::from(DEFAULT_VERTEX_SHADER),
            fragment_shader: PathBuf::from(DEFAULT_FRAGMENT_SHADER),
            frame_timeout_ns: DEFAULT_FRAME_TIMEOUT,
            clear_color: Rgb::BLACK,
        }
    }
}

impl RendererConfig {
    /// Configuration for a `width` x `height` output with default settings.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    #[must_use]
    pub fn with_shaders(
        mut self,
        vertex_shader: impl Into<PathBuf>,
        fragment_shader: impl Into<PathBuf>,
    ) -> Self {
        self.vertex_shader = vertex_shader.into();
        self.fragment_shader = fragment_shader.into();
        self
    }

    #[must_use]
    pub fn with_frame_timeout(mut self, timeout_ns: u64) -> Self {
        self.frame_timeout_ns = timeout_ns;
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, clear_color: Rgb) -> Self {
        self.clear_color = clear_color;
        self
    }
}
