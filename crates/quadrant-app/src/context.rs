//! Application context.

use std::sync::Arc;

use quadrant_core::RectShape;
use quadrant_render::FrameRenderer;
use winit::window::Window;

/// Window and renderer handed to every [`QuadApp`](crate::QuadApp) method.
pub struct AppContext {
    // Declared first so the renderer, and with it the surface, goes before
    // the window it was created from
    pub(crate) renderer: FrameRenderer,
    pub window: Arc<Window>,
}

impl AppContext {
    pub(crate) fn new(window: Arc<Window>, renderer: FrameRenderer) -> Self {
        Self { renderer, window }
    }

    /// Queue a shape for the frame being built.
    pub fn draw(&mut self, shape: RectShape) {
        self.renderer.draw(shape);
    }

    /// Output size in pixels, as `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        let extent = self.renderer.extent();
        (extent.width, extent.height)
    }

    /// Number of frames presented so far.
    pub fn frame_count(&self) -> u64 {
        self.renderer.frame_count()
    }
}
