//! `QuadApp` trait definition.

use crate::context::AppContext;
use winit::event::WindowEvent;

/// Trait for applications drawn with the quad renderer.
///
/// The runner creates the window and renderer, advances the application on a
/// fixed tick, and renders one frame per redraw. Shapes queued during
/// [`QuadApp::draw`] appear in that frame only.
pub trait QuadApp: Sized {
    /// Initialize the application.
    ///
    /// Called once, after the window and renderer exist.
    fn init(ctx: &AppContext) -> anyhow::Result<Self>;

    /// Advance the simulation by one tick of `AppConfig::tick_interval`.
    fn tick(&mut self, ctx: &AppContext);

    /// Queue this frame's shapes with [`AppContext::draw`].
    fn draw(&self, ctx: &mut AppContext);

    /// Handle window events.
    ///
    /// Return `true` if the event was handled and should not be processed
    /// further. Default implementation does nothing and returns `false`.
    #[allow(unused_variables)]
    fn on_event(&mut self, event: &WindowEvent) -> bool {
        false
    }

    /// Return `true` to close the window. Checked after every handled event
    /// and after every tick.
    fn should_exit(&self) -> bool {
        false
    }
}
