//! Application runner and event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use quadrant_render::{FrameRenderer, RendererConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::app::QuadApp;
use crate::context::AppContext;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Open a borderless fullscreen window on the current monitor.
    pub fullscreen: bool,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
    /// Simulation step passed to [`QuadApp::tick`].
    pub tick_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Quadrant".to_string(),
            width: 960,
            height: 540,
            fullscreen: false,
            validation: cfg!(debug_assertions),
            tick_interval: Duration::from_millis(100),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

/// Initialize logging from `RUST_LOG`, defaulting to `info`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed by an embedding program
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Run a `QuadApp` with the given configuration.
///
/// Initializes logging, creates the window and renderer, and runs the event
/// loop until the application exits. Initialization and frame failures are
/// returned after the window closes.
pub fn run_app<A: QuadApp + 'static>(config: AppConfig) -> anyhow::Result<()> {
    init_logging();

    info!("{} starting...", config.title);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut runner = AppRunner::<A> {
        config,
        pending: None,
        state: None,
        failure: None,
    };

    event_loop.run_app(&mut runner)?;

    match runner.failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Internal application runner that implements winit's `ApplicationHandler`.
struct AppRunner<A: QuadApp> {
    config: AppConfig,
    /// Fullscreen window still waiting for its first resize
    pending: Option<Arc<Window>>,
    state: Option<AppState<A>>,
    failure: Option<anyhow::Error>,
}

/// Internal application state.
struct AppState<A: QuadApp> {
    // Dropped before the context so the app never outlives the renderer
    app: A,
    ctx: AppContext,
    ticks: TickTimer,
    warned_resize: bool,
}

/// Whether the loop keeps going after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

impl<A: QuadApp + 'static> ApplicationHandler for AppRunner<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() || self.pending.is_some() {
            return;
        }

        info!("Creating application state...");

        let window = match self.create_window(event_loop) {
            Ok(window) => window,
            Err(e) => {
                self.fail(event_loop, e);
                return;
            }
        };

        let size = window.inner_size();
        if self.config.fullscreen {
            let monitor = window
                .current_monitor()
                .or_else(|| event_loop.primary_monitor())
                .map(|monitor| monitor.size());
            let target = fullscreen_size(size, monitor);
            if size != target {
                // The window manager applies fullscreen after creation
                info!(
                    "Waiting for fullscreen {}x{} before creating the renderer",
                    target.width, target.height
                );
                self.pending = Some(window);
                return;
            }
        }

        self.start(event_loop, window, size);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.state.is_none() {
            self.pending_event(event_loop, &event);
            return;
        }
        let Some(state) = &mut self.state else {
            return;
        };

        // Let the app handle the event first
        if state.app.on_event(&event) {
            if state.app.should_exit() {
                self.shutdown(event_loop);
            }
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested");
                self.shutdown(event_loop);
            }
            WindowEvent::RedrawRequested => match state.frame() {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    info!("Application finished");
                    self.shutdown(event_loop);
                }
                Err(e) => {
                    error!("Render error: {e:#}");
                    self.failure = Some(e);
                    self.shutdown(event_loop);
                }
            },
            WindowEvent::Resized(size) => state.note_resize(size),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.ctx.window.request_redraw();
        }
    }
}

impl<A: QuadApp + 'static> AppRunner<A> {
    fn create_window(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<Arc<Window>> {
        let mut window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(false);

        if self.config.fullscreen {
            window_attrs = window_attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        if self.config.fullscreen {
            window.set_cursor_visible(false);
        }
        Ok(window)
    }

    /// Events seen before the renderer exists.
    fn pending_event(&mut self, event_loop: &ActiveEventLoop, event: &WindowEvent) {
        match *event {
            WindowEvent::Resized(size) if size.width > 0 && size.height > 0 => {
                if let Some(window) = self.pending.take() {
                    self.start(event_loop, window, size);
                }
            }
            WindowEvent::CloseRequested => {
                self.pending = None;
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn start(
        &mut self,
        event_loop: &ActiveEventLoop,
        window: Arc<Window>,
        size: PhysicalSize<u32>,
    ) {
        match self.create_state(window, size) {
            Ok(state) => {
                self.state = Some(state);
                info!("Application ready!");
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn create_state(
        &self,
        window: Arc<Window>,
        size: PhysicalSize<u32>,
    ) -> anyhow::Result<AppState<A>> {
        let renderer_config = RendererConfig::new(size.width, size.height)
            .with_app_name(&self.config.title)
            .with_validation(self.config.validation);

        let renderer = FrameRenderer::new(window.as_ref(), &renderer_config)?;

        let ctx = AppContext::new(window, renderer);
        let app = A::init(&ctx)?;

        Ok(AppState {
            app,
            ctx,
            ticks: TickTimer::new(self.config.tick_interval),
            warned_resize: false,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: anyhow::Error) {
        error!("Failed to initialize application: {e:#}");
        self.failure = Some(e);
        event_loop.exit();
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.take() {
            let AppState { app, ctx, .. } = state;
            drop(app);
            info!("Exiting after {} frames", ctx.frame_count());
            ctx.renderer.destroy();
        }
        event_loop.exit();
    }
}

impl<A: QuadApp> AppState<A> {
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    fn frame(&mut self) -> anyhow::Result<Flow> {
        let due = self.ticks.advance(Instant::now());
        let ctx = &self.ctx;
        if run_tick(&mut self.app, due, |app| app.tick(ctx)) == Flow::Exit {
            return Ok(Flow::Exit);
        }

        self.app.draw(&mut self.ctx);
        self.ctx.renderer.render()?;
        Ok(Flow::Continue)
    }

    fn note_resize(&mut self, size: PhysicalSize<u32>) {
        let (width, height) = self.ctx.size();
        if !self.warned_resize && (size.width != width || size.height != height) {
            warn!(
                "Window resized to {}x{}; rendering stays at {width}x{height}",
                size.width, size.height
            );
            self.warned_resize = true;
        }
    }
}

/// Run `tick` if one is due, then ask the app whether it is done.
fn run_tick<A: QuadApp>(app: &mut A, due: bool, tick: impl FnOnce(&mut A)) -> Flow {
    if due {
        tick(app);
    }
    if app.should_exit() {
        Flow::Exit
    } else {
        Flow::Continue
    }
}

/// Output size for a fullscreen window: the monitor's, when it reports one.
fn fullscreen_size(
    window: PhysicalSize<u32>,
    monitor: Option<PhysicalSize<u32>>,
) -> PhysicalSize<u32> {
    monitor
        .filter(|size| size.width > 0 && size.height > 0)
        .unwrap_or(window)
}

/// Paces simulation ticks against wall-clock time.
///
/// At most one tick is due per frame. Time past the interval is dropped, so
/// a stall is not caught up afterwards.
#[derive(Debug, Clone)]
pub struct TickTimer {
    interval: Duration,
    last: Option<Instant>,
    elapsed: Duration,
}

impl TickTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Whether a tick is due at `now`. The first call starts the clock.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(last) = self.last.replace(now) else {
            return false;
        };

        self.elapsed += now.saturating_duration_since(last);
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    /// Exits once its tick budget is spent.
    struct Countdown {
        ticks_left: u32,
    }

    impl QuadApp for Countdown {
        fn init(_ctx: &AppContext) -> anyhow::Result<Self> {
            Ok(Self { ticks_left: 2 })
        }

        fn tick(&mut self, _ctx: &AppContext) {
            countdown(self);
        }

        fn draw(&self, _ctx: &mut AppContext) {}

        fn should_exit(&self) -> bool {
            self.ticks_left == 0
        }
    }

    fn countdown(app: &mut Countdown) {
        app.ticks_left = app.ticks_left.saturating_sub(1);
    }

    #[test]
    fn exit_is_noticed_on_the_tick_that_ends_the_app() {
        let mut app = Countdown { ticks_left: 2 };

        assert_eq!(run_tick(&mut app, true, countdown), Flow::Continue);
        assert_eq!(run_tick(&mut app, false, countdown), Flow::Continue);
        assert_eq!(app.ticks_left, 1);
        // No key press needed: the frame that ends the app reports it
        assert_eq!(run_tick(&mut app, true, countdown), Flow::Exit);
    }

    #[test]
    fn finished_app_exits_without_a_tick() {
        let mut app = Countdown { ticks_left: 0 };
        assert_eq!(run_tick(&mut app, false, countdown), Flow::Exit);
    }

    #[test]
    fn fullscreen_uses_monitor_size() {
        let window = PhysicalSize::new(960, 540);

        assert_eq!(
            fullscreen_size(window, Some(PhysicalSize::new(2560, 1440))),
            PhysicalSize::new(2560, 1440)
        );
        assert_eq!(fullscreen_size(window, None), window);
        assert_eq!(fullscreen_size(window, Some(PhysicalSize::new(0, 0))), window);
    }

    #[test]
    fn first_advance_only_starts_clock() {
        let mut timer = TickTimer::new(STEP);
        assert!(!timer.advance(Instant::now()));
    }

    #[test]
    fn tick_is_due_once_interval_has_passed() {
        let start = Instant::now();
        let mut timer = TickTimer::new(STEP);
        timer.advance(start);

        assert!(!timer.advance(start + Duration::from_millis(60)));
        assert!(timer.advance(start + Duration::from_millis(120)));
        // Overshoot is dropped, so the next tick needs a full interval
        assert!(!timer.advance(start + Duration::from_millis(200)));
        assert!(timer.advance(start + Duration::from_millis(230)));
    }

    #[test]
    fn long_stall_yields_a_single_tick() {
        let start = Instant::now();
        let mut timer = TickTimer::new(STEP);
        timer.advance(start);

        assert!(timer.advance(start + Duration::from_secs(10)));
        assert!(!timer.advance(start + Duration::from_secs(10) + Duration::from_millis(50)));
    }

    #[test]
    fn config_builders() {
        let config = AppConfig::new("snake")
            .with_size(1920, 1080)
            .with_fullscreen(true)
            .with_validation(false)
            .with_tick_interval(Duration::from_millis(50));

        assert_eq!(config.title, "snake");
        assert_eq!((config.width, config.height), (1920, 1080));
        assert!(config.fullscreen);
        assert!(!config.validation);
        assert_eq!(config.tick_interval, Duration::from_millis(50));
    }
}
