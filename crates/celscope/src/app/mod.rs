//! Application window and event loop management.

mod input;
mod render;

pub(super) use std::sync::Arc;

pub(super) use pollster::FutureExt;
pub(super) use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::KeyCode,
    window::{Window, WindowId},
};

pub(super) use celscope_core::ViewerState;
pub(super) use celscope_render::{GpuScene, OutlinePipeline, RenderEngine};

pub(super) use crate::loader::ModelLoader;

/// The viewer application.
///
/// Owns the window, GPU state, and the [`ViewerState`]; event handlers and
/// the frame driver receive the state by reference through `self`, with no
/// ambient globals.
pub struct App {
    pub(super) window: Option<Arc<Window>>,
    pub(super) engine: Option<RenderEngine>,
    pub(super) outline: Option<OutlinePipeline>,
    pub(super) gpu_scene: Option<GpuScene>,
    pub(super) state: ViewerState,
    pub(super) loader: ModelLoader,
    pub(super) close_requested: bool,
    // Mouse state for camera control
    pub(super) mouse_pos: (f64, f64),
    pub(super) left_mouse_down: bool,
    // Set when the model or its materials changed and GPU resources must
    // be rebuilt before the next frame.
    pub(super) scene_dirty: bool,
    // Set when only transforms changed (auto-rotate).
    pub(super) transforms_dirty: bool,
    // Screenshot state
    pub(super) screenshot_pending: Option<String>,
    pub(super) screenshot_counter: u32,
    // Frame timing for auto-rotate
    pub(super) last_frame_time: Option<std::time::Instant>,
}

impl App {
    /// Creates the application around an externally built viewer state.
    #[must_use]
    pub fn new(state: ViewerState) -> Self {
        Self {
            window: None,
            engine: None,
            outline: None,
            gpu_scene: None,
            state,
            loader: ModelLoader::new(),
            close_requested: false,
            mouse_pos: (0.0, 0.0),
            left_mouse_down: false,
            scene_dirty: true,
            transforms_dirty: false,
            screenshot_pending: None,
            screenshot_counter: 0,
            last_frame_time: None,
        }
    }

    /// Requests a screenshot with an auto-generated filename.
    pub fn request_auto_screenshot(&mut self) {
        let filename = format!("screenshot_{:04}.png", self.screenshot_counter);
        self.screenshot_counter += 1;
        self.screenshot_pending = Some(filename);
    }
}

/// Runs the viewer application, consuming the state.
pub fn run_app(state: ViewerState) {
    let event_loop = EventLoop::new().expect("failed to create event loop");
    let mut app = App::new(state);

    event_loop.run_app(&mut app).expect("event loop error");
}
