//! celscope: a cel-shaded 3D model viewer with screen-space outlines.
//!
//! The viewer quantizes lit surface color through a gradient-ramp lookup
//! and draws outline strokes with a screen-space edge-detection
//! post-process over auxiliary normal and depth buffers.
//!
//! # Example
//!
//! ```no_run
//! use celscope::*;
//!
//! fn main() -> Result<()> {
//!     let mut state = ViewerState::new();
//!     let model = load_model_file("model.obj".as_ref())?;
//!     state.swap_model("model", model);
//!     run(state);
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod app;
pub mod headless;
pub mod loader;

pub use celscope_core::{
    apply_toon_shading, restore_materials, CelscopeError, CullSide, GradientRamp, Material,
    MaterialSlots, Mesh, Node, OutlineConfig, Result, SlotRange, StandardMaterial, TextureData,
    ToonMaterial, ViewerOptions, ViewerState,
};
pub use celscope_render::{physical_extent, Camera, GpuScene, OutlinePipeline, RenderEngine};
pub use headless::{render_to_file, render_to_image};
pub use loader::{load_model_file, ModelLoader};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// Opens the interactive viewer window.
///
/// Blocks until the window is closed (ESC or the close button). The given
/// state owns the displayed model and the shading flags; event handlers
/// and the frame driver mutate it through the application, never through
/// globals.
pub fn run(state: ViewerState) {
    let _ = env_logger::try_init();
    app::run_app(state);
}
