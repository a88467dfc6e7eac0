//! Rendering backend for celscope-rs.
//!
//! This crate provides the wgpu-based rendering engine, including:
//! - GPU resource management (buffers, textures, pipelines)
//! - Toon and standard mesh shading (WGSL)
//! - The outline composite pipeline: normal/depth prepasses, the
//!   screen-space edge filter, and FXAA
//! - Camera and view management

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod camera;
pub mod depth_pass;
pub mod edge_pass;
pub mod engine;
pub mod error;
pub mod fxaa_pass;
pub mod mesh_render;
pub mod normal_pass;
pub mod outline;
pub mod screenshot;
pub mod textures;

pub use camera::Camera;
pub use depth_pass::DepthPass;
pub use edge_pass::{EdgePass, EdgeUniforms};
pub use engine::{CameraUniforms, RenderEngine};
pub use error::{RenderError, RenderResult};
pub use fxaa_pass::{FxaaPass, FxaaUniforms};
pub use mesh_render::{GpuScene, MeshRenderData, MeshUniforms};
pub use normal_pass::NormalPass;
pub use outline::{physical_extent, OutlinePipeline};
pub use screenshot::{read_texture_rgba, save_image};
