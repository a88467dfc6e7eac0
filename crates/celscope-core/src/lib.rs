//! Core abstractions for celscope-rs.
//!
//! This crate provides the data model shared by the renderer and the viewer
//! application:
//! - An owned scene graph ([`Node`], [`Mesh`]) with visitor helpers
//! - The material model ([`StandardMaterial`], [`ToonMaterial`], [`MaterialSlots`])
//! - Gradient ramps for banded lighting ([`GradientRamp`])
//! - The material quantization stage ([`toon::apply_toon_shading`])
//! - Viewer options and application state

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod error;
pub mod material;
pub mod options;
pub mod ramp;
pub mod scene;
pub mod state;
pub mod toon;

pub use error::{CelscopeError, Result};
pub use material::{CullSide, Material, MaterialSlots, StandardMaterial, TextureData, ToonMaterial};
pub use options::{OutlineConfig, ViewerOptions};
pub use ramp::GradientRamp;
pub use scene::{Mesh, Node, SlotRange};
pub use state::ViewerState;
pub use toon::{apply_toon_shading, restore_materials};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
