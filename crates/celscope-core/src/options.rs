//! Configuration options for the viewer.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Parameters of the screen-space outline filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutlineConfig {
    /// Outline thickness as a texel multiplier for the neighbor sampling
    /// offsets.
    pub thickness: f32,

    /// Outline stroke color.
    pub color: Vec3,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            thickness: 1.0,
            color: Vec3::ZERO,
        }
    }
}

/// Global configuration options for the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerOptions {
    /// Whether toon shading and the outline pipeline are active. When
    /// false, the scene renders directly through the base renderer.
    pub toon_enabled: bool,

    /// Whether the model spins on its own.
    pub auto_rotate: bool,

    /// Auto-rotate speed in radians per second.
    pub rotate_speed: f32,

    /// Background color.
    pub background_color: Vec3,

    /// Outline filter parameters.
    pub outline: OutlineConfig,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            toon_enabled: true,
            auto_rotate: false,
            rotate_speed: 0.5,
            background_color: Vec3::new(0.92, 0.92, 0.94),
            outline: OutlineConfig::default(),
        }
    }
}
