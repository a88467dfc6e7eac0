//! Material model for toon and standard shading.
//!
//! Each mesh carries one material per slot. Before quantization a slot
//! holds a [`StandardMaterial`]; the quantization stage in [`crate::toon`]
//! derives a [`ToonMaterial`] per slot that keeps the source's surface
//! parameters and injects a shared [`GradientRamp`] as the lighting lookup.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::ramp::GradientRamp;

/// Which triangle faces are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullSide {
    /// Front faces only (backface culling on).
    #[default]
    Front,
    /// Back faces only.
    Back,
    /// Both sides (culling off).
    Double,
}

/// CPU-side image data referenced by materials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixels, row-major from the top-left.
    pub rgba: Vec<u8>,
    /// Whether the pixel data is display-referred (sRGB encoded).
    /// The renderer picks the texture view format from this flag.
    pub srgb: bool,
}

impl TextureData {
    /// Creates texture data from raw RGBA8 pixels.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>, srgb: bool) -> Self {
        debug_assert_eq!(rgba.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            rgba,
            srgb,
        }
    }
}

/// The pre-toon shading material attached to a mesh slot.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    /// Base (diffuse) color.
    pub base_color: Vec3,
    /// Optional albedo texture.
    pub albedo: Option<Arc<TextureData>>,
    /// Whether the surface blends with what is behind it.
    pub transparent: bool,
    /// Opacity in [0, 1]; only meaningful when `transparent` is set.
    pub opacity: f32,
    /// Face culling side.
    pub side: CullSide,
}

impl Default for StandardMaterial {
    /// Opaque white, untextured, front-facing. These are also the
    /// substitutes used when a source material is missing fields.
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            albedo: None,
            transparent: false,
            opacity: 1.0,
            side: CullSide::Front,
        }
    }
}

/// A quantized-lighting material sampling a shared gradient ramp.
#[derive(Debug, Clone)]
pub struct ToonMaterial {
    /// Base (diffuse) color, carried over from the source material.
    pub base_color: Vec3,
    /// Optional albedo texture, re-tagged as sRGB during derivation.
    pub albedo: Option<Arc<TextureData>>,
    /// The shared lighting lookup. Multiple meshes reference one ramp.
    pub ramp: Arc<GradientRamp>,
    /// Whether the surface blends with what is behind it.
    pub transparent: bool,
    /// Opacity in [0, 1].
    pub opacity: f32,
    /// Face culling side.
    pub side: CullSide,
}

impl ToonMaterial {
    /// Derives a toon material from a standard material.
    ///
    /// Preserves base color, albedo texture, transparency, opacity, and
    /// side. The albedo texture's color encoding is normalized to
    /// display-referred (sRGB) so the backend does not re-encode sampled
    /// colors; a texture already tagged sRGB is shared as-is.
    pub fn derive(source: &StandardMaterial, ramp: &Arc<GradientRamp>) -> Self {
        let albedo = source.albedo.as_ref().map(|tex| {
            if tex.srgb {
                Arc::clone(tex)
            } else {
                Arc::new(TextureData {
                    srgb: true,
                    ..(**tex).clone()
                })
            }
        });

        Self {
            base_color: source.base_color,
            albedo,
            ramp: Arc::clone(ramp),
            transparent: source.transparent,
            opacity: source.opacity,
            side: source.side,
        }
    }
}

/// A material slot's contents: either the original shading material or a
/// derived toon variant.
#[derive(Debug, Clone)]
pub enum Material {
    /// Continuous-shading source material.
    Standard(StandardMaterial),
    /// Banded-lighting derived material.
    Toon(ToonMaterial),
}

impl Material {
    /// Returns the base color regardless of variant.
    #[must_use]
    pub fn base_color(&self) -> Vec3 {
        match self {
            Material::Standard(m) => m.base_color,
            Material::Toon(m) => m.base_color,
        }
    }

    /// Returns the albedo texture, if any.
    #[must_use]
    pub fn albedo(&self) -> Option<&Arc<TextureData>> {
        match self {
            Material::Standard(m) => m.albedo.as_ref(),
            Material::Toon(m) => m.albedo.as_ref(),
        }
    }

    /// Returns the opacity.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        match self {
            Material::Standard(m) => m.opacity,
            Material::Toon(m) => m.opacity,
        }
    }

    /// Returns whether the surface is transparent.
    #[must_use]
    pub fn transparent(&self) -> bool {
        match self {
            Material::Standard(m) => m.transparent,
            Material::Toon(m) => m.transparent,
        }
    }

    /// Returns the face culling side.
    #[must_use]
    pub fn side(&self) -> CullSide {
        match self {
            Material::Standard(m) => m.side,
            Material::Toon(m) => m.side,
        }
    }

    /// Returns true for the toon variant.
    #[must_use]
    pub fn is_toon(&self) -> bool {
        matches!(self, Material::Toon(_))
    }
}

/// The materials attached to a mesh, preserving the single/multi-slot
/// distinction: a mesh authored with one material stays `Single` and never
/// becomes a one-element `Multi`.
#[derive(Debug, Clone)]
pub enum MaterialSlots {
    /// Exactly one material slot.
    Single(Material),
    /// Two or more material slots, in authoring order.
    Multi(Vec<Material>),
}

impl MaterialSlots {
    /// Returns the number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            MaterialSlots::Single(_) => 1,
            MaterialSlots::Multi(mats) => mats.len(),
        }
    }

    /// Returns true if there are no slots (an empty `Multi`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the material in the given slot.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&Material> {
        match self {
            MaterialSlots::Single(mat) => (slot == 0).then_some(mat),
            MaterialSlots::Multi(mats) => mats.get(slot),
        }
    }

    /// Iterates over slots in order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        match self {
            MaterialSlots::Single(mat) => std::slice::from_ref(mat).iter(),
            MaterialSlots::Multi(mats) => mats.iter(),
        }
    }

    /// Maps every slot through `f`, preserving slot order and the
    /// single/multi shape.
    #[must_use]
    pub fn map(&self, mut f: impl FnMut(&Material) -> Material) -> MaterialSlots {
        match self {
            MaterialSlots::Single(mat) => MaterialSlots::Single(f(mat)),
            MaterialSlots::Multi(mats) => MaterialSlots::Multi(mats.iter().map(f).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_material_defaults() {
        let mat = StandardMaterial::default();
        assert_eq!(mat.base_color, Vec3::ONE);
        assert!(mat.albedo.is_none());
        assert!(!mat.transparent);
        assert_eq!(mat.opacity, 1.0);
        assert_eq!(mat.side, CullSide::Front);
    }

    #[test]
    fn test_derive_preserves_parameters() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let source = StandardMaterial {
            base_color: Vec3::new(0.8, 0.2, 0.1),
            albedo: None,
            transparent: true,
            opacity: 0.5,
            side: CullSide::Double,
        };

        let toon = ToonMaterial::derive(&source, &ramp);
        assert_eq!(toon.base_color, source.base_color);
        assert!(toon.transparent);
        assert_eq!(toon.opacity, 0.5);
        assert_eq!(toon.side, CullSide::Double);
        assert!(Arc::ptr_eq(&toon.ramp, &ramp));
    }

    #[test]
    fn test_derive_tags_albedo_srgb() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let tex = Arc::new(TextureData::new(1, 1, vec![255, 0, 0, 255], false));
        let source = StandardMaterial {
            albedo: Some(Arc::clone(&tex)),
            ..StandardMaterial::default()
        };

        let toon = ToonMaterial::derive(&source, &ramp);
        let derived_tex = toon.albedo.expect("albedo carried over");
        assert!(derived_tex.srgb);
        assert_eq!(derived_tex.rgba, tex.rgba);
        // The source texture is left untouched.
        assert!(!tex.srgb);
    }

    #[test]
    fn test_derive_shares_already_srgb_albedo() {
        let ramp = Arc::new(GradientRamp::three_tone());
        let tex = Arc::new(TextureData::new(1, 1, vec![0, 255, 0, 255], true));
        let source = StandardMaterial {
            albedo: Some(Arc::clone(&tex)),
            ..StandardMaterial::default()
        };

        let toon = ToonMaterial::derive(&source, &ramp);
        assert!(Arc::ptr_eq(toon.albedo.as_ref().unwrap(), &tex));
    }

    #[test]
    fn test_slots_shape_preserved_by_map() {
        let single = MaterialSlots::Single(Material::Standard(StandardMaterial::default()));
        let mapped = single.map(Material::clone);
        assert!(matches!(mapped, MaterialSlots::Single(_)));
        assert_eq!(mapped.len(), 1);

        let multi = MaterialSlots::Multi(vec![
            Material::Standard(StandardMaterial::default()),
            Material::Standard(StandardMaterial {
                base_color: Vec3::X,
                ..StandardMaterial::default()
            }),
        ]);
        let mapped = multi.map(Material::clone);
        assert!(matches!(mapped, MaterialSlots::Multi(_)));
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped.get(1).unwrap().base_color(), Vec3::X);
    }
}
