//! Render material model
//!
//! The engine never talks to a GPU; it only swaps and restores material
//! records on mesh instances. Materials are shared via `Arc` so a single
//! highlight instance can cover many meshes without per-mesh clones, while
//! restores hand back fresh, independent copies.

use std::sync::Arc;

/// Shared material handle as stored on a mesh instance.
pub type SharedMaterial = Arc<Material>;

/// Plain property record describing a surface appearance.
///
/// Equality is property equality; two distinct instances with the same
/// fields compare equal. The renderer owns the mapping to GPU state.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Human-readable material name
    pub name: String,
    /// RGBA base color, linear space
    pub base_color: [f32; 4],
    /// RGB emissive color, linear space
    pub emissive: [f32; 3],
    /// Emissive strength multiplier
    pub emissive_intensity: f32,
    /// Opacity in [0, 1]; only meaningful when `transparent` is set
    pub opacity: f32,
    /// Whether alpha blending is enabled
    pub transparent: bool,
}

impl Material {
    /// Create an opaque material with the given name and base color.
    pub fn opaque(name: impl Into<String>, base_color: [f32; 4]) -> Self {
        Self {
            name: name.into(),
            base_color,
            emissive: [0.0; 3],
            emissive_intensity: 0.0,
            opacity: 1.0,
            transparent: false,
        }
    }

    /// Builder-style emissive setter.
    pub fn with_emissive(mut self, emissive: [f32; 3], intensity: f32) -> Self {
        self.emissive = emissive;
        self.emissive_intensity = intensity;
        self
    }

    /// Builder-style transparency setter.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::opaque("default", [0.8, 0.8, 0.8, 1.0])
    }
}

/// Which subsystem currently owns a mesh's visual state.
///
/// Several features recolor meshes (collision highlight, joint-limit danger
/// color); the owner tag lets them negotiate instead of clobbering each
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialOverride {
    /// No override active; the mesh shows its own material.
    #[default]
    None,
    /// Collision highlight applied by the detection engine.
    Collision,
    /// Joint-limit warning color applied by the limit checker.
    JointLimit,
}
