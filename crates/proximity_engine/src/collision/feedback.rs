//! Collision highlight feedback
//!
//! One shared highlight material covers every flagged mesh; applying it to a
//! link swaps mesh materials in place and remembers the originals. Restores
//! hand back a fresh copy of the original record rather than the stored
//! handle, so downstream caching keyed on instance identity sees a change.
//! An owner tag on each mesh keeps the highlight from clobbering coloring
//! applied by other subsystems.

use std::sync::Arc;

use slotmap::SecondaryMap;

use crate::config::VisualizationSettings;
use crate::scene::{KinematicModel, LinkId, Material, MaterialOverride, MeshKey, SharedMaterial};

/// Swaps highlight materials onto colliding links and back off again.
#[derive(Debug)]
pub struct MaterialFeedback {
    highlight: SharedMaterial,
    override_priority: bool,
    originals: SecondaryMap<MeshKey, SharedMaterial>,
}

impl MaterialFeedback {
    /// Build the single shared highlight instance from the configured look.
    pub fn new(settings: &VisualizationSettings) -> Self {
        let [r, g, b] = settings.collision_color;
        let mut material = Material::opaque("collision_highlight", [r, g, b, 1.0])
            .with_emissive(settings.collision_color, settings.emissive_intensity);
        if settings.transparent {
            material = material.with_opacity(settings.opacity);
        }
        Self {
            highlight: Arc::new(material),
            override_priority: settings.override_priority,
            originals: SecondaryMap::new(),
        }
    }

    /// The shared highlight handle; every highlighted mesh points at it.
    pub fn highlight(&self) -> &SharedMaterial {
        &self.highlight
    }

    /// Highlight every renderable mesh of a link.
    ///
    /// Meshes already showing the highlight are left untouched, so repeat
    /// calls while a pair stays active cause no material churn. Meshes owned
    /// by another subsystem are skipped unless the highlight is configured
    /// to take priority.
    pub fn apply(&mut self, model: &mut KinematicModel, link: LinkId) {
        for key in model.link(link).meshes.clone() {
            let override_priority = self.override_priority;
            let Some(mesh) = model.mesh_mut(key) else { continue };
            if mesh.overlay {
                continue;
            }
            if SharedMaterial::ptr_eq(&mesh.material, &self.highlight) {
                continue;
            }
            if mesh.override_owner != MaterialOverride::None
                && mesh.override_owner != MaterialOverride::Collision
                && !override_priority
            {
                log::debug!(
                    "feedback: mesh '{}' owned by {:?}, highlight skipped",
                    mesh.name,
                    mesh.override_owner
                );
                continue;
            }

            // Remember the real material exactly once per episode.
            if let Some(entry) = self.originals.entry(key) {
                entry.or_insert_with(|| mesh.material.clone());
            }
            mesh.material = self.highlight.clone();
            mesh.override_owner = MaterialOverride::Collision;
        }
    }

    /// Put a link's own materials back.
    ///
    /// Each mesh receives a fresh copy of its remembered material, not the
    /// stored handle itself.
    pub fn restore(&mut self, model: &mut KinematicModel, link: LinkId) {
        for key in model.link(link).meshes.clone() {
            let Some(original) = self.originals.remove(key) else {
                continue;
            };
            if let Some(mesh) = model.mesh_mut(key) {
                mesh.material = Arc::new((*original).clone());
                mesh.override_owner = MaterialOverride::None;
            }
        }
    }

    /// Restore every highlighted mesh in the model, regardless of link.
    pub fn clear(&mut self, model: &mut KinematicModel) {
        let keys: Vec<MeshKey> = self.originals.keys().collect();
        for key in keys {
            let Some(original) = self.originals.remove(key) else {
                continue;
            };
            if let Some(mesh) = model.mesh_mut(key) {
                mesh.material = Arc::new((*original).clone());
                mesh.override_owner = MaterialOverride::None;
            }
        }
    }

    /// Whether any mesh currently carries the highlight.
    pub fn is_active(&self) -> bool {
        !self.originals.is_empty()
    }
}
