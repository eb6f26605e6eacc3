//! Per-link proxy geometry
//!
//! Proxies are built exactly once per model load from mesh vertex data in
//! link-local space. Each detection tick only re-transforms the cached local
//! bound by the link's current world matrix; the underlying structure is
//! never rebuilt on the per-tick path. Links without usable geometry are
//! skipped and excluded from pair generation.

use std::collections::BTreeMap;

use crate::collision::primitives::{Aabb, Triangle};
use crate::foundation::math::{Mat4, Vec3};
use crate::scene::{KinematicModel, LinkId};

/// Build-once collision stand-in for a single link.
#[derive(Debug, Clone)]
pub struct LinkProxy {
    link: LinkId,
    local_bounds: Aabb,
    triangles: Vec<Triangle>,
}

impl LinkProxy {
    /// Derive a proxy from a link's non-overlay meshes.
    ///
    /// Returns None when no mesh contributes usable vertex/index data.
    fn build(model: &KinematicModel, link: LinkId) -> Option<Self> {
        let mut triangles = Vec::new();
        let mut bounds: Option<Aabb> = None;

        for &key in &model.link(link).meshes {
            let Some(mesh) = model.mesh(key) else { continue };
            if mesh.overlay || !mesh.has_geometry() {
                continue;
            }

            for tri in mesh.indices.chunks_exact(3) {
                let fetch = |i: u32| mesh.vertices.get(i as usize).map(|p| p.coords);
                let (Some(a), Some(b), Some(c)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2]))
                else {
                    continue; // out-of-range index, drop the triangle
                };
                triangles.push(Triangle::new(a, b, c));
            }

            if let Some(mesh_bounds) = Aabb::from_points(&mesh.vertices) {
                bounds = Some(match bounds {
                    Some(existing) => existing.union(&mesh_bounds),
                    None => mesh_bounds,
                });
            }
        }

        let local_bounds = bounds?;
        if triangles.is_empty() {
            return None;
        }
        Some(Self {
            link,
            local_bounds,
            triangles,
        })
    }

    /// The link this proxy stands in for.
    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Cached local-space bound.
    pub fn local_bounds(&self) -> &Aabb {
        &self.local_bounds
    }

    /// World-space bound for the current pose. Cheap; no rebuild.
    pub fn world_bounds(&self, world: &Mat4) -> Aabb {
        self.local_bounds.transformed(world)
    }

    /// Number of triangles in the local template.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Up to `max` world-space triangles, evenly sampled from the template.
    ///
    /// Sampling keeps the precise pass bounded on dense meshes; cost scales
    /// with the cap rather than mesh size.
    pub fn sampled_world_triangles(&self, world: &Mat4, max: usize) -> Vec<Triangle> {
        if self.triangles.is_empty() || max == 0 {
            return Vec::new();
        }
        let step = (self.triangles.len() / max).max(1);
        self.triangles
            .iter()
            .step_by(step)
            .take(max)
            .map(|t| t.transformed(world))
            .collect()
    }
}

/// All link proxies of one model, plus the links that had to be skipped.
#[derive(Debug, Default)]
pub struct ProxySet {
    proxies: BTreeMap<LinkId, LinkProxy>,
    skipped: Vec<LinkId>,
}

impl ProxySet {
    /// Build proxies for every link, honoring the configured skip list.
    ///
    /// Links without valid geometry are logged once and silently excluded
    /// from all pair generation; this is not an error.
    pub fn build(model: &KinematicModel, skip_links: &[String]) -> Self {
        let mut proxies = BTreeMap::new();
        let mut skipped = Vec::new();

        for link in model.link_ids() {
            let name = model.link_name(link);
            if skip_links.iter().any(|s| s == name) {
                log::debug!("proxy: link '{name}' on skip list");
                skipped.push(link);
                continue;
            }
            match LinkProxy::build(model, link) {
                Some(proxy) => {
                    proxies.insert(link, proxy);
                }
                None => {
                    log::warn!("proxy: link '{name}' has no usable mesh data, excluded");
                    skipped.push(link);
                }
            }
        }

        log::info!(
            "proxy: built {} link proxies ({} skipped)",
            proxies.len(),
            skipped.len()
        );
        Self { proxies, skipped }
    }

    /// Proxy for a link, if one was built.
    pub fn get(&self, link: LinkId) -> Option<&LinkProxy> {
        self.proxies.get(&link)
    }

    /// Iterate proxies in link order.
    pub fn iter(&self) -> impl Iterator<Item = &LinkProxy> {
        self.proxies.values()
    }

    /// Links excluded at build time.
    pub fn skipped(&self) -> &[LinkId] {
        &self.skipped
    }

    /// Number of proxies.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// True when no proxies exist.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Approximate world-space radius of a link, for shape sizing.
    pub fn local_radius(&self, link: LinkId) -> Option<f32> {
        self.get(link)
            .map(|p| p.local_bounds().half_extents().norm())
    }
}

/// Half-extents of a proxy's local bound, shrunk by a margin factor with a
/// floor so thin parts remain detectable.
pub fn scaled_half_extents(proxy: &LinkProxy, margin: f32, min_half_extent: f32) -> Vec3 {
    let h = proxy.local_bounds().half_extents() * margin;
    Vec3::new(
        h.x.max(min_half_extent),
        h.y.max(min_half_extent),
        h.z.max(min_half_extent),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::model::test_support::cube_mesh;
    use crate::scene::MeshInstance;
    use approx::assert_relative_eq;

    #[test]
    fn builds_once_and_transforms_per_tick() {
        let mut model = KinematicModel::new();
        let link = model.add_link("FOREARM_L", None);
        model.add_mesh(link, cube_mesh("forearm", 0.5));

        let proxies = ProxySet::build(&model, &[]);
        let proxy = proxies.get(link).expect("proxy built");
        assert_eq!(proxy.triangle_count(), 12);

        let world = Mat4::new_translation(&Vec3::new(3.0, 0.0, 0.0));
        let bounds = proxy.world_bounds(&world);
        assert_relative_eq!(bounds.center().x, 3.0);
        // Local template untouched by the pose.
        assert_relative_eq!(proxy.local_bounds().center().x, 0.0);
    }

    #[test]
    fn link_without_geometry_is_skipped_not_fatal() {
        let mut model = KinematicModel::new();
        let empty = model.add_link("TCP_L", None);
        model.add_mesh(empty, MeshInstance::new("frame_only", Vec::new(), Vec::new()));
        let solid = model.add_link("HAND_L", None);
        model.add_mesh(solid, cube_mesh("palm", 0.05));

        let proxies = ProxySet::build(&model, &[]);
        assert!(proxies.get(empty).is_none());
        assert!(proxies.get(solid).is_some());
        assert_eq!(proxies.skipped(), &[empty]);
    }

    #[test]
    fn overlay_meshes_do_not_contribute() {
        let mut model = KinematicModel::new();
        let link = model.add_link("HEAD", None);
        model.add_mesh(link, cube_mesh("head", 0.1));
        model.add_mesh(link, cube_mesh("preview", 5.0).as_overlay());

        let proxies = ProxySet::build(&model, &[]);
        let proxy = proxies.get(link).unwrap();
        assert_relative_eq!(proxy.local_bounds().half_extents().x, 0.1);
    }

    #[test]
    fn skip_list_excludes_by_name() {
        let mut model = KinematicModel::new();
        let base = model.add_link("base_link", None);
        model.add_mesh(base, cube_mesh("pedestal", 1.0));

        let proxies = ProxySet::build(&model, &["base_link".into()]);
        assert!(proxies.get(base).is_none());
        assert!(proxies.is_empty());
    }

    #[test]
    fn triangle_sampling_is_capped() {
        let mut model = KinematicModel::new();
        let link = model.add_link("TORSO", None);
        model.add_mesh(link, cube_mesh("torso", 0.5));

        let proxies = ProxySet::build(&model, &[]);
        let proxy = proxies.get(link).unwrap();
        let sampled = proxy.sampled_world_triangles(&Mat4::identity(), 4);
        assert_eq!(sampled.len(), 4);
    }

    #[test]
    fn local_radius_spans_the_bound_diagonal() {
        let mut model = KinematicModel::new();
        let link = model.add_link("TORSO", None);
        model.add_mesh(link, cube_mesh("torso", 0.5));

        let proxies = ProxySet::build(&model, &[]);
        assert_relative_eq!(
            proxies.local_radius(link).unwrap(),
            3.0_f32.sqrt() * 0.5,
            epsilon = 1e-6
        );
    }

    #[test]
    fn margin_scaling_has_floor() {
        let mut model = KinematicModel::new();
        let link = model.add_link("FINGER", None);
        model.add_mesh(link, cube_mesh("finger", 0.002));

        let proxies = ProxySet::build(&model, &[]);
        let h = scaled_half_extents(proxies.get(link).unwrap(), 0.95, 0.005);
        assert_relative_eq!(h.x, 0.005);
    }
}
