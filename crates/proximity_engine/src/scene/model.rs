//! Link/joint tree with per-link meshes and live world transforms.

use std::collections::HashMap;
use std::fmt;

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Point3};
use crate::scene::materials::{Material, MaterialOverride, SharedMaterial};

new_key_type! {
    /// Stable opaque handle for a mesh instance.
    ///
    /// Material bookkeeping keys off this handle rather than object identity,
    /// so material swaps and clones cannot break the mapping.
    pub struct MeshKey;
}

/// Stable identity of a link within one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u32);

impl LinkId {
    /// Raw index, mainly for debug output.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0)
    }
}

/// One mesh owned by a link, with geometry in link-local space.
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Mesh name from the robot description
    pub name: String,
    /// Vertex positions in link-local coordinates
    pub vertices: Vec<Point3>,
    /// Triangle indices into `vertices`
    pub indices: Vec<u32>,
    /// Current material (shared handle)
    pub material: SharedMaterial,
    /// Which subsystem, if any, currently overrides the visual state
    pub override_owner: MaterialOverride,
    /// Marks meshes that belong to an unrelated visual concern (translucent
    /// target previews and the like); excluded from proxies and highlights.
    pub overlay: bool,
}

impl MeshInstance {
    /// Create a mesh instance with a default material.
    pub fn new(name: impl Into<String>, vertices: Vec<Point3>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            material: SharedMaterial::new(Material::default()),
            override_owner: MaterialOverride::None,
            overlay: false,
        }
    }

    /// Mark this mesh as an overlay (preview) mesh.
    pub fn as_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    /// True when the mesh carries usable triangle data.
    pub fn has_geometry(&self) -> bool {
        !self.vertices.is_empty() && self.indices.len() >= 3
    }
}

/// A rigid segment of the articulated model.
#[derive(Debug)]
pub struct Link {
    /// Link name from the robot description
    pub name: String,
    /// Parent link in the kinematic tree (None for the root)
    pub parent: Option<LinkId>,
    /// Meshes owned by this link
    pub meshes: Vec<MeshKey>,
    world: Mat4,
}

impl Link {
    /// Current world transform of the link frame.
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }
}

/// The kinematic scene: link tree, mesh store, and live pose.
///
/// Pose updates mutate only world transforms; geometry and topology are
/// stable between explicit reloads.
#[derive(Debug, Default)]
pub struct KinematicModel {
    links: Vec<Link>,
    by_name: HashMap<String, LinkId>,
    meshes: SlotMap<MeshKey, MeshInstance>,
}

impl KinematicModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link under an optional parent. Returns its id.
    ///
    /// Duplicate names replace the name-table entry but keep both links;
    /// loaders are expected to provide unique names.
    pub fn add_link(&mut self, name: impl Into<String>, parent: Option<LinkId>) -> LinkId {
        let name = name.into();
        let id = LinkId(u32::try_from(self.links.len()).unwrap_or(u32::MAX));
        self.by_name.insert(name.clone(), id);
        self.links.push(Link {
            name,
            parent,
            meshes: Vec::new(),
            world: Mat4::identity(),
        });
        id
    }

    /// Attach a mesh instance to a link. Returns its stable handle.
    pub fn add_mesh(&mut self, link: LinkId, mesh: MeshInstance) -> MeshKey {
        let key = self.meshes.insert(mesh);
        self.links[link.0 as usize].meshes.push(key);
        key
    }

    /// Set the current world transform of a link.
    pub fn set_world_transform(&mut self, link: LinkId, world: Mat4) {
        self.links[link.0 as usize].world = world;
    }

    /// Current world transform accessor.
    pub fn world_transform(&self, link: LinkId) -> &Mat4 {
        &self.links[link.0 as usize].world
    }

    /// Look up a link by name.
    pub fn resolve(&self, name: &str) -> Option<LinkId> {
        self.by_name.get(name).copied()
    }

    /// Borrow a link.
    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0 as usize]
    }

    /// Name of a link.
    pub fn link_name(&self, id: LinkId) -> &str {
        &self.links[id.0 as usize].name
    }

    /// Iterate all link ids in insertion order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        (0..self.links.len()).map(|i| LinkId(i as u32))
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Parent/child pairs of the kinematic tree.
    pub fn topology_pairs(&self) -> impl Iterator<Item = (LinkId, LinkId)> + '_ {
        self.links.iter().enumerate().filter_map(|(i, link)| {
            link.parent.map(|parent| (LinkId(i as u32), parent))
        })
    }

    /// Borrow a mesh instance.
    pub fn mesh(&self, key: MeshKey) -> Option<&MeshInstance> {
        self.meshes.get(key)
    }

    /// Mutably borrow a mesh instance.
    pub fn mesh_mut(&mut self, key: MeshKey) -> Option<&mut MeshInstance> {
        self.meshes.get_mut(key)
    }
}
