//! Kinematic scene model consumed by the detection engine.
//!
//! The dashboard's loader populates a [`KinematicModel`] from the robot
//! description; joint drivers then mutate only world transforms. The detector
//! reads geometry and topology from here and touches nothing but mesh
//! materials.

pub mod materials;
pub mod model;

pub use materials::{Material, MaterialOverride, SharedMaterial};
pub use model::{KinematicModel, Link, LinkId, MeshInstance, MeshKey};
