//! # Proximity Engine
//!
//! Real-time self-collision and proximity detection for a kinematically
//! driven robot model, as used by a teleoperation dashboard.
//!
//! The engine watches the live pose of an articulated model and answers
//! "which non-adjacent parts are touching or about to touch," feeding a
//! per-pair begin/end event stream and a material-highlight controller.
//!
//! ## Pipeline
//!
//! 1. **Proxy construction** (once per model load): per-link collision
//!    geometry derived from mesh vertex data.
//! 2. **Detection** (capped cadence, ~10 Hz): one of two interchangeable
//!    backends prunes and tests non-adjacent link pairs.
//! 3. **Classification**: measured separation mapped to a severity tier via
//!    configured threshold profiles.
//! 4. **State tracking**: per-pair state machine emitting exactly one begin
//!    and one end event per contact episode.
//! 5. **Feedback**: offending links recolored with a shared highlight
//!    material; originals restored when contact ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proximity_engine::prelude::*;
//! use std::time::Instant;
//!
//! let mut model = KinematicModel::new();
//! // ... populate links and meshes from the loaded robot description ...
//!
//! let config = DetectionConfig::default();
//! let mut detector = SelfCollisionDetector::new(config, BackendKind::Bounds);
//! detector.initialize(&model);
//! detector.set_event_callback(Box::new(|event| {
//!     println!("{:?} {:?} <-> {:?}", event.kind, event.link_a, event.link_b);
//! }));
//!
//! loop {
//!     // ... drive joint targets, update world transforms ...
//!     detector.update(&mut model, Instant::now());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod collision;
pub mod config;
pub mod foundation;
pub mod scene;

/// Commonly used types for dashboard integration.
pub mod prelude {
    pub use crate::collision::{
        BackendKind, CollisionEvent, DetectionMethod, DetectionStatus, EventKind, PairKey,
        SelfCollisionDetector, Severity,
    };
    pub use crate::config::{Config, DetectionConfig};
    pub use crate::foundation::math::{Mat4, Quat, Vec3};
    pub use crate::scene::{KinematicModel, LinkId, Material, MeshInstance};
}
