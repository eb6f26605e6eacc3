//! Detection backend strategy
//!
//! Two interchangeable implementations produce candidate readings for
//! non-adjacent pairs: a bounding-hierarchy scan with triangle refinement,
//! and a persistent kinematic contact world. The variant is chosen at
//! construction; call sites never branch on it.

pub mod bounds;
pub mod kinematic;

pub use bounds::BoundsBackend;
pub use kinematic::KinematicWorldBackend;

use std::time::Instant;

use crate::collision::adjacency::AdjacencyGraph;
use crate::collision::pair::{DetectionMethod, PairReading};
use crate::collision::proxy::ProxySet;
use crate::config::DetectionConfig;
use crate::scene::KinematicModel;

/// Backend selection at detector construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// World-bound pruning + sampled triangle refinement
    Bounds,
    /// Persistent pose-driven contact world with its own broad phase
    KinematicWorld,
}

/// One interchangeable detection strategy.
///
/// A scan visits the current pose and returns readings for every candidate
/// pair that survives adjacency exclusion. Backends may keep persistent
/// state between scans (the kinematic world does); `reset` drops it.
pub trait DetectionBackend: Send {
    /// Run one detection pass against the live pose.
    fn scan(
        &mut self,
        model: &KinematicModel,
        proxies: &ProxySet,
        adjacency: &AdjacencyGraph,
        now: Instant,
    ) -> Vec<PairReading>;

    /// Drop per-session state (contacts, bodies); proxies are untouched.
    fn reset(&mut self);

    /// Primary method label for this backend's readings.
    fn method(&self) -> DetectionMethod;
}

/// Construct the configured backend variant.
pub fn create_backend(
    kind: BackendKind,
    config: &DetectionConfig,
    report_distance: f32,
) -> Box<dyn DetectionBackend> {
    match kind {
        BackendKind::Bounds => Box::new(BoundsBackend::new(report_distance)),
        BackendKind::KinematicWorld => Box::new(KinematicWorldBackend::new(
            config.shape_margin,
            config.min_half_extent,
        )),
    }
}
