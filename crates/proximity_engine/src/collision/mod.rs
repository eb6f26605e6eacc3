//! Self-collision detection pipeline.
//!
//! [`SelfCollisionDetector`] is the entry point; the submodules hold the
//! stages it wires together. Proxies and the adjacency graph are built once
//! per model load, a backend scans the live pose on a capped cadence, and
//! readings flow through classification into the pair tracker, which drives
//! material feedback and the event callback.

pub mod adjacency;
pub mod backend;
pub mod classifier;
pub mod detector;
pub mod feedback;
pub mod pair;
pub mod primitives;
pub mod proxy;
pub mod tracker;

pub use adjacency::AdjacencyGraph;
pub use backend::{BackendKind, BoundsBackend, DetectionBackend, KinematicWorldBackend};
pub use classifier::{SeverityClassifier, ThresholdProfile};
pub use detector::{EventCallback, SelfCollisionDetector};
pub use feedback::MaterialFeedback;
pub use pair::{CollisionPair, DetectionMethod, PairKey, PairReading, Severity};
pub use primitives::{Aabb, Triangle};
pub use proxy::{LinkProxy, ProxySet};
pub use tracker::{CollisionEvent, CollisionTracker, DetectionStatus, EventKind};
