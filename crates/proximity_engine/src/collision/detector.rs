//! Self-collision detector facade
//!
//! Owns the whole pipeline: proxy build, adjacency exclusion, backend scan,
//! severity classification, pair tracking, and material feedback. Detection
//! runs on its own capped cadence inside `update`; callers invoke it every
//! frame and most calls return without doing any work.

use std::time::{Duration, Instant};

use crate::collision::adjacency::AdjacencyGraph;
use crate::collision::backend::{bounds, create_backend, BackendKind, DetectionBackend};
use crate::collision::classifier::SeverityClassifier;
use crate::collision::feedback::MaterialFeedback;
use crate::collision::pair::{CollisionPair, PairReading, Severity};
use crate::collision::proxy::ProxySet;
use crate::collision::tracker::{CollisionEvent, CollisionTracker, DetectionStatus, EventKind};
use crate::config::DetectionConfig;
use crate::foundation::time::IntervalGate;
use crate::scene::{KinematicModel, LinkId};

/// Callback invoked once per Begin/End transition.
pub type EventCallback = Box<dyn FnMut(&CollisionEvent) + Send>;

/// Everything derived from one model load. Dropped on `invalidate`.
struct Session {
    proxies: ProxySet,
    adjacency: AdjacencyGraph,
    classifier: SeverityClassifier,
    backend: Box<dyn DetectionBackend>,
}

/// Real-time self-collision and proximity monitor for one kinematic model.
pub struct SelfCollisionDetector {
    config: DetectionConfig,
    backend_kind: BackendKind,
    gate: IntervalGate,
    enabled: bool,
    session: Option<Session>,
    tracker: CollisionTracker,
    feedback: MaterialFeedback,
    callback: Option<EventCallback>,
}

impl SelfCollisionDetector {
    /// Create a detector with the given configuration and backend choice.
    ///
    /// No per-model state exists yet; call [`initialize`](Self::initialize)
    /// once the model is loaded.
    pub fn new(config: DetectionConfig, backend_kind: BackendKind) -> Self {
        let gate = IntervalGate::new(Duration::from_millis(config.detection_interval_ms));
        let enabled = config.enabled;
        let feedback = MaterialFeedback::new(&config.visualization);
        Self {
            config,
            backend_kind,
            gate,
            enabled,
            session: None,
            tracker: CollisionTracker::new(),
            feedback,
            callback: None,
        }
    }

    /// Build the per-model state: proxies, adjacency, thresholds, backend.
    ///
    /// Replaces any previous session; tracked pairs are dropped silently.
    pub fn initialize(&mut self, model: &KinematicModel) {
        let proxies = ProxySet::build(model, &self.config.skip_links);
        let adjacency = AdjacencyGraph::build(model, &self.config.adjacency_exclusions);
        let classifier = SeverityClassifier::from_config(&self.config, model);
        let backend = create_backend(
            self.backend_kind,
            &self.config,
            classifier.max_warning_distance(),
        );

        log::info!(
            "detector: initialized for {} links ({} proxies, {} excluded pairs, {:?})",
            model.link_count(),
            proxies.len(),
            adjacency.len(),
            self.backend_kind,
        );

        self.session = Some(Session {
            proxies,
            adjacency,
            classifier,
            backend,
        });
        self.tracker.clear_silent();
        self.gate.reset();
    }

    /// Drop the per-model state, e.g. before a different model is loaded.
    ///
    /// Call [`disable`](Self::disable) first when highlights may be showing;
    /// restoring them needs the old model.
    pub fn invalidate(&mut self) {
        self.session = None;
        self.tracker.clear_silent();
        self.gate.reset();
    }

    /// Register the transition callback. Replaces any previous one.
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.callback = Some(callback);
    }

    /// Run one frame of the pipeline.
    ///
    /// Returns the Begin/End transitions of this tick, which is empty on the
    /// (common) frames the cadence gate holds back. Feedback and the event
    /// callback have already been applied to everything returned.
    pub fn update(&mut self, model: &mut KinematicModel, now: Instant) -> Vec<CollisionEvent> {
        if !self.enabled {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            log::trace!("detector: update before initialize, skipped");
            return Vec::new();
        };
        if !self.gate.ready(now) {
            return Vec::new();
        }

        let readings =
            session
                .backend
                .scan(model, &session.proxies, &session.adjacency, now);
        let classified: Vec<(PairReading, Severity)> = readings
            .iter()
            .map(|reading| (*reading, session.classifier.classify(reading)))
            .collect();

        let events = self.tracker.apply(&classified, now);
        for event in &events {
            match event.kind {
                EventKind::Begin => {
                    log::info!(
                        "collision begin: {} / {} ({:?}, d={:.4})",
                        model.link_name(event.link_a),
                        model.link_name(event.link_b),
                        event.severity,
                        event.distance,
                    );
                    self.feedback.apply(model, event.link_a);
                    self.feedback.apply(model, event.link_b);
                }
                EventKind::End => {
                    log::info!(
                        "collision end: {} / {}",
                        model.link_name(event.link_a),
                        model.link_name(event.link_b),
                    );
                    // A link keeps its highlight while any other pair of its
                    // is still active.
                    for link in [event.link_a, event.link_b] {
                        if !self.tracker.is_link_colliding(link) {
                            self.feedback.restore(model, link);
                        }
                    }
                }
            }
            if let Some(callback) = self.callback.as_mut() {
                callback(event);
            }
        }
        events
    }

    /// Resume detection. The next `update` runs immediately, and pairs still
    /// in contact produce fresh Begin transitions.
    pub fn enable(&mut self) {
        self.enabled = true;
        self.gate.reset();
    }

    /// Pause detection and clear all visible and tracked state.
    ///
    /// No End events fire; consumers must treat the collision state as
    /// unknown while disabled.
    pub fn disable(&mut self, model: &mut KinematicModel) {
        self.enabled = false;
        self.tracker.clear_silent();
        self.feedback.clear(model);
        if let Some(session) = self.session.as_mut() {
            session.backend.reset();
        }
        self.gate.reset();
    }

    /// Whether `update` currently does any work.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Change the detection cadence at runtime.
    pub fn set_interval(&mut self, interval: Duration) {
        self.gate.set_interval(interval);
    }

    /// One-shot precise measurement of a named pair, bypassing the cadence
    /// gate, adjacency exclusion, and tracking.
    ///
    /// Returns None for unknown names, proxy-less links, or before
    /// `initialize`.
    pub fn probe_pair(
        &self,
        model: &KinematicModel,
        name_a: &str,
        name_b: &str,
    ) -> Option<(PairReading, Severity)> {
        let session = self.session.as_ref()?;
        let a = model.resolve(name_a)?;
        let b = model.resolve(name_b)?;
        let reading = bounds::measure_pair(model, &session.proxies, a, b)?;
        Some((reading, session.classifier.classify(&reading)))
    }

    /// Currently active pairs, in no particular order.
    pub fn active_pairs(&self) -> Vec<CollisionPair> {
        self.tracker.active_pairs().copied().collect()
    }

    /// Whether a link participates in any active pair.
    pub fn is_link_colliding(&self, link: LinkId) -> bool {
        self.tracker.is_link_colliding(link)
    }

    /// Links a given link is actively paired with.
    pub fn partners_of(&self, link: LinkId) -> Vec<LinkId> {
        self.tracker.partners_of(link)
    }

    /// All links participating in at least one active pair.
    pub fn colliding_links(&self) -> Vec<LinkId> {
        self.tracker.colliding_links()
    }

    /// Aggregate snapshot for status displays.
    pub fn status(&self) -> DetectionStatus {
        self.tracker.status()
    }

    /// Tear down: restore visuals, drop the session and the callback.
    pub fn dispose(&mut self, model: &mut KinematicModel) {
        self.disable(model);
        self.session = None;
        self.callback = None;
    }
}

impl std::fmt::Debug for SelfCollisionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelfCollisionDetector")
            .field("backend_kind", &self.backend_kind)
            .field("enabled", &self.enabled)
            .field("initialized", &self.session.is_some())
            .field("active_pairs", &self.status().total_pairs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdSettings;
    use crate::foundation::math::{Mat4, Vec3};
    use crate::scene::model::test_support::two_arm_model;
    use crate::scene::MaterialOverride;

    const TICK: Duration = Duration::from_millis(100);

    fn test_config() -> DetectionConfig {
        DetectionConfig {
            skip_links: vec!["base".into()],
            default_threshold: ThresholdSettings {
                warning: 0.05,
                danger: 0.01,
            },
            ..DetectionConfig::default()
        }
    }

    fn detector(kind: BackendKind, model: &KinematicModel) -> SelfCollisionDetector {
        let mut det = SelfCollisionDetector::new(test_config(), kind);
        det.initialize(model);
        det
    }

    fn both_backends(run: impl Fn(BackendKind)) {
        run(BackendKind::Bounds);
        run(BackendKind::KinematicWorld);
    }

    #[test]
    fn overlap_begins_exactly_once() {
        both_backends(|kind| {
            let (mut model, left, right) = two_arm_model(0.0, 0.6);
            let mut det = detector(kind, &model);
            let t0 = Instant::now();

            let events = det.update(&mut model, t0);
            assert_eq!(events.len(), 1, "{kind:?}");
            assert_eq!(events[0].kind, EventKind::Begin);
            assert_eq!(events[0].severity, Severity::Collision);
            assert!(det.is_link_colliding(left));
            assert_eq!(det.partners_of(left), vec![right]);

            // Steady contact: later ticks stay silent.
            assert!(det.update(&mut model, t0 + TICK).is_empty());
            assert!(det.update(&mut model, t0 + TICK * 2).is_empty());
            assert_eq!(det.active_pairs().len(), 1);
        });
    }

    #[test]
    fn separation_ends_exactly_once() {
        both_backends(|kind| {
            let (mut model, _, right) = two_arm_model(0.0, 0.6);
            let mut det = detector(kind, &model);
            let t0 = Instant::now();
            assert_eq!(det.update(&mut model, t0).len(), 1);

            model.set_world_transform(right, Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
            let events = det.update(&mut model, t0 + TICK);
            assert_eq!(events.len(), 1, "{kind:?}");
            assert_eq!(events[0].kind, EventKind::End);

            assert!(det.update(&mut model, t0 + TICK * 2).is_empty());
            assert!(det.active_pairs().is_empty());
            assert!(!det.status().has_collision);
        });
    }

    #[test]
    fn excluded_pair_stays_silent_across_poses() {
        both_backends(|kind| {
            let (mut model, _, right) = two_arm_model(0.0, 0.2);
            let mut config = test_config();
            config.adjacency_exclusions = vec![("left".into(), "right".into())];
            let mut det = SelfCollisionDetector::new(config, kind);
            det.initialize(&model);

            let t0 = Instant::now();
            for i in 0_u16..4 {
                model.set_world_transform(
                    right,
                    Mat4::new_translation(&Vec3::new(0.2 * f32::from(i), 0.0, 0.0)),
                );
                assert!(det.update(&mut model, t0 + TICK * u32::from(i)).is_empty());
            }
            assert!(det.active_pairs().is_empty());
        });
    }

    #[test]
    fn disable_clears_silently_and_enable_rebegins() {
        both_backends(|kind| {
            let (mut model, left, _) = two_arm_model(0.0, 0.6);
            let mut det = detector(kind, &model);
            let t0 = Instant::now();
            assert_eq!(det.update(&mut model, t0).len(), 1);

            det.disable(&mut model);
            assert!(!det.is_enabled());
            assert!(det.active_pairs().is_empty());
            // Highlight gone without an End event.
            let key = model.link(left).meshes[0];
            assert_eq!(model.mesh(key).unwrap().override_owner, MaterialOverride::None);
            assert!(det.update(&mut model, t0 + TICK).is_empty());

            det.enable();
            let events = det.update(&mut model, t0 + TICK * 2);
            assert_eq!(events.len(), 1, "{kind:?}");
            assert_eq!(events[0].kind, EventKind::Begin);
        });
    }

    #[test]
    fn cadence_gate_holds_updates_between_ticks() {
        let (mut model, _, right) = two_arm_model(0.0, 5.0);
        let mut det = detector(BackendKind::Bounds, &model);
        let t0 = Instant::now();
        assert!(det.update(&mut model, t0).is_empty());

        // Contact happens between ticks; nothing is seen until the gate opens.
        model.set_world_transform(right, Mat4::new_translation(&Vec3::new(0.6, 0.0, 0.0)));
        assert!(det.update(&mut model, t0 + Duration::from_millis(30)).is_empty());
        assert!(det.active_pairs().is_empty());
        assert_eq!(det.update(&mut model, t0 + TICK).len(), 1);
    }

    #[test]
    fn highlight_follows_begin_and_end() {
        let (mut model, left, right) = two_arm_model(0.0, 0.6);
        let mut det = detector(BackendKind::Bounds, &model);
        let t0 = Instant::now();
        det.update(&mut model, t0);

        let key = model.link(left).meshes[0];
        assert_eq!(
            model.mesh(key).unwrap().override_owner,
            MaterialOverride::Collision
        );

        model.set_world_transform(right, Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
        det.update(&mut model, t0 + TICK);
        assert_eq!(model.mesh(key).unwrap().override_owner, MaterialOverride::None);
    }

    #[test]
    fn callback_sees_every_transition() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let (mut model, _, right) = two_arm_model(0.0, 0.6);
        let mut det = detector(BackendKind::Bounds, &model);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        det.set_event_callback(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let t0 = Instant::now();
        det.update(&mut model, t0);
        model.set_world_transform(right, Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0)));
        det.update(&mut model, t0 + TICK);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn probe_measures_named_pair_on_demand() {
        let (model, ..) = two_arm_model(0.0, 1.03);
        let det = detector(BackendKind::Bounds, &model);

        let (reading, severity) = det.probe_pair(&model, "left", "right").expect("probe");
        assert!((reading.distance - 0.03).abs() < 1e-5);
        assert_eq!(severity, Severity::Warning);

        assert!(det.probe_pair(&model, "left", "no_such_link").is_none());
    }

    #[test]
    fn update_before_initialize_is_a_no_op() {
        let (mut model, ..) = two_arm_model(0.0, 0.6);
        let mut det = SelfCollisionDetector::new(test_config(), BackendKind::Bounds);
        assert!(det.update(&mut model, Instant::now()).is_empty());
        assert!(det.active_pairs().is_empty());
        assert!(!det.status().has_collision);
    }

    #[test]
    fn dispose_restores_and_forgets() {
        let (mut model, left, _) = two_arm_model(0.0, 0.6);
        let mut det = detector(BackendKind::Bounds, &model);
        det.update(&mut model, Instant::now());

        det.dispose(&mut model);
        let key = model.link(left).meshes[0];
        assert_eq!(model.mesh(key).unwrap().override_owner, MaterialOverride::None);
        assert!(det.probe_pair(&model, "left", "right").is_none());
    }
}
