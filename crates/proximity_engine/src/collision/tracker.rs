//! Collision state tracking
//!
//! Per-pair state machine turning raw per-tick reports into deduplicated
//! begin/end events: exactly one Begin on the Idle→Active edge, exactly one
//! End on the Active→Idle edge, nothing while steady. A reverse index makes
//! "is this link involved anywhere" an O(degree) lookup.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::collision::pair::{CollisionPair, DetectionMethod, PairKey, PairReading, Severity};
use crate::scene::LinkId;

/// Transition kind carried by a collision event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Pair became Active this tick
    Begin,
    /// Pair stopped being reported this tick
    End,
}

/// State transition notification delivered to the dashboard.
#[derive(Debug, Clone, Copy)]
pub struct CollisionEvent {
    /// Begin or End
    pub kind: EventKind,
    /// First link of the normalized pair
    pub link_a: LinkId,
    /// Second link of the normalized pair
    pub link_b: LinkId,
    /// Severity at the transition (last known severity for End)
    pub severity: Severity,
    /// Last measured distance
    pub distance: f32,
    /// Detection method of the underlying reading
    pub method: DetectionMethod,
    /// Tick time of the transition
    pub timestamp: Instant,
}

/// Aggregate snapshot for status panels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionStatus {
    /// Any pair currently at Collision severity
    pub has_collision: bool,
    /// Any pair currently at Warning severity
    pub has_warning: bool,
    /// Number of Active pairs at Collision severity
    pub collision_count: usize,
    /// Number of Active pairs at Warning severity
    pub warning_count: usize,
    /// Total Active pairs
    pub total_pairs: usize,
}

/// Set of Active pairs plus the link→pairs reverse index.
#[derive(Debug, Default)]
pub struct CollisionTracker {
    active: HashMap<PairKey, CollisionPair>,
    by_link: HashMap<LinkId, HashSet<PairKey>>,
}

impl CollisionTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one tick of classified readings and return the transitions.
    ///
    /// Only readings at severity >= Warning keep a pair Active; a pair whose
    /// reading drops to Normal ends the same as one no longer reported.
    pub fn apply(
        &mut self,
        readings: &[(PairReading, Severity)],
        now: Instant,
    ) -> Vec<CollisionEvent> {
        let mut events = Vec::new();
        let mut reported: HashSet<PairKey> = HashSet::new();

        for &(reading, severity) in readings {
            if severity < Severity::Warning {
                continue;
            }
            reported.insert(reading.key);

            match self.active.get_mut(&reading.key) {
                Some(pair) => {
                    // Steady state: refresh the record, no event.
                    pair.severity = severity;
                    pair.distance = reading.distance;
                    pair.method = reading.method;
                    pair.timestamp = now;
                }
                None => {
                    let pair = CollisionPair {
                        key: reading.key,
                        severity,
                        distance: reading.distance,
                        method: reading.method,
                        timestamp: now,
                    };
                    self.insert_active(pair);
                    events.push(Self::event_for(EventKind::Begin, &pair));
                }
            }
        }

        let ended: Vec<PairKey> = self
            .active
            .keys()
            .filter(|key| !reported.contains(key))
            .copied()
            .collect();
        for key in ended {
            if let Some(pair) = self.remove_active(key) {
                let mut event = Self::event_for(EventKind::End, &pair);
                event.timestamp = now;
                events.push(event);
            }
        }

        events
    }

    fn event_for(kind: EventKind, pair: &CollisionPair) -> CollisionEvent {
        let (link_a, link_b) = pair.key.links();
        CollisionEvent {
            kind,
            link_a,
            link_b,
            severity: pair.severity,
            distance: pair.distance,
            method: pair.method,
            timestamp: pair.timestamp,
        }
    }

    fn insert_active(&mut self, pair: CollisionPair) {
        let (a, b) = pair.key.links();
        self.by_link.entry(a).or_default().insert(pair.key);
        self.by_link.entry(b).or_default().insert(pair.key);
        self.active.insert(pair.key, pair);
    }

    fn remove_active(&mut self, key: PairKey) -> Option<CollisionPair> {
        let pair = self.active.remove(&key)?;
        let (a, b) = key.links();
        for link in [a, b] {
            if let Some(set) = self.by_link.get_mut(&link) {
                set.remove(&key);
                if set.is_empty() {
                    self.by_link.remove(&link);
                }
            }
        }
        Some(pair)
    }

    /// Drop all Active state without producing events.
    ///
    /// Used by disable(): callers must treat the detector as "state unknown"
    /// afterwards.
    pub fn clear_silent(&mut self) {
        self.active.clear();
        self.by_link.clear();
    }

    /// Iterate current Active pairs.
    pub fn active_pairs(&self) -> impl Iterator<Item = &CollisionPair> {
        self.active.values()
    }

    /// Whether a link is involved in any Active pair.
    pub fn is_link_colliding(&self, link: LinkId) -> bool {
        self.by_link.get(&link).is_some_and(|set| !set.is_empty())
    }

    /// Links the given link is currently paired with.
    pub fn partners_of(&self, link: LinkId) -> Vec<LinkId> {
        self.by_link
            .get(&link)
            .map(|set| set.iter().filter_map(|key| key.partner_of(link)).collect())
            .unwrap_or_default()
    }

    /// All links involved in at least one Active pair.
    pub fn colliding_links(&self) -> Vec<LinkId> {
        self.by_link.keys().copied().collect()
    }

    /// Aggregate counts for status panels.
    pub fn status(&self) -> DetectionStatus {
        let collision_count = self
            .active
            .values()
            .filter(|p| p.severity == Severity::Collision)
            .count();
        let warning_count = self
            .active
            .values()
            .filter(|p| p.severity == Severity::Warning)
            .count();
        DetectionStatus {
            has_collision: collision_count > 0,
            has_warning: warning_count > 0,
            collision_count,
            warning_count,
            total_pairs: self.active.len(),
        }
    }
}
