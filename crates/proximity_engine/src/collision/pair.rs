//! Pair keys, severity tiers, and per-pair records.

use std::time::Instant;

use crate::scene::LinkId;

/// Order-independent key for a pair of links.
///
/// The smaller id is always stored first, so `key(A, B) == key(B, A)` and a
/// physical pair can never be tracked twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    a: LinkId,
    b: LinkId,
}

impl PairKey {
    /// Create a normalized key.
    pub fn new(a: LinkId, b: LinkId) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    /// The two links, smaller id first.
    pub fn links(self) -> (LinkId, LinkId) {
        (self.a, self.b)
    }

    /// Whether the key involves the given link.
    pub fn involves(self, link: LinkId) -> bool {
        self.a == link || self.b == link
    }

    /// The other link of the pair, if `link` is one of them.
    pub fn partner_of(self, link: LinkId) -> Option<LinkId> {
        if self.a == link {
            Some(self.b)
        } else if self.b == link {
            Some(self.a)
        } else {
            None
        }
    }

    /// True for a self-pair (same link twice).
    pub fn is_self_pair(self) -> bool {
        self.a == self.b
    }
}

/// Proximity severity tier for a pair.
///
/// Ordered so that `severity >= Warning` selects the tiers that activate
/// tracking and feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Separation comfortably above the warning threshold
    Normal,
    /// Separation at or below the warning threshold
    Warning,
    /// Touching, or separation at or below the danger threshold
    Collision,
}

/// How a reading was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// World-space bound overlap/distance (coarse)
    Bounds,
    /// Triangle-accurate refinement over sampled mesh geometry
    Mesh,
    /// Contact reported by the persistent kinematic world
    KinematicWorld,
}

/// One backend observation of a candidate pair for the current tick.
#[derive(Debug, Clone, Copy)]
pub struct PairReading {
    /// Normalized pair key
    pub key: PairKey,
    /// Measured minimum separation in meters (0 when touching)
    pub distance: f32,
    /// Binary touching signal (contact manifold present)
    pub touching: bool,
    /// Producer of this reading
    pub method: DetectionMethod,
}

/// Tracked state of an Active pair.
#[derive(Debug, Clone, Copy)]
pub struct CollisionPair {
    /// Normalized pair key
    pub key: PairKey,
    /// Current severity tier
    pub severity: Severity,
    /// Last measured distance
    pub distance: f32,
    /// Detection method of the last reading
    pub method: DetectionMethod,
    /// When the last reading was applied
    pub timestamp: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::KinematicModel;

    fn two_ids() -> (LinkId, LinkId) {
        let mut model = KinematicModel::new();
        let a = model.add_link("a", None);
        let b = model.add_link("b", None);
        (a, b)
    }

    #[test]
    fn key_is_order_independent() {
        let (a, b) = two_ids();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        assert_eq!(PairKey::new(a, b).links(), (a, b));
    }

    #[test]
    fn partner_lookup() {
        let (a, b) = two_ids();
        let key = PairKey::new(b, a);
        assert_eq!(key.partner_of(a), Some(b));
        assert_eq!(key.partner_of(b), Some(a));
        assert!(key.involves(a) && key.involves(b));
    }

    #[test]
    fn severity_ordering_feeds_activation_rule() {
        assert!(Severity::Warning >= Severity::Warning);
        assert!(Severity::Collision > Severity::Warning);
        assert!(Severity::Normal < Severity::Warning);
    }
}
