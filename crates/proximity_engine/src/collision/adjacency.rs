//! Adjacency exclusion graph
//!
//! Structurally connected links always overlap or touch by construction, so
//! they are permanently exempt from detection. The set is built once from
//! the kinematic tree plus configured ignore pairs and never mutated at
//! runtime.

use std::collections::HashSet;

use crate::collision::pair::PairKey;
use crate::scene::{KinematicModel, LinkId};

/// O(1) symmetric exclusion predicate over link pairs.
#[derive(Debug, Default)]
pub struct AdjacencyGraph {
    excluded: HashSet<PairKey>,
}

impl AdjacencyGraph {
    /// Build from parent/child topology plus explicit extra exclusions.
    ///
    /// Extra pairs are given by name; unknown names are logged and ignored
    /// so a stale config cannot fail model load.
    pub fn build(model: &KinematicModel, extra_pairs: &[(String, String)]) -> Self {
        let mut excluded = HashSet::new();

        for (child, parent) in model.topology_pairs() {
            excluded.insert(PairKey::new(child, parent));
        }

        for (name_a, name_b) in extra_pairs {
            match (model.resolve(name_a), model.resolve(name_b)) {
                (Some(a), Some(b)) => {
                    excluded.insert(PairKey::new(a, b));
                }
                _ => {
                    log::warn!("adjacency: unknown link in exclusion pair ({name_a}, {name_b})");
                }
            }
        }

        log::info!("adjacency: {} excluded pairs", excluded.len());
        Self { excluded }
    }

    /// Whether this pair is permanently exempt from detection.
    ///
    /// Self-pairs are always excluded, independent of configuration or
    /// geometric overlap.
    pub fn is_excluded(&self, a: LinkId, b: LinkId) -> bool {
        a == b || self.excluded.contains(&PairKey::new(a, b))
    }

    /// Number of excluded pairs (self-pairs not counted).
    pub fn len(&self) -> usize {
        self.excluded.len()
    }

    /// True when only self-pairs are excluded.
    pub fn is_empty(&self) -> bool {
        self.excluded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm_chain() -> (KinematicModel, Vec<LinkId>) {
        let mut model = KinematicModel::new();
        let torso = model.add_link("TORSO", None);
        let shoulder = model.add_link("SHOULDER_L", Some(torso));
        let upper = model.add_link("UPPERARM_L", Some(shoulder));
        let fore = model.add_link("FOREARM_L", Some(upper));
        (model, vec![torso, shoulder, upper, fore])
    }

    #[test]
    fn topology_pairs_are_excluded_symmetrically() {
        let (model, ids) = arm_chain();
        let graph = AdjacencyGraph::build(&model, &[]);
        assert!(graph.is_excluded(ids[0], ids[1]));
        assert!(graph.is_excluded(ids[1], ids[0]));
        // Grandparent relation is a real pair, not adjacent.
        assert!(!graph.is_excluded(ids[0], ids[2]));
    }

    #[test]
    fn self_pairs_always_excluded() {
        let (model, ids) = arm_chain();
        let graph = AdjacencyGraph::build(&model, &[]);
        for &id in &ids {
            assert!(graph.is_excluded(id, id));
        }
    }

    #[test]
    fn configured_pairs_and_unknown_names() {
        let (model, ids) = arm_chain();
        let graph = AdjacencyGraph::build(
            &model,
            &[
                ("TORSO".into(), "FOREARM_L".into()),
                ("TORSO".into(), "NO_SUCH_LINK".into()),
            ],
        );
        assert!(graph.is_excluded(ids[0], ids[3]));
        // Unknown name is ignored; chain exclusions still present.
        assert_eq!(graph.len(), 4);
    }
}
