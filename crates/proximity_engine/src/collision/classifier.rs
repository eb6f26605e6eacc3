//! Severity classification
//!
//! Maps a pair reading (measured separation or binary touching signal) to a
//! severity tier through the pair category's threshold profile. Distances
//! exactly at a threshold classify to the more severe side.

use std::collections::HashMap;

use crate::collision::pair::{PairKey, PairReading, Severity};
use crate::config::{DetectionConfig, ThresholdSettings};
use crate::scene::{KinematicModel, LinkId};

/// Smallest usable threshold; non-positive configured values clamp here so
/// the engine stays operable with degraded precision.
pub const MIN_THRESHOLD: f32 = 1e-4;

/// Validated warning/danger profile for one pair category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdProfile {
    warning: f32,
    danger: f32,
}

impl ThresholdProfile {
    /// Build from raw settings, clamping non-positive values and making sure
    /// the warning ring is never inside the danger ring.
    pub fn from_settings(settings: ThresholdSettings) -> Self {
        let danger = settings.danger.max(MIN_THRESHOLD);
        let warning = settings.warning.max(danger);
        if settings.danger <= 0.0 || settings.warning < settings.danger {
            log::warn!(
                "thresholds clamped: warning {} -> {warning}, danger {} -> {danger}",
                settings.warning,
                settings.danger
            );
        }
        Self { warning, danger }
    }

    /// Warning distance in meters.
    pub fn warning(&self) -> f32 {
        self.warning
    }

    /// Danger distance in meters.
    pub fn danger(&self) -> f32 {
        self.danger
    }

    /// Classify a measured separation. Thresholds are inclusive on the
    /// severe side: exactly `warning` is Warning, exactly `danger` is
    /// Collision.
    pub fn classify(&self, distance: f32) -> Severity {
        if distance <= self.danger {
            Severity::Collision
        } else if distance <= self.warning {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self::from_settings(ThresholdSettings::default())
    }
}

/// Per-pair severity classifier with category resolution.
#[derive(Debug)]
pub struct SeverityClassifier {
    default_profile: ThresholdProfile,
    by_category: HashMap<String, ThresholdProfile>,
    pair_category: HashMap<PairKey, String>,
}

impl SeverityClassifier {
    /// Resolve config link groups and category rules against the model.
    ///
    /// Unknown link or group names degrade to warnings; affected pairs fall
    /// back to the default profile.
    pub fn from_config(config: &DetectionConfig, model: &KinematicModel) -> Self {
        let default_profile = ThresholdProfile::from_settings(config.default_threshold);

        let by_category: HashMap<String, ThresholdProfile> = config
            .categories
            .iter()
            .map(|(name, settings)| (name.clone(), ThresholdProfile::from_settings(*settings)))
            .collect();

        let resolve_group = |group: &str| -> Vec<LinkId> {
            let Some(names) = config.link_groups.get(group) else {
                log::warn!("classifier: unknown link group '{group}' in pair category rule");
                return Vec::new();
            };
            names
                .iter()
                .filter_map(|name| {
                    let id = model.resolve(name);
                    if id.is_none() {
                        log::warn!("classifier: unknown link '{name}' in group '{group}'");
                    }
                    id
                })
                .collect()
        };

        let mut pair_category = HashMap::new();
        for rule in &config.pair_categories {
            if !by_category.contains_key(&rule.category) {
                log::warn!(
                    "classifier: rule references undefined category '{}'",
                    rule.category
                );
            }
            let group_a = resolve_group(&rule.group_a);
            let group_b = resolve_group(&rule.group_b);
            for &a in &group_a {
                for &b in &group_b {
                    if a == b {
                        continue;
                    }
                    pair_category.insert(PairKey::new(a, b), rule.category.clone());
                }
            }
        }

        Self {
            default_profile,
            by_category,
            pair_category,
        }
    }

    /// Threshold profile applying to a pair.
    pub fn profile_for(&self, key: PairKey) -> &ThresholdProfile {
        self.pair_category
            .get(&key)
            .and_then(|category| self.by_category.get(category))
            .unwrap_or(&self.default_profile)
    }

    /// Category name applying to a pair, if any rule matched.
    pub fn category_for(&self, key: PairKey) -> Option<&str> {
        self.pair_category.get(&key).map(String::as_str)
    }

    /// Classify a backend reading. A contact manifold always classifies as
    /// Collision regardless of the reported distance.
    pub fn classify(&self, reading: &PairReading) -> Severity {
        if reading.touching {
            Severity::Collision
        } else {
            self.profile_for(reading.key).classify(reading.distance)
        }
    }

    /// Largest warning distance across all profiles; the bounds backend uses
    /// this as its candidate-forwarding radius.
    pub fn max_warning_distance(&self) -> f32 {
        self.by_category
            .values()
            .map(ThresholdProfile::warning)
            .fold(self.default_profile.warning(), f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::pair::DetectionMethod;
    use crate::config::PairCategoryRule;

    fn reading(key: PairKey, distance: f32, touching: bool) -> PairReading {
        PairReading {
            key,
            distance,
            touching,
            method: DetectionMethod::Bounds,
        }
    }

    #[test]
    fn boundary_distances_classify_to_severe_side() {
        let profile = ThresholdProfile::from_settings(ThresholdSettings {
            warning: 0.05,
            danger: 0.01,
        });
        // Repeat to make sure classification is stable across evaluations.
        for _ in 0..3 {
            assert_eq!(profile.classify(0.05), Severity::Warning);
            assert_eq!(profile.classify(0.01), Severity::Collision);
            assert_eq!(profile.classify(0.050_001), Severity::Normal);
            assert_eq!(profile.classify(0.010_001), Severity::Warning);
            assert_eq!(profile.classify(0.0), Severity::Collision);
        }
    }

    #[test]
    fn non_positive_thresholds_clamp_to_epsilon() {
        let profile = ThresholdProfile::from_settings(ThresholdSettings {
            warning: -1.0,
            danger: 0.0,
        });
        assert_eq!(profile.danger(), MIN_THRESHOLD);
        assert!(profile.warning() >= profile.danger());
    }

    #[test]
    fn touching_signal_wins_over_distance() {
        let mut model = KinematicModel::new();
        let a = model.add_link("a", None);
        let b = model.add_link("b", None);
        let classifier = SeverityClassifier::from_config(&DetectionConfig::default(), &model);
        let key = PairKey::new(a, b);
        assert_eq!(classifier.classify(&reading(key, 9.0, true)), Severity::Collision);
        assert_eq!(classifier.classify(&reading(key, 9.0, false)), Severity::Normal);
    }

    #[test]
    fn category_rules_resolve_to_profiles() {
        let mut model = KinematicModel::new();
        let hand = model.add_link("HAND_L", None);
        let torso = model.add_link("TORSO", None);
        let head = model.add_link("HEAD", None);

        let mut config = DetectionConfig::default();
        config.categories.insert(
            "hands_vs_torso".into(),
            ThresholdSettings {
                warning: 0.2,
                danger: 0.1,
            },
        );
        config.link_groups.insert("hands".into(), vec!["HAND_L".into()]);
        config.link_groups.insert("torso".into(), vec!["TORSO".into()]);
        config.pair_categories.push(PairCategoryRule {
            group_a: "hands".into(),
            group_b: "torso".into(),
            category: "hands_vs_torso".into(),
        });

        let classifier = SeverityClassifier::from_config(&config, &model);
        let matched = PairKey::new(hand, torso);
        let unmatched = PairKey::new(hand, head);

        assert_eq!(classifier.category_for(matched), Some("hands_vs_torso"));
        assert_eq!(classifier.profile_for(matched).warning(), 0.2);
        assert_eq!(classifier.category_for(unmatched), None);
        assert_eq!(classifier.profile_for(unmatched).warning(), 0.05);
        assert_eq!(classifier.max_warning_distance(), 0.2);
    }
}
