//! Configuration system
//!
//! Detection behavior is driven by one serializable record, loadable from
//! TOML or RON. Out-of-range values are clamped at use sites rather than
//! rejected, so a sloppy config degrades precision instead of failing
//! startup.

use std::collections::HashMap;

pub use serde::{Deserialize, Serialize};

/// Configuration trait with file loading for supported formats.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a `.toml` or `.ron` file.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a `.toml` or `.ron` file.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };
        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Warning/danger distance pair for one pair category, in meters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSettings {
    /// Separation at or below this distance raises a warning
    pub warning: f32,
    /// Separation at or below this distance counts as collision
    pub danger: f32,
}

impl Default for ThresholdSettings {
    fn default() -> Self {
        // 5 cm warning ring around a 1 cm contact threshold.
        Self {
            warning: 0.05,
            danger: 0.01,
        }
    }
}

/// A rule assigning a category to all pairs between two named link groups.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairCategoryRule {
    /// First link group name
    pub group_a: String,
    /// Second link group name (may equal `group_a` for intra-group pairs)
    pub group_b: String,
    /// Category whose threshold profile applies
    pub category: String,
}

/// Appearance of the collision highlight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualizationSettings {
    /// RGB highlight color, linear space
    pub collision_color: [f32; 3],
    /// Emissive strength of the highlight
    pub emissive_intensity: f32,
    /// Highlight opacity
    pub opacity: f32,
    /// Whether the highlight blends over the part
    pub transparent: bool,
    /// Whether the collision highlight may replace an override owned by
    /// another subsystem (e.g. joint-limit coloring)
    pub override_priority: bool,
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            collision_color: [0.2, 0.4, 1.0],
            emissive_intensity: 0.6,
            opacity: 0.9,
            transparent: true,
            override_priority: false,
        }
    }
}

/// Full configuration record for one detector instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectionConfig {
    /// Whether detection starts enabled
    pub enabled: bool,
    /// Minimum milliseconds between detection passes
    pub detection_interval_ms: u64,
    /// Threshold profile used when no category rule matches
    pub default_threshold: ThresholdSettings,
    /// Per-category threshold overrides
    pub categories: HashMap<String, ThresholdSettings>,
    /// Named groups of link names, referenced by pair category rules
    pub link_groups: HashMap<String, Vec<String>>,
    /// Category assignments between link groups
    pub pair_categories: Vec<PairCategoryRule>,
    /// Extra "structurally connected, never flag" pairs beyond the tree
    pub adjacency_exclusions: Vec<(String, String)>,
    /// Links excluded from detection entirely (no proxy built)
    pub skip_links: Vec<String>,
    /// Kinematic-backend shape shrink factor, keeps adjacent shells from
    /// grazing each other
    pub shape_margin: f32,
    /// Floor for kinematic-backend half extents, in meters
    pub min_half_extent: f32,
    /// Highlight appearance
    pub visualization: VisualizationSettings,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detection_interval_ms: 100,
            default_threshold: ThresholdSettings::default(),
            categories: HashMap::new(),
            link_groups: HashMap::new(),
            pair_categories: Vec::new(),
            adjacency_exclusions: Vec::new(),
            skip_links: vec!["base_link".into(), "world".into()],
            shape_margin: 0.95,
            min_half_extent: 0.005,
            visualization: VisualizationSettings::default(),
        }
    }
}

impl Config for DetectionConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DetectionConfig::default();
        assert!(config.enabled);
        assert_eq!(config.detection_interval_ms, 100);
        assert_eq!(config.default_threshold.warning, 0.05);
        assert_eq!(config.default_threshold.danger, 0.01);
        assert_eq!(config.shape_margin, 0.95);
        assert!(config.skip_links.contains(&"world".to_string()));
    }

    #[test]
    fn parses_partial_toml() {
        let toml = r#"
            detection_interval_ms = 50

            [default_threshold]
            warning = 0.08
            danger = 0.02

            [categories.arm_vs_torso]
            warning = 0.1
            danger = 0.03

            [[pair_categories]]
            group_a = "left_arm"
            group_b = "torso"
            category = "arm_vs_torso"
        "#;
        let config: DetectionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.detection_interval_ms, 50);
        assert_eq!(config.default_threshold.warning, 0.08);
        assert_eq!(config.categories["arm_vs_torso"].danger, 0.03);
        assert_eq!(config.pair_categories[0].group_b, "torso");
        // Unspecified fields fall back to defaults.
        assert!(config.enabled);
        assert_eq!(config.shape_margin, 0.95);
    }

    #[test]
    fn roundtrips_through_ron() {
        let mut config = DetectionConfig::default();
        config
            .adjacency_exclusions
            .push(("HAND_L".into(), "TCP_L".into()));
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let back: DetectionConfig = ron::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
