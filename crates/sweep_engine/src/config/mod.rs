//! Configuration system
//!
//! File-backed settings for the scene runtime and the movement resolver.
//! Any type implementing [`Config`] can be read from or written to TOML or
//! RON, chosen by file extension.

pub use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
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

    /// A value parsed fine but is out of range
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Which masks must accept a pair before it is tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerPolicy {
    /// Only the moving collider's mask is checked against the other's layer
    #[default]
    Initiator,
    /// Both masks must contain the other collider's layer
    Mutual,
}

/// How the contact normal is derived from two overlapping boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContactNormal {
    /// Unit vector from this box's center to the other box's center
    #[default]
    CenterToCenter,
    /// Axis of least overlap, signed toward the other box
    PenetrationAxis,
}

/// Which entities a mover is swept against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryScope {
    /// Entities sharing the mover's parent
    #[default]
    Siblings,
    /// Every attached entity outside the mover's own subtree
    Scene,
}

/// Movement resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Longest distance covered by one sweep step, in world units
    pub max_step_length: f32,

    /// Layer/mask filtering policy for mover-initiated tests
    pub layer_policy: LayerPolicy,

    /// Contact normal formula
    pub contact_normal: ContactNormal,

    /// Candidate set for each sweep step
    pub query_scope: QueryScope,

    /// Normal reported when two box centers coincide
    pub fallback_normal: [f32; 3],
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_step_length: 0.1,
            layer_policy: LayerPolicy::Initiator,
            contact_normal: ContactNormal::CenterToCenter,
            query_scope: QueryScope::Siblings,
            fallback_normal: [0.0, 1.0, 0.0],
        }
    }
}

impl PhysicsConfig {
    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_step_length.is_finite() || self.max_step_length <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_step_length",
                reason: format!("must be a positive finite length, got {}", self.max_step_length),
            });
        }

        let fallback = self.fallback_normal_vec();
        if !fallback.iter().all(|c| c.is_finite()) || fallback.norm() < 1e-6 {
            return Err(ConfigError::Invalid {
                field: "fallback_normal",
                reason: format!("must be a non-zero vector, got {:?}", self.fallback_normal),
            });
        }

        Ok(())
    }

    /// Fallback normal, normalized
    pub fn fallback_normal_vec(&self) -> Vec3 {
        let [x, y, z] = self.fallback_normal;
        Vec3::new(x, y, z)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vec3::y)
    }
}

impl Config for PhysicsConfig {}

/// Scene runtime settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Movement resolver settings
    pub physics: PhysicsConfig,

    /// Whether the scene starts paused
    pub start_paused: bool,
}

impl SceneConfig {
    /// Validate every nested section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()
    }
}

impl Config for SceneConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_physics_config_is_valid() {
        let config = PhysicsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_step_length, 0.1);
        assert_eq!(config.layer_policy, LayerPolicy::Initiator);
        assert_eq!(config.contact_normal, ContactNormal::CenterToCenter);
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let config = PhysicsConfig {
            max_step_length: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "max_step_length", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_fallback_normal() {
        let config = PhysicsConfig {
            fallback_normal: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_partial_document_uses_defaults() {
        let config: SceneConfig = toml::from_str(
            "start_paused = true\n[physics]\nmax_step_length = 0.25\nlayer_policy = \"Mutual\"\n",
        )
        .unwrap();

        assert!(config.start_paused);
        assert_eq!(config.physics.max_step_length, 0.25);
        assert_eq!(config.physics.layer_policy, LayerPolicy::Mutual);
        assert_eq!(config.physics.query_scope, QueryScope::Siblings);
    }

    #[test]
    fn test_ron_document() {
        let config: PhysicsConfig =
            ron::from_str("(max_step_length: 0.05, contact_normal: PenetrationAxis)").unwrap();

        assert_eq!(config.max_step_length, 0.05);
        assert_eq!(config.contact_normal, ContactNormal::PenetrationAxis);
    }

    #[test]
    fn test_unsupported_extension() {
        let config = SceneConfig::default();
        assert!(matches!(
            config.save_to_file("scene.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
