use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_feet() -> Vec<String> {
    ["LF", "RF", "LH", "RH"].iter().map(|&s| s.into()).collect()
}
const fn default_weight() -> f64 {
    1.0
}
const fn default_friction_coefficient() -> f64 {
    0.7
}
const fn default_friction_regularization() -> f64 {
    25.0
}

/// Largest foot count a [`crate::types::ContactMode`] bit pattern can hold.
pub const MAX_FEET: usize = 31;

// ---------------------------------------------------------------------------
// PositionPolicy
// ---------------------------------------------------------------------------

/// How the end-effector position constraint treats the vertical direction.
///
/// One switch for the whole engine; never mixed across feet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPolicy {
    /// Position rows only in stance; the swing height is enforced through the
    /// always-on velocity equality.
    HardEquality,
    /// Position rows always on: terrain rows in stance, a band around the
    /// swing reference in swing.
    #[default]
    InequalityBand,
}

// ---------------------------------------------------------------------------
// ConstraintOptions
// ---------------------------------------------------------------------------

/// Options for the switched constraint engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintOptions {
    /// Ordered foot names. Index `i` here is contact point `i` everywhere else.
    #[serde(default = "default_feet")]
    pub feet: Vec<String>,

    /// Vertical-direction policy for the end-effector position constraint.
    #[serde(default)]
    pub position_policy: PositionPolicy,

    /// Scale `s` applied to every position-constraint row.
    #[serde(default = "default_weight")]
    pub z_direction_position_weight: f64,

    /// Coupling weight `w` of the swing band `w·z_ref <= p_z <= z_ref / w`.
    #[serde(default = "default_weight")]
    pub z_direction_velocity_weight: f64,

    /// Add the vertical band rows `±s·p_z >= 0` to stance feet.
    #[serde(default)]
    pub terrain_inequality: bool,

    /// Coulomb friction coefficient of the friction cone.
    #[serde(default = "default_friction_coefficient")]
    pub friction_coefficient: f64,

    /// Regularization under the square root of the friction cone (N^2).
    #[serde(default = "default_friction_regularization")]
    pub friction_regularization: f64,

    /// Adhesion force added to the normal force (N).
    #[serde(default)]
    pub gripper_force: f64,
}

impl Default for ConstraintOptions {
    fn default() -> Self {
        Self {
            feet: default_feet(),
            position_policy: PositionPolicy::default(),
            z_direction_position_weight: default_weight(),
            z_direction_velocity_weight: default_weight(),
            terrain_inequality: false,
            friction_coefficient: default_friction_coefficient(),
            friction_regularization: default_friction_regularization(),
            gripper_force: 0.0,
        }
    }
}

impl ConstraintOptions {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feet.is_empty() || self.feet.len() > MAX_FEET {
            return Err(invalid(
                "feet",
                format!("expected 1..={MAX_FEET} feet, got {}", self.feet.len()),
            ));
        }
        let mut seen = HashSet::new();
        for foot in &self.feet {
            if !seen.insert(foot.as_str()) {
                return Err(ConfigError::DuplicateFoot(foot.clone()));
            }
        }
        // The position weight may be zero (terrain rows switched off), never negative.
        if self.z_direction_position_weight.is_nan() || self.z_direction_position_weight < 0.0 {
            return Err(invalid(
                "z_direction_position_weight",
                format!("must be >= 0, got {}", self.z_direction_position_weight),
            ));
        }
        if self.z_direction_velocity_weight.is_nan() || self.z_direction_velocity_weight <= 0.0 {
            return Err(invalid(
                "z_direction_velocity_weight",
                format!("must be > 0, got {}", self.z_direction_velocity_weight),
            ));
        }
        if self.friction_coefficient.is_nan() || self.friction_coefficient <= 0.0 {
            return Err(invalid(
                "friction_coefficient",
                format!("must be > 0, got {}", self.friction_coefficient),
            ));
        }
        if self.friction_regularization.is_nan() || self.friction_regularization <= 0.0 {
            return Err(invalid(
                "friction_regularization",
                format!("must be > 0, got {}", self.friction_regularization),
            ));
        }
        if self.gripper_force.is_nan() || self.gripper_force < 0.0 {
            return Err(invalid(
                "gripper_force",
                format!("must be >= 0, got {}", self.gripper_force),
            ));
        }
        Ok(())
    }

    /// Number of contact points.
    pub fn num_feet(&self) -> usize {
        self.feet.len()
    }

    /// Parse and validate from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

fn invalid(field: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message,
    }
}
