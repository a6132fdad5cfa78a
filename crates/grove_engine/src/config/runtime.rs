//! Runtime configuration records
//!
//! Every section falls back to its defaults, so a config file only needs to
//! name the values it changes.

use serde::{Deserialize, Serialize};

use super::{Config, ConfigError};
use crate::foundation::math::{Vec2, Vec3};

/// Top-level configuration for a scene runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Spatial hash grid layout
    pub grid: GridConfig,
    /// Animation blending
    pub animation: AnimationConfig,
    /// Character locomotion tuning
    pub movement: MovementConfig,
    /// Proximity pickup behaviour
    pub pickup: PickupConfig,
    /// Frame stepping
    pub frame: FrameConfig,
}

impl Config for RuntimeConfig {}

impl RuntimeConfig {
    /// Check every section for out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        self.animation.validate()?;
        self.pickup.validate()?;
        self.frame.validate()
    }
}

/// Bounds and resolution of the ground-plane grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Lower corner (x, z)
    pub min: [f32; 2],
    /// Upper corner (x, z)
    pub max: [f32; 2],
    /// Number of cells along x and z
    pub dimensions: [u32; 2],
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min: [-1000.0, -1000.0],
            max: [1000.0, 1000.0],
            dimensions: [100, 100],
        }
    }
}

impl GridConfig {
    /// Lower corner as a vector
    pub fn min_corner(&self) -> Vec2 {
        Vec2::new(self.min[0], self.min[1])
    }

    /// Upper corner as a vector
    pub fn max_corner(&self) -> Vec2 {
        Vec2::new(self.max[0], self.max[1])
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max[0] > self.min[0] && self.max[1] > self.min[1]) {
            return Err(ConfigError::Invalid(format!(
                "grid bounds {:?}..{:?} are empty or inverted",
                self.min, self.max
            )));
        }
        if self.dimensions.contains(&0) {
            return Err(ConfigError::Invalid(format!(
                "grid dimensions {:?} must be at least 1x1",
                self.dimensions
            )));
        }
        Ok(())
    }
}

/// Cross-fade timing for the character animation machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Blend used when entering idle, walk or run
    pub locomotion_blend_seconds: f32,
    /// Blend used when entering the one-shot dance
    pub dance_blend_seconds: f32,
    /// Keep walk and run in step when switching between them
    pub sync_gait_phase: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            locomotion_blend_seconds: 0.5,
            dance_blend_seconds: 0.2,
            sync_gait_phase: true,
        }
    }
}

impl AnimationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.locomotion_blend_seconds <= 0.0 || self.dance_blend_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "animation blend durations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Character locomotion tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Per-axis acceleration; `y` drives the turn rate
    pub acceleration: [f32; 3],
    /// Per-axis velocity decay factors (negative)
    pub deceleration: [f32; 3],
    /// Acceleration multiplier while the run modifier is held
    pub run_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            acceleration: [1.0, 0.25, 50.0],
            deceleration: [-0.0005, -0.0001, -5.0],
            run_multiplier: 2.0,
        }
    }
}

impl MovementConfig {
    /// Acceleration as a vector
    pub fn acceleration(&self) -> Vec3 {
        Vec3::from(self.acceleration)
    }

    /// Deceleration as a vector
    pub fn deceleration(&self) -> Vec3 {
        Vec3::from(self.deceleration)
    }
}

/// Proximity pickup behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupConfig {
    /// Normalized clip time at which a pickup fires
    pub timing: f32,
    /// Neighbouring cells searched in each direction. Physical reach is
    /// this count times the grid cell size, so it changes with resolution.
    pub search_cells: u32,
    /// Clips allowed to trigger; empty means any
    pub actions: Vec<String>,
}

impl Default for PickupConfig {
    fn default() -> Self {
        Self {
            timing: 0.7,
            search_cells: 1,
            actions: Vec::new(),
        }
    }
}

impl PickupConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.timing) {
            return Err(ConfigError::Invalid(format!(
                "pickup timing {} must lie in [0, 1)",
                self.timing
            )));
        }
        Ok(())
    }
}

/// Frame stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Largest simulation step handed to the entity manager
    pub max_step_seconds: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_step_seconds: 1.0 / 30.0,
        }
    }
}

impl FrameConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_step_seconds <= 0.0 {
            return Err(ConfigError::Invalid(
                "frame max_step_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [grid]
            dimensions = [10, 20]

            [pickup]
            timing = 0.5
            actions = ["dance"]
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.grid.dimensions, [10, 20]);
        assert_eq!(config.grid.min, [-1000.0, -1000.0]);
        assert_eq!(config.pickup.timing, 0.5);
        assert_eq!(config.pickup.actions, vec!["dance".to_string()]);
        assert_eq!(config.animation, AnimationConfig::default());
    }

    #[test]
    fn test_ron_round_trip() {
        let mut config = RuntimeConfig::default();
        config.frame.max_step_seconds = 0.05;

        let text = ron::ser::to_string(&config).expect("serialize");
        let parsed: RuntimeConfig = ron::from_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = RuntimeConfig::default();
        config.grid.max = [-2000.0, 1000.0];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        let mut config = RuntimeConfig::default();
        config.grid.dimensions = [0, 10];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_timing_out_of_range() {
        let mut config = RuntimeConfig::default();
        config.pickup.timing = 1.0;
        assert!(config.validate().is_err());
    }
}
