use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::brush::BrushConfig;
use crate::error::{ConfigError, check_non_negative};

/// Default integration sub-steps per tick
pub const DEFAULT_SIM_SUB_STEPS: u32 = 3;

/// Default upper bound for a single tick's timestep, in seconds
pub const DEFAULT_MAX_TIME_STEP: f32 = 0.04;

/// Default neighbor hash table size. Must not be a power of two: the cell
/// hash multiplies by constants with many trailing zero bits.
pub const DEFAULT_NEIGHBOR_TABLE_SIZE: u32 = 262_139;

/// Seed used when none is configured, so runs stay reproducible
pub const DEFAULT_SEED: u64 = 0x5EED_DA0B;

/// Integration settings shared by every brush.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Integration steps per tick (at least 1)
    pub sim_sub_steps: u32,
    /// Longest timestep a single tick may integrate
    pub max_time_step: f32,
    /// Bucket count of the neighbor hash table
    pub neighbor_table_size: u32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            sim_sub_steps: DEFAULT_SIM_SUB_STEPS,
            max_time_step: DEFAULT_MAX_TIME_STEP,
            neighbor_table_size: DEFAULT_NEIGHBOR_TABLE_SIZE,
        }
    }
}

impl PhysicsSettings {
    /// Sub-step count, never below one.
    pub fn sub_steps(&self) -> u32 {
        self.sim_sub_steps.max(1)
    }
}

/// Everything the simulation needs at stroke start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub physics: PhysicsSettings,
    /// Discard all particles as soon as the stroke ends
    pub stop_on_release: bool,
    /// RNG seed; [`DEFAULT_SEED`] when absent
    pub seed: Option<u64>,
    pub brush: BrushConfig,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            physics: PhysicsSettings::default(),
            stop_on_release: false,
            seed: None,
            brush: BrushConfig::default(),
        }
    }
}

impl SimulationSettings {
    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("max_time_step", self.physics.max_time_step)?;
        if self.physics.neighbor_table_size == 0 {
            return Err(ConfigError::invalid("neighbor_table_size", "must be > 0"));
        }
        self.brush.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = SimulationSettings::default();
        assert_eq!(settings.physics.sim_sub_steps, DEFAULT_SIM_SUB_STEPS);
        assert_eq!(settings.physics.max_time_step, DEFAULT_MAX_TIME_STEP);
        assert!(!settings.stop_on_release);
        assert_eq!(settings.seed(), DEFAULT_SEED);
        assert_eq!(settings.brush.name, "Paint");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_sub_steps_never_zero() {
        let physics = PhysicsSettings {
            sim_sub_steps: 0,
            ..Default::default()
        };
        assert_eq!(physics.sub_steps(), 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = SimulationSettings {
            stop_on_release: true,
            seed: Some(7),
            brush: BrushConfig::rain(),
            ..Default::default()
        };
        let json = settings.to_json_string().unwrap();
        let back = SimulationSettings::from_json_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_partial_json() {
        let settings =
            SimulationSettings::from_json_str(r#"{"physics": {"sim_sub_steps": 5}}"#).unwrap();
        assert_eq!(settings.physics.sim_sub_steps, 5);
        assert_eq!(settings.physics.max_time_step, DEFAULT_MAX_TIME_STEP);
        assert_eq!(settings.brush, BrushConfig::paint());
    }

    #[test]
    fn test_invalid_json_reports_error() {
        assert!(matches!(
            SimulationSettings::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            SimulationSettings::from_json_str(r#"{"physics": {"neighbor_table_size": 0}}"#),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SimulationSettings::from_json_file("/nonexistent/daub/settings.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
