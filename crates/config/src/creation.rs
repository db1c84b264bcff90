use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, check_non_negative};

/// Default emitted particles per second at full pressure
pub const DEFAULT_FLOW_RATE: f32 = 50.0;

/// Default particle size in world units
pub const DEFAULT_PARTICLE_SIZE: f32 = 0.03;

/// Default lifetime in seconds
pub const DEFAULT_MAX_AGE: f32 = 2.0;

/// Upper bound for the size-over-age factor
pub const MAX_SIZE_AGE_FACTOR: f32 = 2.0;

/// How an emitter creates particles.
///
/// Every `*_random` value is a symmetric spread: a particle samples
/// uniformly from `value - random ..= value + random`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationSettings {
    /// Particles per second at pressure 1
    pub flow_rate: f32,
    pub particle_size: f32,
    pub particle_size_random: f32,
    /// Size multiplier reached at end of life (0..=2)
    pub particle_size_age_factor: f32,
    pub mass: f32,
    pub mass_random: f32,
    /// Lifetime in seconds
    pub max_age: f32,
    pub max_age_random: f32,
    /// HSV spread applied to the brush color
    pub color_random: [f32; 3],
    /// Speed along the emission ray, minus its normal component
    pub initial_speed: f32,
    /// Per-axis jitter as a fraction of `initial_speed` (0..=1)
    pub initial_speed_random: f32,
}

impl Default for CreationSettings {
    fn default() -> Self {
        Self {
            flow_rate: DEFAULT_FLOW_RATE,
            particle_size: DEFAULT_PARTICLE_SIZE,
            particle_size_random: 0.01,
            particle_size_age_factor: 1.0,
            mass: 0.4,
            mass_random: 0.1,
            max_age: DEFAULT_MAX_AGE,
            max_age_random: 1.0,
            color_random: [0.3, 0.25, 0.2],
            initial_speed: 0.0,
            initial_speed_random: 0.0,
        }
    }
}

impl CreationSettings {
    /// Settings used by the rain brush: dense, light, short-lived drops.
    pub fn rain() -> Self {
        Self {
            flow_rate: 2500.0,
            mass: 0.3,
            max_age: 0.5,
            max_age_random: 0.2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_non_negative("flow_rate", self.flow_rate)?;
        check_non_negative("particle_size", self.particle_size)?;
        check_non_negative("particle_size_random", self.particle_size_random)?;
        check_non_negative("particle_size_age_factor", self.particle_size_age_factor)?;
        if self.particle_size_age_factor > MAX_SIZE_AGE_FACTOR {
            return Err(ConfigError::invalid(
                "particle_size_age_factor",
                format!("must be <= {MAX_SIZE_AGE_FACTOR}"),
            ));
        }
        check_non_negative("mass", self.mass)?;
        check_non_negative("mass_random", self.mass_random)?;
        check_non_negative("max_age", self.max_age)?;
        check_non_negative("max_age_random", self.max_age_random)?;
        for value in self.color_random {
            check_non_negative("color_random", value)?;
        }
        check_non_negative("initial_speed", self.initial_speed)?;
        check_non_negative("initial_speed_random", self.initial_speed_random)?;
        if self.initial_speed_random > 1.0 {
            return Err(ConfigError::invalid("initial_speed_random", "must be <= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_creation() {
        let settings = CreationSettings::default();
        assert_eq!(settings.flow_rate, DEFAULT_FLOW_RATE);
        assert_eq!(settings.particle_size, DEFAULT_PARTICLE_SIZE);
        assert_eq!(settings.max_age, DEFAULT_MAX_AGE);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_rain_overrides() {
        let rain = CreationSettings::rain();
        assert_eq!(rain.flow_rate, 2500.0);
        assert_eq!(rain.mass, 0.3);
        assert_eq!(rain.particle_size, DEFAULT_PARTICLE_SIZE);
        assert!(rain.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let settings = CreationSettings {
            mass: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Invalid { ref field, .. }) if field == "mass"
        ));

        let settings = CreationSettings {
            particle_size_age_factor: 3.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = CreationSettings {
            flow_rate: f32::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: CreationSettings = serde_json::from_str(r#"{"flow_rate": 10}"#).unwrap();
        assert_eq!(settings.flow_rate, 10.0);
        assert_eq!(settings.mass, 0.4);
    }
}
