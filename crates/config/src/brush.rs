//! Brush configuration: the ordered list of steps a stroke runs.
//!
//! Hosts may author this list however they like (presets, node editors);
//! the simulation only consumes the resolved, flat list.

use serde::{Deserialize, Serialize};

use crate::creation::CreationSettings;
use crate::error::{ConfigError, check_non_negative};

/// Default gravity, world Z up
pub const DEFAULT_GRAVITY: [f32; 3] = [0.0, 0.0, -9.81];

pub const DEFAULT_DRAG_COEFFICIENT: f32 = 10.0;
pub const DEFAULT_FRICTION_COEFFICIENT: f32 = 0.01;
pub const DEFAULT_REPULSION_FACTOR: f32 = 0.2;
pub const DEFAULT_WIND_STRENGTH: f32 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravitySettings {
    pub gravity: [f32; 3],
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    pub drag_coefficient: f32,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            drag_coefficient: DEFAULT_DRAG_COEFFICIENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionSettings {
    pub friction_coefficient: f32,
}

impl Default for FrictionSettings {
    fn default() -> Self {
        Self {
            friction_coefficient: DEFAULT_FRICTION_COEFFICIENT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepelSettings {
    pub repulsion_factor: f32,
}

impl Default for RepelSettings {
    fn default() -> Self {
        Self {
            repulsion_factor: DEFAULT_REPULSION_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindSettings {
    pub strength: f32,
}

impl Default for WindSettings {
    fn default() -> Self {
        Self {
            strength: DEFAULT_WIND_STRENGTH,
        }
    }
}

/// One simulation step and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepKind {
    Gravity(GravitySettings),
    Drag(DragSettings),
    Friction(FrictionSettings),
    Repel(RepelSettings),
    Wind(WindSettings),
    /// Emits along rays inside the brush disk
    BrushEmitter(CreationSettings),
    /// Emits straight down over the whole surface footprint
    RainEmitter(CreationSettings),
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::Gravity(_) => "gravity",
            StepKind::Drag(_) => "drag",
            StepKind::Friction(_) => "friction",
            StepKind::Repel(_) => "repel",
            StepKind::Wind(_) => "wind",
            StepKind::BrushEmitter(_) => "brush_emitter",
            StepKind::RainEmitter(_) => "rain_emitter",
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            StepKind::Gravity(s) => {
                if s.gravity.iter().any(|g| !g.is_finite()) {
                    return Err(ConfigError::invalid("gravity", "must be finite"));
                }
                Ok(())
            }
            StepKind::Drag(s) => check_non_negative("drag_coefficient", s.drag_coefficient),
            StepKind::Friction(s) => {
                check_non_negative("friction_coefficient", s.friction_coefficient)
            }
            StepKind::Repel(s) => check_non_negative("repulsion_factor", s.repulsion_factor),
            StepKind::Wind(s) => {
                if !s.strength.is_finite() {
                    return Err(ConfigError::invalid("strength", "must be finite"));
                }
                Ok(())
            }
            StepKind::BrushEmitter(c) | StepKind::RainEmitter(c) => c.validate(),
        }
    }
}

/// A step entry in a brush. Disabled entries stay in the list so hosts can
/// toggle them without losing their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: StepKind,
}

fn default_enabled() -> bool {
    true
}

impl StepConfig {
    pub fn new(kind: StepKind) -> Self {
        Self {
            enabled: true,
            kind,
        }
    }

    pub fn disabled(kind: StepKind) -> Self {
        Self {
            enabled: false,
            kind,
        }
    }
}

/// Named, ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    pub name: String,
    pub steps: Vec<StepConfig>,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self::paint()
    }
}

impl BrushConfig {
    /// Emit under the cursor, let paint run down and spread.
    pub fn paint() -> Self {
        Self {
            name: "Paint".to_string(),
            steps: vec![
                StepConfig::new(StepKind::BrushEmitter(CreationSettings::default())),
                StepConfig::new(StepKind::Gravity(GravitySettings::default())),
                StepConfig::new(StepKind::Repel(RepelSettings::default())),
                StepConfig::new(StepKind::Drag(DragSettings::default())),
                StepConfig::new(StepKind::Friction(FrictionSettings::default())),
            ],
        }
    }

    /// Drops falling over the whole mesh while the button is held.
    pub fn rain() -> Self {
        Self {
            name: "Rain".to_string(),
            steps: vec![
                StepConfig::new(StepKind::RainEmitter(CreationSettings::rain())),
                StepConfig::new(StepKind::Gravity(GravitySettings::default())),
                StepConfig::disabled(StepKind::Wind(WindSettings::default())),
                StepConfig::new(StepKind::Repel(RepelSettings::default())),
                StepConfig::new(StepKind::Drag(DragSettings::default())),
                StepConfig::new(StepKind::Friction(FrictionSettings::default())),
            ],
        }
    }

    /// Enabled steps, in order.
    pub fn enabled_steps(&self) -> impl Iterator<Item = &StepKind> {
        self.steps.iter().filter(|s| s.enabled).map(|s| &s.kind)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.steps.iter().try_for_each(|s| s.kind.validate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_order() {
        let brush = BrushConfig::paint();
        let names: Vec<_> = brush.enabled_steps().map(StepKind::name).collect();
        assert_eq!(
            names,
            ["brush_emitter", "gravity", "repel", "drag", "friction"]
        );
    }

    #[test]
    fn test_rain_skips_disabled_wind() {
        let brush = BrushConfig::rain();
        assert_eq!(brush.steps.len(), 6);
        let names: Vec<_> = brush.enabled_steps().map(StepKind::name).collect();
        assert_eq!(
            names,
            ["rain_emitter", "gravity", "repel", "drag", "friction"]
        );
    }

    #[test]
    fn test_step_json_shape() {
        let json = r#"{"type": "Drag", "drag_coefficient": 2.5}"#;
        let step: StepConfig = serde_json::from_str(json).unwrap();
        assert!(step.enabled);
        assert_eq!(
            step.kind,
            StepKind::Drag(DragSettings {
                drag_coefficient: 2.5
            })
        );

        let json = r#"{"type": "Wind", "enabled": false}"#;
        let step: StepConfig = serde_json::from_str(json).unwrap();
        assert!(!step.enabled);
        assert_eq!(step.kind, StepKind::Wind(WindSettings::default()));
    }

    #[test]
    fn test_brush_json_roundtrip() {
        let brush = BrushConfig::rain();
        let json = serde_json::to_string(&brush).unwrap();
        let back: BrushConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, brush);
    }

    #[test]
    fn test_validate_rejects_negative_drag() {
        let mut brush = BrushConfig::paint();
        brush.steps.push(StepConfig::new(StepKind::Drag(DragSettings {
            drag_coefficient: -1.0,
        })));
        assert!(brush.validate().is_err());
    }
}
