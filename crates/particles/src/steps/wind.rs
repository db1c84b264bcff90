use glam::Vec3;

use super::for_each_force;
use crate::source::SourceInput;

/// A gust following the brush: pushes along how far the view direction
/// has turned since the stroke began.
#[derive(Debug, Clone, PartialEq)]
pub struct WindStep {
    pub strength: f32,
}

impl WindStep {
    pub fn new(strength: f32) -> Self {
        Self { strength }
    }

    pub fn wind_force(&self, input: &SourceInput) -> Vec3 {
        self.strength * (input.frame.direction - input.start_frame.direction)
    }

    pub fn apply(&self, input: &SourceInput, forces: &mut [Vec3]) {
        let wind = self.wind_force(input);
        if wind == Vec3::ZERO {
            return;
        }
        for_each_force(forces, |_, force| *force += wind);
    }
}
