use glam::Vec3;

use super::for_each_force;
use crate::store::ParticleStore;

/// Smallest reference size used to normalize particle sizes
const MIN_REFERENCE_SIZE: f32 = 1e-6;

/// Air drag opposing velocity, stronger for larger particles.
///
/// `force -= coefficient * (size / reference_size)^2 * speed`
#[derive(Debug, Clone, PartialEq)]
pub struct DragStep {
    pub coefficient: f32,
    /// Nominal particle size of the brush's emitter
    pub reference_size: f32,
}

impl DragStep {
    pub fn new(coefficient: f32, reference_size: f32) -> Self {
        Self {
            coefficient,
            reference_size,
        }
    }

    pub fn apply(&self, particles: &ParticleStore, forces: &mut [Vec3]) {
        let reference = self.reference_size.max(MIN_REFERENCE_SIZE);
        let inv_reference_sqr = 1.0 / (reference * reference);
        let coefficient = self.coefficient;
        for_each_force(forces, |i, force| {
            let size = particles.size[i];
            let factor = coefficient * size * size * inv_reference_sqr;
            *force -= factor * particles.speed[i];
        });
    }
}
