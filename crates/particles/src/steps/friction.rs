use glam::Vec3;

use super::for_each_force;
use crate::store::ParticleStore;

/// Guards the tangential magnitude in the friction ratio
const MIN_PLANE_FORCE: f32 = 1e-9;

/// Surface friction.
///
/// The force is split into its normal and tangential parts; only the
/// tangential part survives, scaled by `clamp(1 + mu * (F.n) / |F_t|, 0, 1)`.
/// Normals point out of the surface, so a force pressing into it has a
/// negative `F.n` and is slowed, while a force pulling away is left alone.
#[derive(Debug, Clone, PartialEq)]
pub struct FrictionStep {
    pub coefficient: f32,
}

impl FrictionStep {
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }

    pub fn apply(&self, particles: &ParticleStore, forces: &mut [Vec3]) {
        let coefficient = self.coefficient;
        for_each_force(forces, |i, force| {
            *force = apply_friction(*force, particles.normal[i], coefficient);
        });
    }
}

/// Friction on a single force with unit surface normal `normal`.
pub fn apply_friction(force: Vec3, normal: Vec3, coefficient: f32) -> Vec3 {
    let factor = normal.dot(force);
    let plane = force - normal * factor;
    let plane_len = plane.length().max(MIN_PLANE_FORCE);
    let friction = (1.0 + coefficient * factor / plane_len).clamp(0.0, 1.0);
    plane * friction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulling_away_keeps_tangent() {
        let force = Vec3::new(3.0, 0.0, 5.0);
        let out = apply_friction(force, Vec3::Z, 0.5);
        assert_eq!(out, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_pressing_in_slows_tangent() {
        // factor = -2, |plane| = 4, friction = 1 - 0.5 * 2 / 4 = 0.75
        let out = apply_friction(Vec3::new(4.0, 0.0, -2.0), Vec3::Z, 0.5);
        assert!((out - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_strong_press_stops() {
        let out = apply_friction(Vec3::new(1.0, 0.0, -100.0), Vec3::Z, 1.0);
        assert_eq!(out, Vec3::ZERO);
    }

    #[test]
    fn test_pure_normal_force_is_finite() {
        let out = apply_friction(Vec3::new(0.0, 0.0, -9.81), Vec3::Z, 0.01);
        assert!(out.is_finite());
        assert_eq!(out, Vec3::ZERO);
    }
}
