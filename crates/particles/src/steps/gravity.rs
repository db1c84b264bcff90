use glam::Vec3;

use super::for_each_force;
use crate::store::ParticleStore;

/// Constant acceleration, applied as `mass * gravity`.
#[derive(Debug, Clone, PartialEq)]
pub struct GravityStep {
    pub gravity: Vec3,
}

impl GravityStep {
    pub fn new(gravity: Vec3) -> Self {
        Self { gravity }
    }

    pub fn apply(&self, particles: &ParticleStore, forces: &mut [Vec3]) {
        let gravity = self.gravity;
        for_each_force(forces, |i, force| {
            *force += particles.mass[i] * gravity;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Particle;

    #[test]
    fn test_gravity_scales_with_mass() {
        let mut particles = ParticleStore::new();
        particles.push(Particle { mass: 1.0, ..Default::default() });
        particles.push(Particle { mass: 0.5, ..Default::default() });
        let mut forces = vec![Vec3::ZERO, Vec3::X];

        GravityStep::new(Vec3::new(0.0, 0.0, -10.0)).apply(&particles, &mut forces);
        assert_eq!(forces[0], Vec3::new(0.0, 0.0, -10.0));
        assert_eq!(forces[1], Vec3::new(1.0, 0.0, -5.0));
    }
}
