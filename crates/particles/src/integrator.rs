//! Sub-stepped time integration and surface re-projection.

use glam::Vec3;
use surface::SurfaceIndex;

use crate::store::{MIN_MASS, ParticleStore};

/// Improved-Euler integrator. Forces are held constant across the
/// sub-steps of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    sub_steps: u32,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::new(daub_config::DEFAULT_SIM_SUB_STEPS)
    }
}

impl Integrator {
    pub fn new(sub_steps: u32) -> Self {
        Self {
            sub_steps: sub_steps.max(1),
        }
    }

    pub fn sub_steps(&self) -> u32 {
        self.sub_steps
    }

    /// Advance every particle by `timestep` under `forces` (one per particle).
    pub fn integrate(&self, particles: &mut ParticleStore, forces: &[Vec3], timestep: f32) {
        if timestep <= 0.0 {
            return;
        }
        let h = timestep / self.sub_steps as f32;
        let half_h = 0.5 * h;
        let count = particles.len().min(forces.len());

        for i in 0..count {
            let new_acceleration = forces[i] / particles.mass[i].max(MIN_MASS);
            let mut acceleration = particles.acceleration[i];
            let mut speed = particles.speed[i];
            let mut location = particles.location[i];
            let mut age = particles.age[i];

            for _ in 0..self.sub_steps {
                let new_speed = speed + half_h * (acceleration + new_acceleration);
                location += half_h * (speed + new_speed);
                speed = new_speed;
                acceleration = new_acceleration;
                age += h;
            }

            particles.acceleration[i] = acceleration;
            particles.speed[i] = speed;
            particles.location[i] = location;
            particles.age[i] = age;
        }
    }

    /// Snap every particle back onto the surface, refresh normal and UV, and
    /// drop the normal component of its speed. Particles with no surface
    /// point are killed. Returns how many were killed.
    pub fn reproject(particles: &mut ParticleStore, surface: &SurfaceIndex) -> usize {
        let hits = surface.closest_points(particles.locations());
        let mut killed = 0;
        for (i, hit) in hits.into_iter().enumerate() {
            match hit {
                Some(hit) => {
                    let normal = hit.normal;
                    let speed = particles.speed[i];
                    particles.location[i] = hit.location;
                    particles.normal[i] = normal;
                    particles.uv[i] = surface.uv_at(&hit);
                    particles.speed[i] = speed - normal * speed.dot(normal);
                }
                None => {
                    particles.kill(i);
                    killed += 1;
                }
            }
        }
        killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Particle;
    use surface::MeshSnapshot;

    fn plane() -> SurfaceIndex {
        let mesh = MeshSnapshot::new(
            vec![
                Vec3::new(-10.0, -10.0, 0.0),
                Vec3::new(10.0, -10.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(-10.0, 10.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        SurfaceIndex::build(mesh).unwrap()
    }

    fn single(particle: Particle) -> ParticleStore {
        let mut store = ParticleStore::new();
        store.push(particle);
        store
    }

    #[test]
    fn test_stationary_without_force() {
        let start = Vec3::new(0.3, -0.2, 0.0);
        let mut particles = single(Particle {
            location: start,
            max_age: 100.0,
            ..Default::default()
        });
        let surface = plane();
        let integrator = Integrator::new(3);

        for _ in 0..50 {
            integrator.integrate(&mut particles, &[Vec3::ZERO], 0.04);
            Integrator::reproject(&mut particles, &surface);
        }
        assert!((particles.locations()[0] - start).length() < 1e-5);
        assert_eq!(particles.speeds()[0], Vec3::ZERO);
        assert!((particles.ages()[0] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_constant_force_from_rest() {
        let mut particles = single(Particle {
            mass: 0.5,
            max_age: 100.0,
            ..Default::default()
        });
        let integrator = Integrator::new(4);
        integrator.integrate(&mut particles, &[Vec3::new(1.0, 0.0, 0.0)], 0.5);

        // a = 2, h = 0.125. The first sub-step averages the old (zero) and
        // new acceleration, the rest are uniform.
        assert!((particles.accelerations()[0].x - 2.0).abs() < 1e-6);
        assert!((particles.speeds()[0].x - 0.875).abs() < 1e-5);
        assert!((particles.locations()[0].x - 0.195_312_5).abs() < 1e-5);
        assert!((particles.ages()[0] - 0.5).abs() < 1e-6);

        // Next tick starts from a = 2, so it matches the exact solution
        integrator.integrate(&mut particles, &[Vec3::new(1.0, 0.0, 0.0)], 0.5);
        assert!((particles.speeds()[0].x - 1.875).abs() < 1e-5);
    }

    #[test]
    fn test_zero_timestep_changes_nothing() {
        let mut particles = single(Particle {
            mass: 1.0,
            ..Default::default()
        });
        let before = particles.get(0);
        Integrator::default().integrate(&mut particles, &[Vec3::new(500.0, 0.0, 0.0)], 0.0);
        assert_eq!(particles.get(0), before);
    }

    #[test]
    fn test_zero_sub_steps_treated_as_one() {
        assert_eq!(Integrator::new(0).sub_steps(), 1);
    }

    #[test]
    fn test_reproject_snaps_and_flattens_speed() {
        let mut particles = single(Particle {
            location: Vec3::new(1.0, 2.0, 0.3),
            speed: Vec3::new(1.0, 0.0, -4.0),
            normal: Vec3::X,
            ..Default::default()
        });
        let killed = Integrator::reproject(&mut particles, &plane());
        assert_eq!(killed, 0);
        assert!((particles.locations()[0] - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
        assert!((particles.normals()[0] - Vec3::Z).length() < 1e-6);
        assert!((particles.speeds()[0] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_reproject_kills_lost_particles() {
        let mut particles = single(Particle {
            location: Vec3::new(f32::NAN, 0.0, 0.0),
            ..Default::default()
        });
        particles.push(Particle::default());
        assert_eq!(Integrator::reproject(&mut particles, &plane()), 1);
        assert_eq!(particles.remove_dead(), 1);
        assert_eq!(particles.len(), 1);
    }
}
