use glam::Vec3;

use super::for_each_force;
use crate::grid::NeighborGrid;
use crate::store::ParticleStore;

/// Closer pairs than this have no usable direction and are skipped
const MIN_DISTANCE: f32 = 1e-6;

/// Floor for the timestep the repulsion is divided by
const MIN_TIMESTEP: f32 = 1e-4;

/// Pushes crowded particles apart so paint spreads evenly.
///
/// Each neighbor `j` closer than the grid's voxel size `r` contributes
/// `(1 - d / r)` along the unit direction from `j` to `i`; the sum is scaled
/// by `repulsion_factor / timestep`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepelStep {
    pub repulsion_factor: f32,
}

impl RepelStep {
    pub fn new(repulsion_factor: f32) -> Self {
        Self { repulsion_factor }
    }

    pub fn apply(
        &self,
        grid: &NeighborGrid,
        timestep: f32,
        particles: &ParticleStore,
        forces: &mut [Vec3],
    ) {
        // The grid indexes the particles as of the last rebuild
        if grid.len() != particles.len() || self.repulsion_factor == 0.0 {
            return;
        }

        let radius = grid.voxel_size();
        let scale = self.repulsion_factor / timestep.max(MIN_TIMESTEP);
        let locations = particles.locations();
        for_each_force(forces, |i, force| {
            *force += scale * repulsion(i, locations, grid, radius);
        });
    }
}

/// Unscaled repulsion on particle `i` from its neighbors within `radius`.
fn repulsion(i: usize, locations: &[Vec3], grid: &NeighborGrid, radius: f32) -> Vec3 {
    let here = locations[i];
    let mut push = Vec3::ZERO;
    for j in grid.neighbors_of(here) {
        if j == i {
            continue;
        }
        let Some(&there) = locations.get(j) else {
            continue;
        };
        let offset = here - there;
        let distance = offset.length();
        if distance < MIN_DISTANCE || distance >= radius {
            continue;
        }
        push += (1.0 - distance / radius) * (offset / distance);
    }
    push
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Particle;

    fn store(points: &[Vec3]) -> ParticleStore {
        let mut store = ParticleStore::new();
        for &location in points {
            store.push(Particle {
                location,
                ..Default::default()
            });
        }
        store
    }

    #[test]
    fn test_pair_pushes_apart_equally() {
        let points = [Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.05, 0.0, 0.0)];
        let particles = store(&points);
        let mut grid = NeighborGrid::new(1009);
        grid.build(particles.locations(), 0.1);

        let mut forces = vec![Vec3::ZERO; 2];
        RepelStep::new(0.2).apply(&grid, 0.01, &particles, &mut forces);

        // (1 - 0.5) * 0.2 / 0.01 = 10
        assert!((forces[0] - Vec3::new(-10.0, 0.0, 0.0)).length() < 1e-3);
        assert!((forces[0] + forces[1]).length() < 1e-4);
    }

    #[test]
    fn test_far_particles_unaffected() {
        let points = [Vec3::ZERO, Vec3::new(0.15, 0.0, 0.0)];
        let particles = store(&points);
        let mut grid = NeighborGrid::new(1009);
        grid.build(particles.locations(), 0.1);

        let mut forces = vec![Vec3::ZERO; 2];
        RepelStep::new(0.2).apply(&grid, 0.01, &particles, &mut forces);
        assert_eq!(forces, vec![Vec3::ZERO; 2]);
    }

    #[test]
    fn test_coincident_particles_are_finite() {
        let points = [Vec3::ZERO, Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0)];
        let particles = store(&points);
        let mut grid = NeighborGrid::new(1009);
        grid.build(particles.locations(), 0.1);

        let mut forces = vec![Vec3::ZERO; 3];
        RepelStep::new(0.2).apply(&grid, 0.0, &particles, &mut forces);
        assert!(forces.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn test_stale_grid_is_ignored() {
        let particles = store(&[Vec3::ZERO, Vec3::new(0.01, 0.0, 0.0)]);
        let grid = NeighborGrid::new(1009);
        let mut forces = vec![Vec3::ZERO; 2];
        RepelStep::new(0.2).apply(&grid, 0.01, &particles, &mut forces);
        assert_eq!(forces, vec![Vec3::ZERO; 2]);
    }
}
