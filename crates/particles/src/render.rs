//! Read-only particle data for the host renderer.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::store::ParticleStore;

/// GPU-compatible particle splat.
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct ParticleVertex {
    pub location: [f32; 3],
    /// Size at the particle's current age
    pub size: f32,
    pub uv: [f32; 2],
    pub age: f32,
    pub max_age: f32,
    pub color: [f32; 3],
    pub _pad: f32,
}

/// Borrowed view over the columns a renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct ParticleView<'a> {
    pub locations: &'a [Vec3],
    pub uvs: &'a [Vec2],
    pub sizes: &'a [f32],
    pub ages: &'a [f32],
    pub max_ages: &'a [f32],
    pub colors: &'a [Vec3],
    /// Size multiplier reached at end of life
    pub size_age_factor: f32,
}

/// Size of a particle at `age`, growing linearly from `size` to
/// `size * size_age_factor` over its lifetime.
pub fn size_at_age(size: f32, age: f32, max_age: f32, size_age_factor: f32) -> f32 {
    let t = if max_age > 0.0 {
        (age / max_age).clamp(0.0, 1.0)
    } else {
        1.0
    };
    size * (1.0 + (size_age_factor - 1.0) * t)
}

impl<'a> ParticleView<'a> {
    pub fn new(store: &'a ParticleStore, size_age_factor: f32) -> Self {
        Self {
            locations: store.locations(),
            uvs: store.uvs(),
            sizes: store.sizes(),
            ages: store.ages(),
            max_ages: store.max_ages(),
            colors: store.colors(),
            size_age_factor,
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn render_size(&self, index: usize) -> f32 {
        size_at_age(
            self.sizes[index],
            self.ages[index],
            self.max_ages[index],
            self.size_age_factor,
        )
    }

    /// Pack into vertices ready for upload via `bytemuck::cast_slice`.
    pub fn to_vertices(&self) -> Vec<ParticleVertex> {
        (0..self.len())
            .map(|i| ParticleVertex {
                location: self.locations[i].to_array(),
                size: self.render_size(i),
                uv: self.uvs[i].to_array(),
                age: self.ages[i],
                max_age: self.max_ages[i],
                color: self.colors[i].to_array(),
                _pad: 0.0,
            })
            .collect()
    }
}
