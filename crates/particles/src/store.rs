//! Structure-of-arrays particle storage.
//!
//! A particle's identity is its current slot. Slots shift when dead
//! particles are compacted out, so indices are only valid within a tick.

use glam::{Vec2, Vec3};

/// Smallest mass a particle may have
pub const MIN_MASS: f32 = 1e-4;

/// One particle in row form, used to create particles and read them back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub location: Vec3,
    pub acceleration: Vec3,
    pub speed: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub size: f32,
    pub mass: f32,
    pub age: f32,
    pub max_age: f32,
    pub color: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            speed: Vec3::ZERO,
            normal: Vec3::Z,
            uv: Vec2::ZERO,
            size: 0.0,
            mass: 1.0,
            age: 0.0,
            max_age: 1.0,
            color: Vec3::ONE,
        }
    }
}

impl Particle {
    /// Alive until its age passes its lifetime. NaN ages count as dead.
    pub fn is_alive(&self) -> bool {
        is_alive(self.age, self.max_age)
    }
}

fn is_alive(age: f32, max_age: f32) -> bool {
    age <= max_age
}

/// Column-wise particle buffer. All columns always have the same length.
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    pub(crate) location: Vec<Vec3>,
    pub(crate) acceleration: Vec<Vec3>,
    pub(crate) speed: Vec<Vec3>,
    pub(crate) normal: Vec<Vec3>,
    pub(crate) uv: Vec<Vec2>,
    pub(crate) size: Vec<f32>,
    pub(crate) mass: Vec<f32>,
    pub(crate) age: Vec<f32>,
    pub(crate) max_age: Vec<f32>,
    pub(crate) color: Vec<Vec3>,
}

/// Keep the entries of `column` whose flag in `keep` is set, in order.
fn retain_by_mask<T>(column: &mut Vec<T>, keep: &[bool]) {
    let mut flags = keep.iter();
    column.retain(|_| flags.next().copied().unwrap_or(false));
}

impl ParticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            location: Vec::with_capacity(capacity),
            acceleration: Vec::with_capacity(capacity),
            speed: Vec::with_capacity(capacity),
            normal: Vec::with_capacity(capacity),
            uv: Vec::with_capacity(capacity),
            size: Vec::with_capacity(capacity),
            mass: Vec::with_capacity(capacity),
            age: Vec::with_capacity(capacity),
            max_age: Vec::with_capacity(capacity),
            color: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.location.len()
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_empty()
    }

    pub fn clear(&mut self) {
        self.location.clear();
        self.acceleration.clear();
        self.speed.clear();
        self.normal.clear();
        self.uv.clear();
        self.size.clear();
        self.mass.clear();
        self.age.clear();
        self.max_age.clear();
        self.color.clear();
    }

    /// Add a particle. Mass is clamped to [`MIN_MASS`], size and lifetime
    /// to zero, so the store never holds a particle that breaks integration.
    pub fn push(&mut self, particle: Particle) {
        self.location.push(particle.location);
        self.acceleration.push(particle.acceleration);
        self.speed.push(particle.speed);
        self.normal.push(particle.normal);
        self.uv.push(particle.uv);
        self.size.push(particle.size.max(0.0));
        self.mass.push(particle.mass.max(MIN_MASS));
        self.age.push(particle.age.max(0.0));
        self.max_age.push(particle.max_age.max(0.0));
        self.color.push(particle.color);
    }

    /// Move every particle of `other` to the end of this store.
    pub fn append(&mut self, other: &mut ParticleStore) {
        self.location.append(&mut other.location);
        self.acceleration.append(&mut other.acceleration);
        self.speed.append(&mut other.speed);
        self.normal.append(&mut other.normal);
        self.uv.append(&mut other.uv);
        self.size.append(&mut other.size);
        self.mass.append(&mut other.mass);
        self.age.append(&mut other.age);
        self.max_age.append(&mut other.max_age);
        self.color.append(&mut other.color);
    }

    pub fn get(&self, index: usize) -> Option<Particle> {
        if index >= self.len() {
            return None;
        }
        Some(Particle {
            location: self.location[index],
            acceleration: self.acceleration[index],
            speed: self.speed[index],
            normal: self.normal[index],
            uv: self.uv[index],
            size: self.size[index],
            mass: self.mass[index],
            age: self.age[index],
            max_age: self.max_age[index],
            color: self.color[index],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Age a particle past its lifetime so the next cull removes it.
    pub fn kill(&mut self, index: usize) {
        if let Some(age) = self.age.get_mut(index) {
            *age = f32::INFINITY;
        }
    }

    /// Remove dead particles, keeping the survivors in their current order.
    /// Returns how many were removed.
    pub fn remove_dead(&mut self) -> usize {
        let keep: Vec<bool> = self
            .age
            .iter()
            .zip(&self.max_age)
            .map(|(&age, &max_age)| is_alive(age, max_age))
            .collect();
        let removed = keep.iter().filter(|&&k| !k).count();
        if removed == 0 {
            return 0;
        }

        retain_by_mask(&mut self.location, &keep);
        retain_by_mask(&mut self.acceleration, &keep);
        retain_by_mask(&mut self.speed, &keep);
        retain_by_mask(&mut self.normal, &keep);
        retain_by_mask(&mut self.uv, &keep);
        retain_by_mask(&mut self.size, &keep);
        retain_by_mask(&mut self.mass, &keep);
        retain_by_mask(&mut self.age, &keep);
        retain_by_mask(&mut self.max_age, &keep);
        retain_by_mask(&mut self.color, &keep);
        removed
    }

    /// Mean base size, or `None` for an empty store.
    pub fn average_size(&self) -> Option<f32> {
        if self.is_empty() {
            return None;
        }
        Some(self.size.iter().sum::<f32>() / self.len() as f32)
    }

    pub fn locations(&self) -> &[Vec3] {
        &self.location
    }

    pub fn accelerations(&self) -> &[Vec3] {
        &self.acceleration
    }

    pub fn speeds(&self) -> &[Vec3] {
        &self.speed
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normal
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uv
    }

    pub fn sizes(&self) -> &[f32] {
        &self.size
    }

    pub fn masses(&self) -> &[f32] {
        &self.mass
    }

    pub fn ages(&self) -> &[f32] {
        &self.age
    }

    pub fn max_ages(&self) -> &[f32] {
        &self.max_age
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(x: f32, age: f32, max_age: f32) -> Particle {
        Particle {
            location: Vec3::new(x, 0.0, 0.0),
            size: x,
            age,
            max_age,
            ..Default::default()
        }
    }

    #[test]
    fn test_push_and_get() {
        let mut store = ParticleStore::new();
        assert!(store.is_empty());
        store.push(particle(1.0, 0.0, 1.0));
        store.push(particle(2.0, 0.5, 1.0));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().location.x, 2.0);
        assert!(store.get(2).is_none());
    }

    #[test]
    fn test_push_clamps() {
        let mut store = ParticleStore::new();
        store.push(Particle {
            mass: -3.0,
            size: -1.0,
            max_age: -2.0,
            ..Default::default()
        });
        let p = store.get(0).unwrap();
        assert_eq!(p.mass, MIN_MASS);
        assert_eq!(p.size, 0.0);
        assert_eq!(p.max_age, 0.0);
    }

    #[test]
    fn test_remove_dead_preserves_order() {
        let mut store = ParticleStore::new();
        store.push(particle(0.0, 0.0, 1.0));
        store.push(particle(1.0, 2.0, 1.0));
        store.push(particle(2.0, 1.0, 1.0));
        store.push(particle(3.0, 5.0, 1.0));
        store.push(particle(4.0, 0.2, 1.0));

        assert_eq!(store.remove_dead(), 2);
        assert_eq!(store.len(), 3);
        let xs: Vec<f32> = store.locations().iter().map(|l| l.x).collect();
        assert_eq!(xs, [0.0, 2.0, 4.0]);
        // Columns stay in lockstep
        assert_eq!(store.sizes(), &[0.0, 2.0, 4.0]);
        assert!(store.iter().all(|p| p.age <= p.max_age));
    }

    #[test]
    fn test_kill_and_nan_age() {
        let mut store = ParticleStore::new();
        store.push(particle(0.0, 0.0, 1.0));
        store.push(particle(1.0, 0.0, 1.0));
        store.push(particle(2.0, 0.0, 1.0));
        store.kill(0);
        store.age[2] = f32::NAN;
        assert_eq!(store.remove_dead(), 2);
        assert_eq!(store.locations()[0].x, 1.0);
    }

    #[test]
    fn test_append_drains_other() {
        let mut store = ParticleStore::new();
        store.push(particle(1.0, 0.0, 1.0));
        let mut other = ParticleStore::with_capacity(2);
        other.push(particle(2.0, 0.0, 1.0));
        other.push(particle(3.0, 0.0, 1.0));
        store.append(&mut other);
        assert_eq!(store.len(), 3);
        assert!(other.is_empty());
        assert_eq!(store.average_size(), Some(2.0));
    }
}
