//! Axis-aligned bounding boxes for BVH nodes.

use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// An inverted box that any `include_*` call will overwrite.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    pub fn from_triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            min: a.min(b).min(c),
            max: a.max(b).max(c),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn include_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn include_aabb(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index (0 = x, 1 = y, 2 = z) of the longest side.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Squared distance from `point` to the box; zero inside.
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    /// Slab test. Returns the entry distance along the ray if the box is hit
    /// in front of the origin and no farther than `max_t`.
    ///
    /// `inv_dir` is the component-wise reciprocal of the ray direction.
    pub fn ray_entry(&self, origin: Vec3, inv_dir: Vec3, max_t: f32) -> Option<f32> {
        let mut enter = 0.0_f32;
        let mut exit = max_t;

        for axis in 0..3 {
            let o = origin[axis];
            let inv = inv_dir[axis];
            if !inv.is_finite() {
                // Parallel to this slab
                if o < self.min[axis] || o > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (self.min[axis] - o) * inv;
            let t2 = (self.max[axis] - o) * inv;
            enter = enter.max(t1.min(t2));
            exit = exit.min(t1.max(t2));
            if enter > exit {
                return None;
            }
        }

        Some(enter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_then_include() {
        let mut aabb = Aabb::empty();
        assert!(aabb.is_empty());
        aabb.include_point(Vec3::new(1.0, -2.0, 3.0));
        aabb.include_point(Vec3::new(-1.0, 2.0, 0.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.longest_axis(), 1);
    }

    #[test]
    fn test_distance_squared() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.distance_squared(Vec3::splat(0.5)), 0.0);
        assert!((aabb.distance_squared(Vec3::new(2.0, 0.5, 0.5)) - 1.0).abs() < 1e-6);
        assert!((aabb.distance_squared(Vec3::new(2.0, 2.0, 0.5)) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ray_entry() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let origin = Vec3::new(0.5, 0.5, 5.0);
        let dir = Vec3::new(0.0, 0.0, -1.0);
        let entry = aabb.ray_entry(origin, dir.recip(), f32::MAX);
        assert!((entry.unwrap() - 4.0).abs() < 1e-6);

        // Pointing away
        assert!(aabb.ray_entry(origin, (-dir).recip(), f32::MAX).is_none());
        // Beyond max_t
        assert!(aabb.ray_entry(origin, dir.recip(), 3.0).is_none());
        // Origin inside
        assert_eq!(aabb.ray_entry(Vec3::splat(0.5), dir.recip(), f32::MAX), Some(0.0));
    }

    #[test]
    fn test_ray_entry_flat_box() {
        // Boxes around planar meshes have zero thickness on one axis
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let origin = Vec3::new(0.1, 0.0, 0.7);
        let dir = Vec3::new(0.0, 1.0, -1.0).normalize();
        assert!(aabb.ray_entry(origin, dir.recip(), f32::MAX).is_some());

        let parallel = Vec3::new(1.0, 0.0, 0.0);
        assert!(aabb.ray_entry(origin, parallel.recip(), f32::MAX).is_none());
    }
}
