//! Particle emission along rays shot at the surface.

use std::f32::consts::TAU;

use daub_config::CreationSettings;
use glam::{Vec2, Vec3};
use rand::Rng;
use rand::rngs::StdRng;
use surface::{Ray, SurfaceHit, SurfaceIndex};
use tracing::trace;

use crate::color::apply_hsv_offset;
use crate::source::SourceInput;
use crate::store::{Particle, ParticleStore};

/// Most particles one emitter creates in a single tick. Anything due beyond
/// this is dropped rather than carried over.
pub const MAX_EMIT_PER_TICK: usize = 10_000;

/// Where emission rays come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterShape {
    /// Rays fan out from the brush origin through a disk around the view
    /// direction, scaled by pressure
    Brush,
    /// Vertical rays over the surface's XY footprint, starting above it
    Rain,
}

/// Emits `flow_rate * pressure` particles per second while the user is
/// emitting. Fractional particles carry over between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterStep {
    pub shape: EmitterShape,
    pub creation: CreationSettings,
    /// Seconds since the last emitted particle
    accumulator: f32,
}

impl EmitterStep {
    pub fn new(shape: EmitterShape, creation: CreationSettings) -> Self {
        Self {
            shape,
            creation,
            accumulator: 0.0,
        }
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Advance the accumulator by `timestep` and return how many particles
    /// are due. Zero when not emitting.
    pub fn emission_count(&mut self, input: &SourceInput, timestep: f32) -> usize {
        if !input.is_emitting() {
            return 0;
        }
        let rate = self.creation.flow_rate * input.pressure;
        if rate <= 0.0 || !rate.is_finite() {
            return 0;
        }

        let interval = 1.0 / rate;
        self.accumulator += timestep.max(0.0);
        let due = self.accumulator / interval;
        if !due.is_finite() || due >= MAX_EMIT_PER_TICK as f32 {
            self.accumulator = 0.0;
            return MAX_EMIT_PER_TICK;
        }
        let count = due.floor();
        self.accumulator = (self.accumulator - count * interval).max(0.0);
        count as usize
    }

    /// Emit this tick's particles into `new_particles`.
    pub fn emit(
        &mut self,
        surface: &SurfaceIndex,
        input: &SourceInput,
        timestep: f32,
        rng: &mut StdRng,
        new_particles: &mut ParticleStore,
    ) {
        let count = self.emission_count(input, timestep);
        if count == 0 {
            return;
        }

        let rays: Vec<Ray> = match self.shape {
            EmitterShape::Brush => (0..count).map(|_| brush_ray(input, rng)).collect(),
            EmitterShape::Rain => {
                let bounds = surface.bounds();
                (0..count).map(|_| rain_ray(bounds.min, bounds.max, rng)).collect()
            }
        };

        let hits = surface.shoot_rays(&rays);
        let before = new_particles.len();
        for (ray, hit) in rays.iter().zip(hits) {
            // Rays that miss the mesh simply produce nothing
            let Some(hit) = hit else {
                continue;
            };
            let uv = surface.uv_at(&hit);
            new_particles.push(create_particle(
                &self.creation,
                ray.direction,
                &hit,
                uv,
                input.color,
                rng,
            ));
        }
        trace!(
            "{:?} emitter: {} rays, {} hits",
            self.shape,
            count,
            new_particles.len() - before
        );
    }
}

fn brush_ray(input: &SourceInput, rng: &mut StdRng) -> Ray {
    let frame = &input.frame;
    let radius = input.radius * input.pressure;
    let angle = TAU * rng.random::<f32>();
    let distance = radius * rng.random::<f32>();
    let offset_x = angle.cos() * distance;
    let offset_y = angle.sin() * distance;
    let direction = offset_x * frame.right + offset_y * frame.up + frame.direction;
    Ray::new(frame.origin, direction)
}

fn rain_ray(min: Vec3, max: Vec3, rng: &mut StdRng) -> Ray {
    let size = max - min;
    let x = min.x + size.x * rng.random::<f32>();
    let y = min.y + size.y * rng.random::<f32>();
    Ray::new(Vec3::new(x, y, max.z + 1.0), Vec3::NEG_Z)
}

/// Uniform sample in `center - spread ..= center + spread`.
fn sample_spread(rng: &mut StdRng, center: f32, spread: f32) -> f32 {
    center + spread * (2.0 * rng.random::<f32>() - 1.0)
}

/// Build a particle at a ray hit with randomized attributes.
pub(crate) fn create_particle(
    creation: &CreationSettings,
    ray_direction: Vec3,
    hit: &SurfaceHit,
    uv: Vec2,
    brush_color: Vec3,
    rng: &mut StdRng,
) -> Particle {
    let normal = hit.normal;
    let along_ray = ray_direction.normalize_or_zero() * creation.initial_speed;
    let jitter_range = 0.5 * creation.initial_speed * creation.initial_speed_random;
    let jitter = Vec3::new(
        sample_spread(rng, 0.0, jitter_range),
        sample_spread(rng, 0.0, jitter_range),
        sample_spread(rng, 0.0, jitter_range),
    );
    let speed = along_ray + jitter;
    let speed = speed - normal * speed.dot(normal);

    let size = sample_spread(rng, creation.particle_size, creation.particle_size_random);
    let mass = sample_spread(rng, creation.mass, creation.mass_random);
    let max_age = sample_spread(rng, creation.max_age, creation.max_age_random);

    let [h, s, v] = creation.color_random;
    let hsv_offset = Vec3::new(
        sample_spread(rng, 0.0, h),
        sample_spread(rng, 0.0, s),
        sample_spread(rng, 0.0, v),
    );
    let color = apply_hsv_offset(brush_color, hsv_offset);

    // Store::push clamps mass, size and lifetime
    Particle {
        location: hit.location,
        acceleration: Vec3::ZERO,
        speed,
        normal,
        uv,
        size,
        mass,
        age: 0.0,
        max_age,
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Frame, Interactions};
    use rand::SeedableRng;
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

    fn emitting(pressure: f32) -> SourceInput {
        SourceInput::new(
            Frame::new(Vec3::new(0.0, 0.0, 2.0), Vec3::NEG_Z),
            0.5,
            pressure,
            Interactions::EMIT_PARTICLES,
            Vec3::new(0.8, 0.2, 0.2),
        )
    }

    #[test]
    fn test_emission_count_carries_remainder() {
        let creation = CreationSettings {
            flow_rate: 10.0,
            ..Default::default()
        };
        let mut emitter = EmitterStep::new(EmitterShape::Brush, creation);
        let input = emitting(1.0);

        // 0.25 s at 10/s: 2 now, 0.05 s carried
        assert_eq!(emitter.emission_count(&input, 0.25), 2);
        assert!((emitter.accumulator() - 0.05).abs() < 1e-5);
        assert_eq!(emitter.emission_count(&input, 0.06), 1);
        assert!((emitter.accumulator() - 0.01).abs() < 1e-5);
    }

    #[test]
    fn test_emission_count_capped_per_tick() {
        let creation = CreationSettings {
            flow_rate: 1.0e30,
            ..Default::default()
        };
        let mut emitter = EmitterStep::new(EmitterShape::Brush, creation);
        let input = emitting(1.0);
        assert_eq!(emitter.emission_count(&input, 0.04), MAX_EMIT_PER_TICK);
        assert_eq!(emitter.accumulator(), 0.0);

        // Excess is not carried into the next tick
        emitter.creation.flow_rate = 10.0;
        assert_eq!(emitter.emission_count(&input, 0.05), 0);
    }

    #[test]
    fn test_emission_rate_independent_of_tick_size() {
        let creation = CreationSettings {
            flow_rate: 37.0,
            ..Default::default()
        };
        let input = emitting(1.0);
        for ticks in [7, 60, 333, 1000] {
            let mut emitter = EmitterStep::new(EmitterShape::Brush, creation.clone());
            let dt = 2.0 / ticks as f32;
            let total: usize = (0..ticks).map(|_| emitter.emission_count(&input, dt)).sum();
            assert!(total.abs_diff(74) <= 1, "{ticks} ticks gave {total}");
        }
    }

    #[test]
    fn test_no_emission_without_flag_or_pressure() {
        let mut emitter = EmitterStep::new(EmitterShape::Brush, CreationSettings::default());
        let mut input = emitting(0.0);
        assert_eq!(emitter.emission_count(&input, 1.0), 0);

        input.pressure = 1.0;
        input.interactions = Interactions::empty();
        assert_eq!(emitter.emission_count(&input, 1.0), 0);
        assert_eq!(emitter.accumulator(), 0.0);

        let mut stopped = EmitterStep::new(
            EmitterShape::Brush,
            CreationSettings {
                flow_rate: 0.0,
                ..Default::default()
            },
        );
        assert_eq!(stopped.emission_count(&emitting(1.0), 1.0), 0);
    }

    #[test]
    fn test_brush_emits_inside_disk() {
        let surface = plane();
        let input = emitting(1.0);
        let mut emitter = EmitterStep::new(EmitterShape::Brush, CreationSettings::default());
        let mut rng = StdRng::seed_from_u64(1);
        let mut out = ParticleStore::new();

        emitter.emit(&surface, &input, 1.0, &mut rng, &mut out);
        assert_eq!(out.len(), 50);
        for p in out.iter() {
            assert!(p.location.z.abs() < 1e-5);
            // Ray from z=2 through a disk of radius 0.5 at unit distance
            assert!(p.location.truncate().length() <= 1.0 + 1e-4);
            assert!(p.mass > 0.0);
            assert!(p.size >= 0.02 - 1e-6 && p.size <= 0.04 + 1e-6);
            assert!(p.max_age >= 1.0 - 1e-6 && p.max_age <= 3.0 + 1e-6);
            assert_eq!(p.age, 0.0);
            assert!(p.color.cmpge(Vec3::ZERO).all() && p.color.cmple(Vec3::ONE).all());
        }
    }

    #[test]
    fn test_rain_covers_footprint() {
        let surface = plane();
        let input = emitting(1.0);
        let mut emitter = EmitterStep::new(EmitterShape::Rain, CreationSettings::rain());
        let mut rng = StdRng::seed_from_u64(2);
        let mut out = ParticleStore::new();

        emitter.emit(&surface, &input, 0.0201, &mut rng, &mut out);
        assert_eq!(out.len(), 50);
        let spread = out
            .locations()
            .iter()
            .fold(0.0_f32, |m, l| m.max(l.x.abs()).max(l.y.abs()));
        // Far beyond the brush radius
        assert!(spread > 2.0);
    }

    #[test]
    fn test_initial_speed_is_tangent() {
        let creation = CreationSettings {
            initial_speed: 2.0,
            initial_speed_random: 1.0,
            ..Default::default()
        };
        let hit = SurfaceHit {
            location: Vec3::ZERO,
            normal: Vec3::Z,
            triangle_index: 0,
            barycentric: Vec3::new(1.0, 0.0, 0.0),
        };
        let mut rng = StdRng::seed_from_u64(9);
        let particle = create_particle(
            &creation,
            Vec3::new(1.0, 0.0, -1.0),
            &hit,
            Vec2::ZERO,
            Vec3::ONE,
            &mut rng,
        );
        assert!(particle.speed.z.abs() < 1e-6);
        // sqrt(2) along x, plus at most 0.5 * 2 * 1 jitter
        assert!((particle.speed.x - std::f32::consts::SQRT_2).abs() <= 1.0 + 1e-5);
    }

    #[test]
    fn test_same_seed_same_particles() {
        let surface = plane();
        let input = emitting(0.7);
        let run = || {
            let mut emitter = EmitterStep::new(EmitterShape::Brush, CreationSettings::default());
            let mut rng = StdRng::seed_from_u64(42);
            let mut out = ParticleStore::new();
            emitter.emit(&surface, &input, 0.5, &mut rng, &mut out);
            out.iter().collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
