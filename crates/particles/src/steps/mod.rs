//! Force steps run in order each tick.
//!
//! A brush's step list is resolved once at stroke start into a flat
//! `Vec<ForceStep>`. Each step reads the particles, adds to the per-particle
//! force accumulator and may queue new particles for the end of the tick.

mod drag;
mod emitter;
mod friction;
mod gravity;
mod repel;
mod wind;

pub use drag::*;
pub use emitter::*;
pub use friction::*;
pub use gravity::*;
pub use repel::*;
pub use wind::*;

use daub_config::{BrushConfig, DEFAULT_PARTICLE_SIZE, StepKind};
use glam::Vec3;
use rand::rngs::StdRng;
use surface::SurfaceIndex;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::grid::NeighborGrid;
use crate::source::SourceInput;
use crate::store::ParticleStore;

/// Read-only inputs shared by all steps during one tick.
#[derive(Debug, Clone, Copy)]
pub struct SimulationData<'a> {
    /// Seconds covered by this tick
    pub timestep: f32,
    pub surface: &'a SurfaceIndex,
    /// Neighbor grid over the particles as they were at the start of the tick
    pub grid: &'a NeighborGrid,
    pub input: &'a SourceInput,
}

/// Apply `f` to every force with its particle index.
pub(crate) fn for_each_force<F>(forces: &mut [Vec3], f: F)
where
    F: Fn(usize, &mut Vec3) + Send + Sync,
{
    #[cfg(feature = "parallel")]
    forces
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, force)| f(i, force));
    #[cfg(not(feature = "parallel"))]
    forces
        .iter_mut()
        .enumerate()
        .for_each(|(i, force)| f(i, force));
}

/// One step of a brush's simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceStep {
    Gravity(GravityStep),
    Drag(DragStep),
    Friction(FrictionStep),
    Repel(RepelStep),
    Wind(WindStep),
    Emitter(EmitterStep),
}

impl ForceStep {
    /// Turn a brush configuration into runnable steps, skipping disabled ones.
    pub fn resolve(brush: &BrushConfig) -> Vec<ForceStep> {
        let reference_size = reference_size(brush);
        brush
            .enabled_steps()
            .map(|kind| match kind {
                StepKind::Gravity(s) => ForceStep::Gravity(GravityStep::new(Vec3::from(s.gravity))),
                StepKind::Drag(s) => {
                    ForceStep::Drag(DragStep::new(s.drag_coefficient, reference_size))
                }
                StepKind::Friction(s) => {
                    ForceStep::Friction(FrictionStep::new(s.friction_coefficient))
                }
                StepKind::Repel(s) => ForceStep::Repel(RepelStep::new(s.repulsion_factor)),
                StepKind::Wind(s) => ForceStep::Wind(WindStep::new(s.strength)),
                StepKind::BrushEmitter(c) => {
                    ForceStep::Emitter(EmitterStep::new(EmitterShape::Brush, c.clone()))
                }
                StepKind::RainEmitter(c) => {
                    ForceStep::Emitter(EmitterStep::new(EmitterShape::Rain, c.clone()))
                }
            })
            .collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForceStep::Gravity(_) => "gravity",
            ForceStep::Drag(_) => "drag",
            ForceStep::Friction(_) => "friction",
            ForceStep::Repel(_) => "repel",
            ForceStep::Wind(_) => "wind",
            ForceStep::Emitter(e) => match e.shape {
                EmitterShape::Brush => "brush_emitter",
                EmitterShape::Rain => "rain_emitter",
            },
        }
    }

    /// Clear per-stroke state.
    pub fn reset(&mut self) {
        if let ForceStep::Emitter(emitter) = self {
            emitter.reset();
        }
    }

    /// Add this step's contribution to `forces` (one per particle) and queue
    /// any emitted particles in `new_particles`.
    pub fn simulate(
        &mut self,
        data: &SimulationData<'_>,
        particles: &ParticleStore,
        forces: &mut [Vec3],
        new_particles: &mut ParticleStore,
        rng: &mut StdRng,
    ) {
        match self {
            ForceStep::Gravity(step) => step.apply(particles, forces),
            ForceStep::Drag(step) => step.apply(particles, forces),
            ForceStep::Friction(step) => step.apply(particles, forces),
            ForceStep::Repel(step) => step.apply(data.grid, data.timestep, particles, forces),
            ForceStep::Wind(step) => step.apply(data.input, forces),
            ForceStep::Emitter(step) => {
                step.emit(data.surface, data.input, data.timestep, rng, new_particles)
            }
        }
    }
}

/// Size drag normalizes against: the first enabled emitter's nominal size.
fn reference_size(brush: &BrushConfig) -> f32 {
    brush
        .enabled_steps()
        .find_map(|kind| match kind {
            StepKind::BrushEmitter(c) | StepKind::RainEmitter(c) => Some(c.particle_size),
            _ => None,
        })
        .unwrap_or(DEFAULT_PARTICLE_SIZE)
}

/// The first emitter in a resolved step list.
pub fn primary_emitter(steps: &[ForceStep]) -> Option<&EmitterStep> {
    steps.iter().find_map(|step| match step {
        ForceStep::Emitter(emitter) => Some(emitter),
        _ => None,
    })
}
