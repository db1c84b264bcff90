//! Stroke lifecycle and the per-tick simulation loop.
//!
//! A tick runs, in order: force steps (emission included) → integration →
//! append new particles → re-projection → culling → neighbor grid rebuild.

use std::sync::Arc;

use daub_config::SimulationSettings;
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use surface::{MeshSnapshot, SurfaceIndex};
use tracing::{debug, error, info, trace, warn};

use crate::error::SimulationError;
use crate::grid::{MIN_VOXEL_SIZE, NeighborGrid};
use crate::integrator::Integrator;
use crate::render::ParticleView;
use crate::source::{Interactions, SourceInput};
use crate::steps::{ForceStep, SimulationData, primary_emitter};
use crate::store::ParticleStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No stroke in progress. Particles left over from the last stroke may
    /// still be settling.
    #[default]
    Idle,
    /// The user is holding the brush down.
    Interacting,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TickReport {
    /// Timestep actually integrated, after clamping
    pub timestep: f32,
    /// Particles created this tick
    pub emitted: usize,
    /// Particles removed this tick, including dropped ones
    pub culled: usize,
    /// Particles that lost the surface during re-projection
    pub dropped: usize,
    /// Particles alive after the tick
    pub alive: usize,
}

/// Owns the particles and drives them through strokes.
///
/// The host calls [`tick`](Self::tick) from a periodic timer for as long
/// as [`is_running`](Self::is_running) reports true. Ticks must not overlap.
#[derive(Debug)]
pub struct SimulationController {
    /// Settings for the next stroke
    settings: SimulationSettings,
    /// Settings captured when the current stroke began
    active: SimulationSettings,
    state: ControllerState,
    /// Surface of the current stroke, kept until its particles are gone
    surface: Option<Arc<SurfaceIndex>>,
    steps: Vec<ForceStep>,
    integrator: Integrator,
    particles: ParticleStore,
    /// Particles emitted during the current tick
    new_particles: ParticleStore,
    forces: Vec<Vec3>,
    grid: NeighborGrid,
    input: SourceInput,
    rng: StdRng,
    /// Nominal size used for the voxel size before any particle exists
    nominal_size: f32,
    size_age_factor: f32,
    total_emitted: u64,
    /// Whether this stroke already warned about particles losing the surface
    drop_reported: bool,
}

impl SimulationController {
    pub fn new(settings: SimulationSettings) -> Result<Self, SimulationError> {
        settings.validate()?;
        let grid = NeighborGrid::new(settings.physics.neighbor_table_size);
        let rng = StdRng::seed_from_u64(settings.seed());
        let integrator = Integrator::new(settings.physics.sub_steps());
        Ok(Self {
            active: settings.clone(),
            settings,
            state: ControllerState::Idle,
            surface: None,
            steps: Vec::new(),
            integrator,
            particles: ParticleStore::new(),
            new_particles: ParticleStore::new(),
            forces: Vec::new(),
            grid,
            input: SourceInput::default(),
            rng,
            nominal_size: daub_config::DEFAULT_PARTICLE_SIZE,
            size_age_factor: 1.0,
            total_emitted: 0,
            drop_reported: false,
        })
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Replace the settings. They take effect at the next stroke; a stroke
    /// in progress, and its settling afterwards, keeps the old ones.
    pub fn set_settings(&mut self, settings: SimulationSettings) -> Result<(), SimulationError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Whether ticks still have work to do.
    pub fn is_running(&self) -> bool {
        self.state == ControllerState::Interacting || !self.particles.is_empty()
    }

    pub fn particles(&self) -> &ParticleStore {
        &self.particles
    }

    /// Columns for the renderer.
    pub fn view(&self) -> ParticleView<'_> {
        ParticleView::new(&self.particles, self.size_age_factor)
    }

    pub fn surface(&self) -> Option<&Arc<SurfaceIndex>> {
        self.surface.as_ref()
    }

    pub fn input(&self) -> &SourceInput {
        &self.input
    }

    pub fn steps(&self) -> &[ForceStep] {
        &self.steps
    }

    pub fn grid(&self) -> &NeighborGrid {
        &self.grid
    }

    /// Particles emitted since the controller was created.
    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }

    /// Start a stroke on `surface`. Any particles from an earlier stroke
    /// are discarded.
    pub fn begin_stroke(&mut self, surface: Arc<SurfaceIndex>, mut input: SourceInput) {
        input.restart();

        self.active = self.settings.clone();
        if self.active.physics.neighbor_table_size != self.grid.table_size() {
            self.grid = NeighborGrid::new(self.active.physics.neighbor_table_size);
        }
        self.steps = ForceStep::resolve(&self.active.brush);
        for step in &mut self.steps {
            step.reset();
        }
        match primary_emitter(&self.steps) {
            Some(emitter) => {
                let creation = &emitter.creation;
                self.nominal_size = creation.particle_size;
                self.size_age_factor = creation.particle_size_age_factor;
            }
            None => {
                self.nominal_size = daub_config::DEFAULT_PARTICLE_SIZE;
                self.size_age_factor = 1.0;
            }
        }

        self.integrator = Integrator::new(self.active.physics.sub_steps());
        self.rng = StdRng::seed_from_u64(self.active.seed());
        self.particles.clear();
        self.new_particles.clear();
        self.grid.clear();
        self.input = input;
        self.surface = Some(surface);
        self.state = ControllerState::Interacting;
        self.drop_reported = false;

        info!(
            "Stroke started with brush '{}': {} steps",
            self.active.brush.name,
            self.steps.len()
        );
    }

    /// Build a surface index from `mesh` and start a stroke on it.
    ///
    /// Structural mesh errors are logged once and returned; the controller
    /// stays idle.
    pub fn begin_stroke_with_mesh(
        &mut self,
        mesh: MeshSnapshot,
        input: SourceInput,
    ) -> Result<(), SimulationError> {
        let surface = SurfaceIndex::build(mesh).map_err(|e| {
            error!("Cannot start stroke: {}", e);
            SimulationError::from(e)
        })?;
        self.begin_stroke(Arc::new(surface), input);
        Ok(())
    }

    /// Refresh the brush input. The stroke's start frame is kept.
    pub fn update_input(&mut self, input: SourceInput) {
        if self.state == ControllerState::Interacting {
            self.input.update(input);
        }
    }

    /// Stop interacting. With `stop_on_release` the particles vanish at
    /// once; otherwise they keep moving until they die.
    pub fn end_stroke(&mut self) {
        if self.state == ControllerState::Idle {
            return;
        }
        self.state = ControllerState::Idle;
        self.input.interactions = Interactions::empty();

        if self.active.stop_on_release {
            self.particles.clear();
            self.grid.clear();
        }
        if self.particles.is_empty() {
            self.surface = None;
        }
        info!(
            "Stroke ended: {} particles settling, {} emitted so far",
            self.particles.len(),
            self.total_emitted
        );
    }

    /// Abandon the stroke and everything it produced.
    pub fn cancel_stroke(&mut self) {
        self.state = ControllerState::Idle;
        self.input.interactions = Interactions::empty();
        self.particles.clear();
        self.new_particles.clear();
        self.grid.clear();
        self.surface = None;
        debug!("Stroke cancelled");
    }

    /// Voxel size for the neighbor grid: the average particle size, grown
    /// by the size-over-age factor when particles get bigger with age.
    pub fn voxel_size(&self) -> f32 {
        let base = self.particles.average_size().unwrap_or(self.nominal_size);
        (base * self.size_age_factor.max(1.0)).max(MIN_VOXEL_SIZE)
    }

    /// Advance the simulation by `dt` seconds, clamped to the configured
    /// maximum timestep.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let Some(surface) = self.surface.clone() else {
            return TickReport::default();
        };
        if !self.is_running() {
            return TickReport::default();
        }

        let timestep = if dt.is_finite() {
            dt.clamp(0.0, self.active.physics.max_time_step)
        } else {
            0.0
        };

        self.forces.clear();
        self.forces.resize(self.particles.len(), Vec3::ZERO);
        self.new_particles.clear();

        let data = SimulationData {
            timestep,
            surface: &surface,
            grid: &self.grid,
            input: &self.input,
        };
        for step in &mut self.steps {
            step.simulate(
                &data,
                &self.particles,
                &mut self.forces,
                &mut self.new_particles,
                &mut self.rng,
            );
            trace!("Step {} done", step.name());
        }

        self.integrator
            .integrate(&mut self.particles, &self.forces, timestep);

        let emitted = self.new_particles.len();
        self.particles.append(&mut self.new_particles);
        self.total_emitted += emitted as u64;

        let dropped = Integrator::reproject(&mut self.particles, &surface);
        let culled = self.particles.remove_dead();
        if dropped > 0 && !self.drop_reported {
            warn!("{} particles lost the surface and were removed", dropped);
            self.drop_reported = true;
        }

        let voxel_size = self.voxel_size();
        self.grid.build(self.particles.locations(), voxel_size);

        let report = TickReport {
            timestep,
            emitted,
            culled,
            dropped,
            alive: self.particles.len(),
        };
        debug!(
            "Tick {:.4}s: {} alive, {} emitted, {} culled ({} dropped), voxel {:.4}",
            timestep, report.alive, emitted, culled, dropped, voxel_size
        );

        if self.state == ControllerState::Idle && self.particles.is_empty() {
            self.surface = None;
            info!("All particles settled");
        }
        report
    }
}
