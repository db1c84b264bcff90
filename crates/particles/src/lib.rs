//! Surface-constrained particle simulation for painting onto meshes
//!
//! Particles are emitted from a brush (or rain over the whole mesh), pushed
//! around by a configurable list of force steps and kept glued to the
//! surface after every integration step:
//! - [`controller::SimulationController`] - Stroke lifecycle and the tick loop
//! - [`store::ParticleStore`] - Column storage for live particles
//! - [`grid::NeighborGrid`] - Spatial hash used for particle interactions
//! - [`steps::ForceStep`] - Gravity, drag, friction, repulsion, wind and emitters
//! - [`integrator::Integrator`] - Sub-stepped improved Euler integration
//! - [`render::ParticleView`] - Read-only columns for the renderer
//!
//! Enable the `parallel` feature to spread per-particle work over rayon.

pub mod color;
pub mod controller;
pub mod error;
pub mod grid;
pub mod integrator;
pub mod render;
pub mod source;
pub mod steps;
pub mod store;

pub use controller::*;
pub use error::*;
pub use grid::{NeighborGrid, Neighbors};
pub use integrator::*;
pub use render::*;
pub use source::*;
pub use steps::{ForceStep, SimulationData};
pub use store::*;
