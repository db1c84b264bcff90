//! Shared configuration for the daub particle painter
//!
//! This crate holds the serde-backed settings a host hands to the
//! simulation at stroke start:
//! - [`settings::SimulationSettings`] - Physics, release behavior and seed
//! - [`brush::BrushConfig`] - The ordered list of simulation steps for a brush
//! - [`creation::CreationSettings`] - Per-emitter particle creation parameters
//!
//! Vectors are plain `[f32; N]` arrays so hosts need no math dependency.

pub mod brush;
pub mod creation;
pub mod error;
pub mod settings;

pub use brush::*;
pub use creation::*;
pub use error::*;
pub use settings::*;
