//! Per-tick brush input supplied by the host.

use bitflags::bitflags;
use glam::Vec3;
use serde::{Deserialize, Serialize};

bitflags! {
    /// What the user is currently doing with the brush.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interactions: u32 {
        const EMIT_PARTICLES = 1 << 0;
    }
}

impl Default for Interactions {
    fn default() -> Self {
        Self::empty()
    }
}

/// Orthonormal frame at the brush: where it is and which way it looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Vec3,
    /// Unit view direction
    pub direction: Vec3,
    pub up: Vec3,
    /// `direction x up`
    pub right: Vec3,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

impl Frame {
    /// Build a frame around `direction`, using world Z as the up hint.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self::with_up(origin, direction, Vec3::Z)
    }

    /// Build a frame around `direction`, orthogonalizing `up_hint` against it.
    ///
    /// A zero direction falls back to -Z; an up hint parallel to the
    /// direction falls back to world Y.
    pub fn with_up(origin: Vec3, direction: Vec3, up_hint: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec3::NEG_Z);
        let up = orthogonal_part(up_hint, direction)
            .or_else(|| orthogonal_part(Vec3::Y, direction))
            .unwrap_or(Vec3::X);
        let right = direction.cross(up);
        Self {
            origin,
            direction,
            up,
            right,
        }
    }
}

fn orthogonal_part(v: Vec3, axis: Vec3) -> Option<Vec3> {
    (v - axis * v.dot(axis)).try_normalize()
}

/// Brush state for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceInput {
    pub frame: Frame,
    /// Frame captured when the stroke began
    pub start_frame: Frame,
    /// Brush radius in world units
    pub radius: f32,
    /// Pen pressure in `0..=1`
    pub pressure: f32,
    pub interactions: Interactions,
    /// Base RGB color for emitted particles
    pub color: Vec3,
}

impl Default for SourceInput {
    fn default() -> Self {
        Self::new(Frame::default(), 1.0, 1.0, Interactions::empty(), Vec3::ONE)
    }
}

impl SourceInput {
    pub fn new(
        frame: Frame,
        radius: f32,
        pressure: f32,
        interactions: Interactions,
        color: Vec3,
    ) -> Self {
        Self {
            frame,
            start_frame: frame,
            radius: radius.max(0.0),
            pressure: pressure.clamp(0.0, 1.0),
            interactions,
            color: color.clamp(Vec3::ZERO, Vec3::ONE),
        }
    }

    /// Take everything from `next` except the stroke's start frame.
    pub fn update(&mut self, next: SourceInput) {
        let start_frame = self.start_frame;
        *self = next;
        self.start_frame = start_frame;
    }

    /// Begin a new stroke at the current frame.
    pub fn restart(&mut self) {
        self.start_frame = self.frame;
    }

    pub fn is_emitting(&self) -> bool {
        self.interactions.contains(Interactions::EMIT_PARTICLES) && self.pressure > 0.0
    }
}
