//! Surface queries for particle painting
//!
//! This crate answers "where on this mesh" for the simulation:
//! - [`mesh::MeshSnapshot`] - Positions, triangles and optional normal/UV layers
//! - [`bvh::SurfaceIndex`] - BVH with closest-point and ray queries
//! - [`triangle`] - Per-triangle closest point and Moller-Trumbore intersection
//! - [`aabb::Aabb`] - Bounding boxes used by the hierarchy

pub mod aabb;
pub mod bvh;
pub mod error;
pub mod mesh;
pub mod triangle;

pub use aabb::*;
pub use bvh::*;
pub use error::*;
pub use mesh::*;
pub use triangle::*;
