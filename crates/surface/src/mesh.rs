//! Mesh snapshots handed to the surface index.

use glam::{Vec2, Vec3};

use crate::error::SurfaceError;

/// How a per-triangle-corner attribute (normals, UVs) is stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CornerAttribute<T> {
    /// Layer not present
    #[default]
    None,
    /// One value per vertex, shared by every corner that uses it
    PerVertex(Vec<T>),
    /// Three values per triangle, in triangle order
    PerCorner(Vec<T>),
}

impl<T: Copy> CornerAttribute<T> {
    pub fn is_none(&self) -> bool {
        matches!(self, CornerAttribute::None)
    }

    /// Flatten into three values per triangle.
    pub(crate) fn to_corners(&self, triangles: &[[u32; 3]]) -> Option<Vec<T>> {
        match self {
            CornerAttribute::None => None,
            CornerAttribute::PerCorner(values) => Some(values.clone()),
            CornerAttribute::PerVertex(values) => Some(
                triangles
                    .iter()
                    .flat_map(|tri| tri.iter().map(|&i| values[i as usize]))
                    .collect(),
            ),
        }
    }

    fn check_len(
        &self,
        attribute: &'static str,
        vertex_count: usize,
        triangle_count: usize,
    ) -> Result<(), SurfaceError> {
        let (expected, actual) = match self {
            CornerAttribute::None => return Ok(()),
            CornerAttribute::PerVertex(values) => (vertex_count, values.len()),
            CornerAttribute::PerCorner(values) => (triangle_count * 3, values.len()),
        };
        if expected != actual {
            return Err(SurfaceError::AttributeLength {
                attribute,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

/// Immutable copy of the mesh data a stroke paints onto.
#[derive(Debug, Clone, Default)]
pub struct MeshSnapshot {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex index triples
    pub triangles: Vec<[u32; 3]>,
    /// Shading normals; face normals are used when absent
    pub normals: CornerAttribute<Vec3>,
    /// Texture coordinates
    pub uvs: CornerAttribute<Vec2>,
}

impl MeshSnapshot {
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
            normals: CornerAttribute::None,
            uvs: CornerAttribute::None,
        }
    }

    pub fn with_normals(mut self, normals: CornerAttribute<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uvs(mut self, uvs: CornerAttribute<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check the snapshot for structural errors.
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.triangles.is_empty() {
            return Err(SurfaceError::NoTriangles);
        }

        if let Some(vertex) = self.positions.iter().position(|p| !p.is_finite()) {
            return Err(SurfaceError::NonFinitePosition { vertex });
        }

        let vertex_count = self.positions.len();
        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(SurfaceError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }

        let triangle_count = self.triangles.len();
        self.normals
            .check_len("Normal", vertex_count, triangle_count)?;
        self.uvs.check_len("UV", vertex_count, triangle_count)?;
        Ok(())
    }
}
