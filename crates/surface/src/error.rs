use thiserror::Error;

/// Structural problems with a mesh snapshot. Any of these means no surface
/// index can be built and the stroke cannot start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Mesh has no triangles")]
    NoTriangles,
    #[error("Triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("{attribute} layer has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Vertex {vertex} has a non-finite position")]
    NonFinitePosition { vertex: usize },
}
