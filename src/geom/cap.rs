//! Flat backplate ("cap") meshes.

use thiserror::Error;

use super::mesh::GeomMesh;
use super::polygon::Polygon;
use super::triangulation::{PolygonTriangulator, TriangulationError};
use super::Vec3;

/// Per-vertex color of the cap: white, fully transparent alpha channel.
pub const CAP_VERTEX_COLOR: [f64; 4] = [1.0, 1.0, 1.0, 0.0];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapError {
    #[error("triangle index list is empty")]
    Empty,
    #[error("triangle index list is invalid: {0}")]
    InvalidIndices(String),
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

/// Lifts `polygon` to z = 0 and pairs it with a triangle list computed for
/// [`Polygon::flatten`].
///
/// Emits exactly one vertex per outline and hole point, in flattening order,
/// each with normal +z and [`CAP_VERTEX_COLOR`]. `indices` is used unchanged.
pub fn build_cap_mesh(polygon: &Polygon, indices: Vec<u32>) -> Result<GeomMesh, CapError> {
    if indices.is_empty() {
        return Err(CapError::Empty);
    }
    if indices.len() % 3 != 0 {
        return Err(CapError::InvalidIndices(format!(
            "{} indices is not a whole number of triangles",
            indices.len()
        )));
    }

    let vertex_count = polygon.point_count();
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(CapError::InvalidIndices(format!(
            "index {bad} out of range for {vertex_count} vertices"
        )));
    }

    let mut mesh = GeomMesh::with_len(vertex_count, 0);
    for (slot, point) in polygon.points().enumerate() {
        mesh.set_position(slot, point.at_z(0.0));
        mesh.set_normal(slot, Vec3::Z);
    }
    mesh.indices = indices;

    Ok(mesh.with_uniform_color(CAP_VERTEX_COLOR))
}

/// Flattens and triangulates `polygon`, then builds its cap.
pub fn build_cap(
    polygon: &Polygon,
    triangulator: &dyn PolygonTriangulator,
) -> Result<GeomMesh, CapError> {
    let flat = polygon.flatten();
    let indices = triangulator.triangulate(&flat.coords, &flat.hole_offsets)?;
    build_cap_mesh(polygon, indices)
}
