use super::mesh::GeomMesh;
use super::{Point2, Vec3};

/// Height of the trim band above the backplate, in meters.
pub const TRIM_HEIGHT: f64 = 0.15;

/// Vertices written per loop edge: 4 corners for each of the two faces.
pub const VERTICES_PER_EDGE: usize = 8;
/// Triangles written per loop edge: 2 per face.
pub const TRIANGLES_PER_EDGE: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ExtrusionError {
    #[error("extrusion height must be finite and non-zero")]
    InvalidHeight,
    #[error("loop points must be finite")]
    NonFinitePoint,
    #[error("loop requires at least {min} points, got {count}")]
    NotEnoughPoints { min: usize, count: usize },
    #[error("loop edge {index} has zero length")]
    DegenerateEdge { index: usize },
}

/// Builds the trim band for one closed loop.
///
/// For every edge `(current, next)`, wrapping from the last point to the
/// first, eight vertices are written at base slot `8 * edge`:
///
/// | slot | outward face   | slot | inward face    |
/// |------|----------------|------|----------------|
/// | +0   | current, z = 0 | +4   | current, z = 0 |
/// | +1   | current, z = h | +5   | current, z = h |
/// | +2   | next, z = 0    | +6   | next, z = 0    |
/// | +3   | next, z = h    | +7   | next, z = h    |
///
/// The outward face is wound `(0, 1, 3)`, `(0, 3, 2)` and its normal is
/// `cross(outer_current - inner_current, inner_next - outer_current)`, which
/// for positive `height` is the left-hand normal `(-dy, dx, 0) / |d|` of the
/// edge direction `d`. That side faces away from the enclosed area when the
/// loop runs clockwise and into it when the loop runs counter-clockwise. The
/// inward face reuses the same corner layout with reversed triangles and the
/// exact negation of the outward normal, so both sides of the band render.
pub fn extrude_perimeter(points: &[Point2], height: f64) -> Result<GeomMesh, ExtrusionError> {
    if !height.is_finite() || height == 0.0 {
        return Err(ExtrusionError::InvalidHeight);
    }
    if points.iter().any(|p| !p.is_finite()) {
        return Err(ExtrusionError::NonFinitePoint);
    }

    let n = points.len();
    if n < 3 {
        return Err(ExtrusionError::NotEnoughPoints { min: 3, count: n });
    }

    let mut mesh = GeomMesh::with_len(n * VERTICES_PER_EDGE, n * TRIANGLES_PER_EDGE);

    for edge in 0..n {
        let current = points[edge];
        let next = points[(edge + 1) % n];

        let inner_current = current.at_z(0.0);
        let outer_current = current.at_z(height);
        let inner_next = next.at_z(0.0);
        let outer_next = next.at_z(height);

        let normal = (outer_current - inner_current)
            .cross(inner_next - outer_current)
            .normalized()
            .ok_or(ExtrusionError::DegenerateEdge { index: edge })?;

        let corners = [inner_current, outer_current, inner_next, outer_next];
        let outward = edge * VERTICES_PER_EDGE;
        let inward = outward + 4;

        for (offset, corner) in corners.into_iter().enumerate() {
            mesh.set_position(outward + offset, corner);
            mesh.set_normal(outward + offset, normal);
            mesh.set_position(inward + offset, corner);
            mesh.set_normal(inward + offset, -normal);
        }

        let tri = edge * TRIANGLES_PER_EDGE;
        let (o, i) = (outward as u32, inward as u32);
        mesh.set_triangle(tri, [o, o + 1, o + 3]);
        mesh.set_triangle(tri + 1, [o, o + 3, o + 2]);
        mesh.set_triangle(tri + 2, [i + 3, i + 1, i]);
        mesh.set_triangle(tri + 3, [i + 2, i + 3, i]);
    }

    Ok(mesh)
}

/// The outward normal written for `edge` of a mesh built by
/// [`extrude_perimeter`].
#[must_use]
pub fn outward_normal(mesh: &GeomMesh, edge: usize) -> Vec3 {
    mesh.normal_at(edge * VERTICES_PER_EDGE)
}

/// The inward normal written for `edge` of a mesh built by
/// [`extrude_perimeter`].
#[must_use]
pub fn inward_normal(mesh: &GeomMesh, edge: usize) -> Vec3 {
    mesh.normal_at(edge * VERTICES_PER_EDGE + 4)
}
