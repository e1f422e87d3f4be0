use serde::Serialize;

use super::diagnostics::GeomMeshDiagnostics;
use super::{Point3, Vec3};

/// Flat triangle mesh with one normal (and optionally one RGBA color) per vertex.
///
/// Buffers are allocated up front by [`GeomMesh::with_len`] and filled slot by
/// slot through the accessors below, so builders never grow a buffer while
/// they write.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GeomMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<[f64; 4]>>,
    pub indices: Vec<u32>,
}

impl GeomMesh {
    /// Create a mesh from already populated buffers.
    #[must_use]
    pub fn new(positions: Vec<[f64; 3]>, normals: Vec<[f64; 3]>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            colors: None,
            indices,
        }
    }

    /// Create a zero-filled arena sized for `vertex_count` vertices and
    /// `triangle_count` triangles.
    #[must_use]
    pub fn with_len(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; vertex_count],
            normals: vec![[0.0; 3]; vertex_count],
            colors: None,
            indices: vec![0; triangle_count * 3],
        }
    }

    /// Assign one color to every vertex.
    #[must_use]
    pub fn with_uniform_color(mut self, color: [f64; 4]) -> Self {
        self.colors = Some(vec![color; self.positions.len()]);
        self
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn position_at(&self, slot: usize) -> Point3 {
        let [x, y, z] = vector_at(&self.positions, slot);
        Point3::new(x, y, z)
    }

    #[must_use]
    pub fn normal_at(&self, slot: usize) -> Vec3 {
        Vec3::from_array(vector_at(&self.normals, slot))
    }

    pub fn set_position(&mut self, slot: usize, position: Point3) {
        set_vector(&mut self.positions, slot, position.to_array());
    }

    pub fn set_normal(&mut self, slot: usize, normal: Vec3) {
        set_vector(&mut self.normals, slot, normal.to_array());
    }

    /// Returns the three vertex indices of triangle `slot`.
    #[must_use]
    pub fn triangle_at(&self, slot: usize) -> [u32; 3] {
        let base = slot * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    pub fn set_triangle(&mut self, slot: usize, triangle: [u32; 3]) {
        let base = slot * 3;
        self.indices[base..base + 3].copy_from_slice(&triangle);
    }

    /// Returns true if any vertex position or normal contains NaN or Inf values.
    #[must_use]
    pub fn has_invalid_vertices(&self) -> bool {
        self.positions
            .iter()
            .chain(self.normals.iter())
            .any(|p| !p[0].is_finite() || !p[1].is_finite() || !p[2].is_finite())
    }

    /// Returns true if all vertex indices are within bounds.
    #[must_use]
    pub fn has_valid_indices(&self) -> bool {
        let n = self.positions.len();
        self.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Returns true if indices represent a triangle list.
    #[must_use]
    pub fn has_triangle_indices(&self) -> bool {
        self.indices.len() % 3 == 0
    }

    /// Returns true if the optional vertex attribute buffers match `positions.len()`.
    #[must_use]
    pub fn has_valid_attribute_lengths(&self) -> bool {
        let n = self.positions.len();
        self.normals.len() == n && self.colors.as_ref().map_or(true, |colors| colors.len() == n)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.has_triangle_indices() {
            return Err("mesh indices are not a triangle list (len % 3 != 0)".to_string());
        }
        if self.has_invalid_vertices() {
            return Err("mesh has invalid vertex coordinates (NaN/Inf)".to_string());
        }
        if !self.has_valid_indices() {
            return Err("mesh has out-of-bounds vertex indices".to_string());
        }
        if !self.has_valid_attribute_lengths() {
            return Err("mesh attribute buffers do not match vertex count".to_string());
        }
        Ok(())
    }

    /// Returns the position buffer as a flat slice: `[x0, y0, z0, x1, y1, z1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    /// Returns the normal buffer as a flat slice: `[nx0, ny0, nz0, ...]`.
    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    /// Counts the mesh and flags zero-area triangles.
    #[must_use]
    pub fn diagnostics(&self) -> GeomMeshDiagnostics {
        let mut diagnostics = GeomMeshDiagnostics {
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            ..GeomMeshDiagnostics::default()
        };

        for slot in 0..self.triangle_count() {
            let [a, b, c] = self.triangle_at(slot);
            if a as usize >= self.positions.len()
                || b as usize >= self.positions.len()
                || c as usize >= self.positions.len()
            {
                continue;
            }
            let pa = self.position_at(a as usize);
            let e1 = self.position_at(b as usize) - pa;
            let e2 = self.position_at(c as usize) - pa;
            if e1.cross(e2).length_squared() <= f64::EPSILON {
                diagnostics.degenerate_triangle_count += 1;
            }
        }

        if diagnostics.degenerate_triangle_count > 0 {
            diagnostics.add_warning(format!(
                "mesh has {} zero-area triangles",
                diagnostics.degenerate_triangle_count
            ));
        }

        diagnostics
    }
}

/// Reads the vector stored at `slot`.
#[must_use]
pub fn vector_at(buffer: &[[f64; 3]], slot: usize) -> [f64; 3] {
    buffer[slot]
}

/// Overwrites the vector stored at `slot`.
pub fn set_vector(buffer: &mut [[f64; 3]], slot: usize, value: [f64; 3]) {
    buffer[slot] = value;
}
