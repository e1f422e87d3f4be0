//! Mesh diagnostics for the sign geometry builders.
//!
//! Every builder that emits a [`GeomMesh`](super::GeomMesh) can report how
//! many vertices and triangles it produced and whether anything looked off.
//! The assembler merges the per-mesh diagnostics of a whole sign so the
//! loader can log a one-line summary.
//!
//! # Example
//!
//! ```ignore
//! use signsim_engine::geom::{extrude_perimeter, Point2, TRIM_HEIGHT};
//!
//! let mesh = extrude_perimeter(&loop_points, TRIM_HEIGHT)?;
//! let diagnostics = mesh.diagnostics();
//! if !diagnostics.is_clean() {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("Warning: {}", warning);
//!     }
//! }
//! ```

use std::fmt;

/// Counts and warnings collected while building meshes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeomMeshDiagnostics {
    /// Total number of vertices in the final mesh.
    pub vertex_count: usize,

    /// Total number of triangles in the final mesh.
    pub triangle_count: usize,

    /// Number of zero-area triangles found.
    ///
    /// These come from collinear outline points that survived cleaning; they
    /// render as nothing but are kept so the buffers stay the expected size.
    pub degenerate_triangle_count: usize,

    /// Number of loops (outlines or holes) that were skipped.
    pub skipped_loop_count: usize,

    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl GeomMeshDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no issues were detected.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degenerate_triangle_count == 0
            && self.skipped_loop_count == 0
            && self.warnings.is_empty()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Merges another diagnostics struct into this one.
    ///
    /// Counts are summed and warnings are appended.
    pub fn merge(&mut self, other: &GeomMeshDiagnostics) {
        self.vertex_count += other.vertex_count;
        self.triangle_count += other.triangle_count;
        self.degenerate_triangle_count += other.degenerate_triangle_count;
        self.skipped_loop_count += other.skipped_loop_count;
        self.warnings.extend(other.warnings.iter().cloned());
    }

    /// Returns a short summary string suitable for logging.
    ///
    /// Format: `"V:{vertices} T:{triangles} [issues...]"`
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("V:{} T:{}", self.vertex_count, self.triangle_count)];

        if self.degenerate_triangle_count > 0 {
            parts.push(format!("degenerate:{}", self.degenerate_triangle_count));
        }
        if self.skipped_loop_count > 0 {
            parts.push(format!("skipped-loops:{}", self.skipped_loop_count));
        }
        if !self.warnings.is_empty() {
            parts.push(format!("warnings:{}", self.warnings.len()));
        }

        parts.join(" ")
    }
}

impl fmt::Display for GeomMeshDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mesh Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;

        if self.degenerate_triangle_count > 0 {
            writeln!(f, "  Degenerate triangles: {}", self.degenerate_triangle_count)?;
        }
        if self.skipped_loop_count > 0 {
            writeln!(f, "  Skipped loops: {}", self.skipped_loop_count)?;
        }

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {}", warning)?;
            }
        }

        let status = if self.is_clean() { "CLEAN" } else { "ISSUES DETECTED" };
        writeln!(f, "  Status: {}", status)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let diag = GeomMeshDiagnostics::default();
        assert!(diag.is_clean());
        assert!(!diag.has_warnings());
    }

    #[test]
    fn test_merge() {
        let mut diag1 = GeomMeshDiagnostics {
            vertex_count: 32,
            triangle_count: 16,
            warnings: vec!["first warning".to_string()],
            ..Default::default()
        };

        let diag2 = GeomMeshDiagnostics {
            vertex_count: 4,
            triangle_count: 2,
            skipped_loop_count: 1,
            warnings: vec!["second warning".to_string()],
            ..Default::default()
        };

        diag1.merge(&diag2);

        assert_eq!(diag1.vertex_count, 36);
        assert_eq!(diag1.triangle_count, 18);
        assert_eq!(diag1.skipped_loop_count, 1);
        assert_eq!(diag1.warnings.len(), 2);
        assert!(!diag1.is_clean());
    }

    #[test]
    fn test_summary() {
        let diag = GeomMeshDiagnostics {
            vertex_count: 100,
            triangle_count: 50,
            degenerate_triangle_count: 2,
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("V:100"));
        assert!(summary.contains("T:50"));
        assert!(summary.contains("degenerate:2"));
    }

    #[test]
    fn test_display() {
        let diag = GeomMeshDiagnostics {
            vertex_count: 100,
            triangle_count: 50,
            warnings: vec!["test warning".to_string()],
            ..Default::default()
        };

        let output = format!("{}", diag);
        assert!(output.contains("Vertices: 100"));
        assert!(output.contains("Triangles: 50"));
        assert!(output.contains("test warning"));
        assert!(output.contains("ISSUES DETECTED"));
    }
}
