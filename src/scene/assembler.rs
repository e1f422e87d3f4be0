//! Turns descriptor groups into cap and trim meshes in the scene.

use serde::{Deserialize, Serialize};

use super::material::{Color, Material};
use super::node::{NodeId, Transform};
use super::{SceneError, SceneGraph};
use crate::geom::{
    GeomMesh, GeomMeshDiagnostics, Point2, Polygon, PolygonTriangulator, TRIM_HEIGHT, Tolerance,
    build_cap, extrude_perimeter,
};
use crate::parse::{GroupDescriptor, RejectedEntry};
use crate::warning::SimWarning;

/// Height at which groups float in front of the background.
pub const GROUP_Z_OFFSET: f64 = 0.01;

/// Look of the generated trim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimStyle {
    /// Extrusion height of outline and hole bands.
    pub height: f64,
    /// Vertex and material color of the bands.
    pub trim_color: Color,
    /// Cap color; the default is fully transparent white.
    pub cap_color: Color,
}

impl Default for TrimStyle {
    fn default() -> Self {
        Self {
            height: TRIM_HEIGHT,
            trim_color: Color::rgb(0.78, 0.79, 0.8),
            cap_color: Color::new(1.0, 1.0, 1.0, 0.0),
        }
    }
}

/// What one assembly pass produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    pub group_count: usize,
    pub cap_count: usize,
    pub extrusion_count: usize,
    #[serde(skip)]
    pub diagnostics: GeomMeshDiagnostics,
    pub warnings: Vec<SimWarning>,
}

impl AssemblyReport {
    /// Record and log a warning.
    pub fn warn(&mut self, warning: SimWarning) {
        log::warn!("{warning}");
        self.diagnostics.add_warning(warning.to_string());
        self.warnings.push(warning);
    }

    fn record_mesh(&mut self, mesh: &GeomMesh) {
        self.diagnostics.merge(&mesh.diagnostics());
    }
}

/// Builds the geometry of each group: one cap and one band per outline, one
/// band per hole.
pub struct GeometryAssembler<'a> {
    triangulator: &'a dyn PolygonTriangulator,
    style: TrimStyle,
    tolerance: Tolerance,
}

impl<'a> GeometryAssembler<'a> {
    #[must_use]
    pub fn new(triangulator: &'a dyn PolygonTriangulator) -> Self {
        Self {
            triangulator,
            style: TrimStyle::default(),
            tolerance: Tolerance::default_geom(),
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: TrimStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Assemble every group under `parent`.
    ///
    /// Returns the nodes of the placed groups in descriptor order. Geometry
    /// problems only add warnings; errors come from the scene graph itself.
    pub fn assemble<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        parent: NodeId,
        groups: &[GroupDescriptor],
        report: &mut AssemblyReport,
    ) -> Result<Vec<NodeId>, SceneError> {
        let mut nodes = Vec::with_capacity(groups.len());
        for (index, group) in groups.iter().enumerate() {
            if let Some(node) = self.assemble_group(scene, parent, index, group, report)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    /// Create `group_<index>` and its trim geometry.
    ///
    /// A group without a finite position is skipped and yields `None`.
    pub fn assemble_group<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        parent: NodeId,
        index: usize,
        group: &GroupDescriptor,
        report: &mut AssemblyReport,
    ) -> Result<Option<NodeId>, SceneError> {
        if !group.pos.is_finite() {
            report.warn(SimWarning::MalformedGroup {
                group: index,
                reason: "skipped, position is not finite".to_owned(),
            });
            return Ok(None);
        }

        let node = scene.create_node(&format!("group_{index}"), Some(parent))?;
        scene.set_transform(
            node,
            Transform::from_translation(group.pos.x, group.pos.y, GROUP_Z_OFFSET),
        )?;
        report.group_count += 1;

        for entry in &group.rejected {
            if let RejectedEntry::Trim { reason } = entry {
                report.warn(SimWarning::MalformedGroup {
                    group: index,
                    reason: format!("trim skipped, {reason}"),
                });
            }
        }

        match &group.alu {
            Some(alu) if !alu.points().all(|p| p.is_finite()) => {
                report.warn(SimWarning::MalformedGroup {
                    group: index,
                    reason: "trim skipped, it contains non-finite points".to_owned(),
                });
            }
            Some(alu) => self.assemble_trim(scene, node, index, alu, report)?,
            None => {}
        }
        Ok(Some(node))
    }

    fn assemble_trim<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        group_node: NodeId,
        group: usize,
        alu: &Polygon,
        report: &mut AssemblyReport,
    ) -> Result<(), SceneError> {
        let cleaned = alu.cleaned(self.tolerance);
        if cleaned.outline.len() < 3 {
            report.diagnostics.skipped_loop_count += 1 + cleaned.holes.len();
            report.warn(SimWarning::DegenerateLoop {
                group,
                hole: None,
                points: cleaned.outline.len(),
            });
            return Ok(());
        }

        let mut holes: Vec<(usize, Vec<Point2>)> = Vec::with_capacity(cleaned.holes.len());
        for (hole, points) in cleaned.holes.into_iter().enumerate() {
            if points.len() < 3 {
                report.diagnostics.skipped_loop_count += 1;
                report.warn(SimWarning::DegenerateLoop {
                    group,
                    hole: Some(hole),
                    points: points.len(),
                });
            } else {
                holes.push((hole, points));
            }
        }

        let region = Polygon::new(
            cleaned.outline,
            holes.iter().map(|(_, points)| points.clone()).collect(),
        );

        match build_cap(&region, self.triangulator) {
            Ok(mesh) => {
                report.record_mesh(&mesh);
                let node = scene.create_node(&format!("group_{group}_cap"), Some(group_node))?;
                scene.attach_mesh(node, mesh, Material::diffuse(self.style.cap_color))?;
                report.cap_count += 1;
            }
            Err(err) => report.warn(SimWarning::TriangulationFailure {
                group,
                reason: err.to_string(),
            }),
        }

        self.attach_band(scene, group_node, group, None, &region.outline, report)?;
        for (hole, points) in &holes {
            self.attach_band(scene, group_node, group, Some(*hole), points, report)?;
        }
        Ok(())
    }

    fn attach_band<S: SceneGraph + ?Sized>(
        &self,
        scene: &mut S,
        group_node: NodeId,
        group: usize,
        hole: Option<usize>,
        points: &[Point2],
        report: &mut AssemblyReport,
    ) -> Result<(), SceneError> {
        let mesh = match extrude_perimeter(points, self.style.height) {
            Ok(mesh) => mesh.with_uniform_color(self.style.trim_color.to_rgba()),
            Err(err) => {
                report.diagnostics.skipped_loop_count += 1;
                report.warn(SimWarning::ExtrusionFailed {
                    group,
                    hole,
                    reason: err.to_string(),
                });
                return Ok(());
            }
        };

        let name = match hole {
            Some(hole) => format!("group_{group}_hole_{hole}"),
            None => format!("group_{group}_trim"),
        };
        report.record_mesh(&mesh);
        let node = scene.create_node(&name, Some(group_node))?;
        scene.attach_mesh(node, mesh, Material::diffuse(self.style.trim_color))?;
        report.extrusion_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{EarClipTriangulator, TriangulationError};
    use crate::scene::{Renderable, SceneTree};

    struct RefusingTriangulator;

    impl PolygonTriangulator for RefusingTriangulator {
        fn triangulate(
            &self,
            _coords: &[f64],
            _hole_offsets: &[usize],
        ) -> Result<Vec<u32>, TriangulationError> {
            Ok(Vec::new())
        }
    }

    fn square(min: f64, max: f64) -> Vec<Point2> {
        vec![
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ]
    }

    fn group(alu: Option<Polygon>) -> GroupDescriptor {
        GroupDescriptor::new(Point2::new(1.0, 2.0), alu, Vec::new())
    }

    fn mesh_of<'t>(scene: &'t SceneTree, name: &str) -> &'t GeomMesh {
        let id = scene.find_by_name(name).unwrap();
        match scene.node(id).unwrap().renderable.as_ref().unwrap() {
            Renderable::Mesh { mesh, .. } => mesh,
            Renderable::Primitive { .. } => panic!("{name} is not a mesh"),
        }
    }

    #[test]
    fn group_with_hole_gets_cap_trim_and_hole_band() {
        let mut outline = square(0.0, 4.0);
        outline.push(outline[0]);
        let polygon = Polygon::new(outline, vec![square(1.0, 2.0)]);

        let mut scene = SceneTree::new();
        let root = scene.root();
        let mut report = AssemblyReport::default();
        let triangulator = EarClipTriangulator::default();
        let nodes = GeometryAssembler::new(&triangulator)
            .assemble(&mut scene, root, &[group(Some(polygon))], &mut report)
            .unwrap();

        let group_node = scene.node(nodes[0]).unwrap();
        assert_eq!(group_node.name, "group_0");
        assert_eq!(group_node.transform.translation, [1.0, 2.0, GROUP_Z_OFFSET]);
        assert_eq!(group_node.children.len(), 3);

        assert_eq!(mesh_of(&scene, "group_0_cap").vertex_count(), 8);
        assert_eq!(mesh_of(&scene, "group_0_trim").vertex_count(), 8 * 4);
        let hole = mesh_of(&scene, "group_0_hole_0");
        assert_eq!(hole.vertex_count(), 8 * 4);
        let trim_rgba = TrimStyle::default().trim_color.to_rgba();
        assert!(hole.colors.as_ref().unwrap().iter().all(|c| *c == trim_rgba));

        assert_eq!(report.cap_count, 1);
        assert_eq!(report.extrusion_count, 2);
        assert!(report.warnings.is_empty());
        assert_eq!(report.diagnostics.vertex_count, 8 + 32 + 32);
    }

    #[test]
    fn triangulation_failure_still_extrudes() {
        let polygon = Polygon::new(square(0.0, 1.0), Vec::new());
        let mut scene = SceneTree::new();
        let root = scene.root();
        let mut report = AssemblyReport::default();
        GeometryAssembler::new(&RefusingTriangulator)
            .assemble(&mut scene, root, &[group(Some(polygon))], &mut report)
            .unwrap();

        assert!(scene.find_by_name("group_0_cap").is_none());
        assert!(scene.find_by_name("group_0_trim").is_some());
        assert_eq!(report.cap_count, 0);
        assert_eq!(report.extrusion_count, 1);
        assert!(matches!(
            report.warnings.as_slice(),
            [SimWarning::TriangulationFailure { group: 0, .. }]
        ));
    }

    #[test]
    fn degenerate_loops_are_skipped_per_group() {
        let flat = Polygon::new(
            vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 0.0)],
            Vec::new(),
        );
        let short_hole = Polygon::new(
            square(0.0, 3.0),
            vec![vec![Point2::new(1.0, 1.0), Point2::new(2.0, 1.0)]],
        );

        let mut scene = SceneTree::new();
        let root = scene.root();
        let mut report = AssemblyReport::default();
        let triangulator = EarClipTriangulator::default();
        GeometryAssembler::new(&triangulator)
            .assemble(
                &mut scene,
                root,
                &[group(Some(flat)), group(Some(short_hole)), group(None)],
                &mut report,
            )
            .unwrap();

        assert_eq!(report.group_count, 3);
        assert!(scene.find_by_name("group_0_trim").is_none());
        assert!(scene.find_by_name("group_0_cap").is_none());
        assert!(scene.find_by_name("group_1_cap").is_some());
        assert!(scene.find_by_name("group_1_trim").is_some());
        assert!(scene.find_by_name("group_1_hole_0").is_none());
        assert!(scene.find_by_name("group_2").is_some());
        assert_eq!(
            report.warnings,
            vec![
                SimWarning::DegenerateLoop {
                    group: 0,
                    hole: None,
                    points: 2
                },
                SimWarning::DegenerateLoop {
                    group: 1,
                    hole: Some(0),
                    points: 2
                },
            ]
        );
        assert_eq!(report.diagnostics.skipped_loop_count, 2);
    }

    #[test]
    fn non_finite_groups_and_trims_are_skipped_alone() {
        let mut lost = group(None);
        lost.pos = Point2::new(f64::NAN, 0.0);
        let broken_trim = group(Some(Polygon::new(
            vec![Point2::new(0.0, 0.0), Point2::new(f64::INFINITY, 0.0), Point2::new(0.0, 1.0)],
            Vec::new(),
        )));
        let fine = group(Some(Polygon::new(square(0.0, 1.0), Vec::new())));

        let mut scene = SceneTree::new();
        let root = scene.root();
        let mut report = AssemblyReport::default();
        let triangulator = EarClipTriangulator::default();
        let nodes = GeometryAssembler::new(&triangulator)
            .assemble(&mut scene, root, &[lost, broken_trim, fine], &mut report)
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(report.group_count, 2);
        assert!(scene.find_by_name("group_0").is_none());
        assert!(scene.find_by_name("group_1").is_some());
        assert!(scene.find_by_name("group_1_trim").is_none());
        assert!(scene.find_by_name("group_2_trim").is_some());
        assert!(matches!(
            report.warnings.as_slice(),
            [
                SimWarning::MalformedGroup { group: 0, .. },
                SimWarning::MalformedGroup { group: 1, .. },
            ]
        ));
    }
}
