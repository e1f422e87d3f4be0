mod cap;
mod core;
mod diagnostics;
mod extrusion;
mod mesh;
mod polygon;
mod triangulation;

pub use cap::{CAP_VERTEX_COLOR, CapError, build_cap, build_cap_mesh};
pub use self::core::{Point2, Point3, Tolerance, Vec3};
pub use diagnostics::GeomMeshDiagnostics;
pub use extrusion::{
    ExtrusionError, TRIANGLES_PER_EDGE, TRIM_HEIGHT, VERTICES_PER_EDGE, extrude_perimeter,
    inward_normal, outward_normal,
};
pub use mesh::{GeomMesh, set_vector, vector_at};
pub use polygon::{FlattenedPolygon, Polygon, clean_loop, signed_area};
pub use triangulation::{
    DelaunayTriangulator, EarClipTriangulator, PolygonTriangulator, TriangulationError,
};
