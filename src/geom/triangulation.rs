use thiserror::Error;

use super::polygon::point_in_loop;
use super::{Point2, Tolerance};

/// Errors reported by a [`PolygonTriangulator`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    #[error("polygon needs at least 3 outline points, got {count}")]
    TooFewPoints { count: usize },
    #[error("coordinate list has odd length {len}")]
    OddCoordinateCount { len: usize },
    #[error("triangulation vertices must be finite")]
    NonFinite,
    #[error("hole offset {offset} is out of order or outside {point_count} points")]
    InvalidHoleOffset { offset: usize, point_count: usize },
    #[error("triangulation failed: {0}")]
    Failed(String),
    #[error("triangulation produced no triangles")]
    Empty,
}

/// Triangulates a flat polygon with holes.
///
/// `coords` holds `[x0, y0, x1, y1, ...]` for the outline followed by each
/// hole; `hole_offsets` gives the point index where each hole starts. The
/// returned indices refer to points of that same list and describe triangles
/// wound counter-clockwise, i.e. facing +z.
pub trait PolygonTriangulator {
    fn triangulate(&self, coords: &[f64], hole_offsets: &[usize])
    -> Result<Vec<u32>, TriangulationError>;
}

/// Ear clipping via `earcutr`; holes are bridged into the outline first.
///
/// Triangles whose doubled area does not exceed `tolerance.eps` are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EarClipTriangulator {
    pub tolerance: Tolerance,
}

impl EarClipTriangulator {
    #[must_use]
    pub const fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

/// Delaunay triangulation of all polygon points, keeping the triangles whose
/// centroid falls inside the outline and outside every hole.
///
/// Suited to convex or mildly concave outlines; it does not insert boundary
/// edges, so deep concavities can lose area.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DelaunayTriangulator;

impl PolygonTriangulator for EarClipTriangulator {
    fn triangulate(
        &self,
        coords: &[f64],
        hole_offsets: &[usize],
    ) -> Result<Vec<u32>, TriangulationError> {
        let vertices = unpack_points(coords)?;
        ring_ranges(vertices.len(), hole_offsets)?;

        let raw = earcutr::earcut(coords, hole_offsets, 2)
            .map_err(|err| TriangulationError::Failed(format!("earcut: {err:?}")))?;

        let mut indices = Vec::with_capacity(raw.len());
        for tri in raw.chunks_exact(3) {
            let area2 = orient2d(vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]);
            if area2.abs() <= self.tolerance.eps {
                continue;
            }
            push_ccw(&mut indices, [tri[0], tri[1], tri[2]], area2)?;
        }

        if indices.is_empty() {
            return Err(TriangulationError::Empty);
        }
        Ok(indices)
    }
}

impl PolygonTriangulator for DelaunayTriangulator {
    fn triangulate(
        &self,
        coords: &[f64],
        hole_offsets: &[usize],
    ) -> Result<Vec<u32>, TriangulationError> {
        let vertices = unpack_points(coords)?;
        let rings = ring_ranges(vertices.len(), hole_offsets)?;

        let points: Vec<delaunator::Point> = vertices
            .iter()
            .map(|p| delaunator::Point { x: p.x, y: p.y })
            .collect();
        let triangulation = delaunator::triangulate(&points);

        let outer = &vertices[rings[0].0..rings[0].1];
        let holes: Vec<&[Point2]> = rings[1..]
            .iter()
            .map(|&(begin, end)| &vertices[begin..end])
            .collect();

        let mut indices = Vec::with_capacity(triangulation.triangles.len());
        for tri in triangulation.triangles.chunks_exact(3) {
            let a = vertices[tri[0]];
            let b = vertices[tri[1]];
            let c = vertices[tri[2]];

            let area2 = orient2d(a, b, c);
            if area2.abs() <= f64::EPSILON {
                continue;
            }

            let centroid = Point2::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
            if !point_in_loop(outer, centroid) || holes.iter().any(|hole| point_in_loop(hole, centroid)) {
                continue;
            }

            push_ccw(&mut indices, [tri[0], tri[1], tri[2]], area2)?;
        }

        if indices.is_empty() {
            return Err(TriangulationError::Empty);
        }
        Ok(indices)
    }
}

fn unpack_points(coords: &[f64]) -> Result<Vec<Point2>, TriangulationError> {
    if coords.len() % 2 != 0 {
        return Err(TriangulationError::OddCoordinateCount { len: coords.len() });
    }
    if coords.iter().any(|c| !c.is_finite()) {
        return Err(TriangulationError::NonFinite);
    }
    Ok(coords
        .chunks_exact(2)
        .map(|pair| Point2::new(pair[0], pair[1]))
        .collect())
}

/// Splits `0..point_count` into `[outline, hole_0, hole_1, ...]` ranges.
fn ring_ranges(
    point_count: usize,
    hole_offsets: &[usize],
) -> Result<Vec<(usize, usize)>, TriangulationError> {
    let mut bounds = Vec::with_capacity(hole_offsets.len() + 2);
    bounds.push(0);
    for &offset in hole_offsets {
        let last = bounds.last().copied().unwrap_or(0);
        if offset <= last || offset > point_count {
            return Err(TriangulationError::InvalidHoleOffset { offset, point_count });
        }
        bounds.push(offset);
    }
    bounds.push(point_count);

    let outline_len = bounds[1] - bounds[0];
    if outline_len < 3 {
        return Err(TriangulationError::TooFewPoints { count: outline_len });
    }

    Ok(bounds.windows(2).map(|w| (w[0], w[1])).collect())
}

/// Append `tri` wound counter-clockwise, given its doubled signed area.
fn push_ccw(
    indices: &mut Vec<u32>,
    [a, b, c]: [usize; 3],
    area2: f64,
) -> Result<(), TriangulationError> {
    let index = |i: usize| {
        u32::try_from(i).map_err(|_| TriangulationError::Failed(format!("index {i} exceeds u32")))
    };
    let (a, b, c) = (index(a)?, index(b)?, index(c)?);
    if area2 > 0.0 {
        indices.extend_from_slice(&[a, b, c]);
    } else {
        indices.extend_from_slice(&[a, c, b]);
    }
    Ok(())
}

fn orient2d(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}
