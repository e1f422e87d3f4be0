use serde::{Deserialize, Serialize};

use super::{Point2, Tolerance};

/// Outline with optional cutouts, as drawn on the sign's backplate.
///
/// Loops are implicitly closed (last point connects back to the first) and
/// may be wound either way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub outline: Vec<Point2>,
    #[serde(default)]
    pub holes: Vec<Vec<Point2>>,
}

/// Polygon coordinates packed the way triangulators consume them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlattenedPolygon {
    /// `[x0, y0, x1, y1, ...]`, outline first, then each hole in order.
    pub coords: Vec<f64>,
    /// Point index (not coordinate index) of each hole's first point.
    pub hole_offsets: Vec<usize>,
}

impl FlattenedPolygon {
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.coords.len() / 2
    }
}

impl Polygon {
    #[must_use]
    pub fn new(outline: Vec<Point2>, holes: Vec<Vec<Point2>>) -> Self {
        Self { outline, holes }
    }

    /// Number of points across the outline and every hole.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.outline.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }

    /// Iterates the outline points followed by every hole's points.
    pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
        self.outline
            .iter()
            .chain(self.holes.iter().flatten())
            .copied()
    }

    /// Packs the outline and holes into one coordinate list.
    ///
    /// The point order here is the vertex order of the cap mesh; triangle
    /// indices returned for these coordinates are valid for the cap as-is.
    #[must_use]
    pub fn flatten(&self) -> FlattenedPolygon {
        let mut coords = Vec::with_capacity(self.point_count() * 2);
        let mut hole_offsets = Vec::with_capacity(self.holes.len());

        for p in &self.outline {
            coords.extend_from_slice(&[p.x, p.y]);
        }
        let mut cursor = self.outline.len();
        for hole in &self.holes {
            hole_offsets.push(cursor);
            for p in hole {
                coords.extend_from_slice(&[p.x, p.y]);
            }
            cursor += hole.len();
        }

        FlattenedPolygon { coords, hole_offsets }
    }

    /// Returns a copy with repeated consecutive points and a repeated closing
    /// point removed from every loop.
    #[must_use]
    pub fn cleaned(&self, tol: Tolerance) -> Self {
        Self {
            outline: clean_loop(&self.outline, tol),
            holes: self.holes.iter().map(|hole| clean_loop(hole, tol)).collect(),
        }
    }

    /// Even-odd containment test against the outline minus holes.
    #[must_use]
    pub fn contains(&self, p: Point2) -> bool {
        point_in_loop(&self.outline, p) && !self.holes.iter().any(|hole| point_in_loop(hole, p))
    }
}

/// Drops consecutive duplicates and a closing point equal to the first one.
#[must_use]
pub fn clean_loop(points: &[Point2], tol: Tolerance) -> Vec<Point2> {
    let mut cleaned: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points.iter().copied() {
        if cleaned
            .last()
            .copied()
            .is_some_and(|prev| tol.approx_eq_point2(prev, p))
        {
            continue;
        }
        cleaned.push(p);
    }

    if cleaned.len() > 1 {
        if let (Some(first), Some(last)) = (cleaned.first().copied(), cleaned.last().copied()) {
            if tol.approx_eq_point2(first, last) {
                cleaned.pop();
            }
        }
    }

    cleaned
}

/// Shoelace area; positive for counter-clockwise loops.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        area += a.x * b.y - b.x * a.y;
    }
    0.5 * area
}

pub(crate) fn point_in_loop(points: &[Point2], p: Point2) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = points[i];
        let b = points[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Vec<Point2> {
        vec![
            Point2::new(min, min),
            Point2::new(max, min),
            Point2::new(max, max),
            Point2::new(min, max),
        ]
    }

    #[test]
    fn flatten_packs_outline_then_holes() {
        let polygon = Polygon::new(square(0.0, 4.0), vec![square(1.0, 2.0), square(2.5, 3.0)]);
        let flat = polygon.flatten();

        assert_eq!(flat.point_count(), 12);
        assert_eq!(flat.coords.len(), 24);
        assert_eq!(flat.hole_offsets, vec![4, 8]);
        assert_eq!(&flat.coords[8..10], &[1.0, 1.0]);
        assert_eq!(&flat.coords[22..24], &[2.5, 3.0]);
    }

    #[test]
    fn flatten_emits_no_trailing_point() {
        let polygon = Polygon::new(square(0.0, 1.0), Vec::new());
        let flat = polygon.flatten();
        assert_eq!(flat.point_count(), polygon.point_count());
        assert!(flat.hole_offsets.is_empty());
    }

    #[test]
    fn clean_loop_drops_repeats_and_closing_point() {
        let mut points = square(0.0, 1.0);
        points.insert(1, Point2::new(0.0, 0.0));
        points.push(Point2::new(0.0, 0.0));

        let cleaned = clean_loop(&points, Tolerance::default_geom());
        assert_eq!(cleaned, square(0.0, 1.0));
    }

    #[test]
    fn signed_area_tracks_winding() {
        let ccw = square(0.0, 2.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!((signed_area(&ccw) - 4.0).abs() < 1e-12);
        assert!((signed_area(&cw) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn contains_respects_holes() {
        let polygon = Polygon::new(square(0.0, 4.0), vec![square(1.0, 2.0)]);
        assert!(polygon.contains(Point2::new(3.0, 3.0)));
        assert!(!polygon.contains(Point2::new(1.5, 1.5)));
        assert!(!polygon.contains(Point2::new(5.0, 1.0)));
    }
}
