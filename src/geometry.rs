use float_ord::FloatOrd;

use crate::error::{Error, Result};
use crate::rotate::rotate_point;

pub type Point = (f64, f64);

/// Oriented minimum-area rectangle around a point set.
///
/// `corner_points` is materialized from the center, side lengths and angle;
/// its order is unspecified.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub area: f64,
    pub length_parallel: f64,
    pub length_orthogonal: f64,
    pub rectangle_center: Point,
    pub unit_vector: Point,
    pub unit_vector_angle: f64,
    pub corner_points: [Point; 4],
}

impl BoundingBox {
    pub fn new(
        length_parallel: f64,
        length_orthogonal: f64,
        rectangle_center: Point,
        unit_vector: Point,
    ) -> Result<Self> {
        if !(length_parallel > 0.0) {
            return Err(Error::InvalidBox("length_parallel must be positive"));
        }
        if !(length_orthogonal > 0.0) {
            return Err(Error::InvalidBox("length_orthogonal must be positive"));
        }
        let unit_vector_angle = unit_vector.1.atan2(unit_vector.0);
        let corner_points = rectangle_corners(
            rectangle_center,
            length_parallel,
            length_orthogonal,
            unit_vector_angle,
        );
        Ok(BoundingBox {
            area: length_parallel * length_orthogonal,
            length_parallel,
            length_orthogonal,
            rectangle_center,
            unit_vector,
            unit_vector_angle,
            corner_points,
        })
    }

    /// The smaller of the two side lengths.
    pub fn narrow_dimension(&self) -> f64 {
        self.length_parallel.min(self.length_orthogonal)
    }
}

/// Smallest-area oriented rectangle enclosing `points`.
///
/// One candidate rectangle is evaluated per hull edge; ties keep the first
/// candidate in hull-edge order, starting from the lexicographically smallest
/// hull vertex.
pub fn minimum_bounding_box(points: &[Point]) -> Result<BoundingBox> {
    if points.len() <= 2 {
        return Err(Error::InsufficientPoints {
            found: points.len(),
        });
    }
    let hull = convex_hull(points);
    if hull.len() < 3 {
        return Err(Error::DegenerateGeometry);
    }

    let mut best = edge_candidate(&hull, 0);
    for i in 1..hull.len() {
        let candidate = edge_candidate(&hull, i);
        if candidate.area < best.area {
            best = candidate;
        }
    }

    let angle = best.unit_vector.1.atan2(best.unit_vector.0);
    let rectangle_center = to_xy_coordinates(angle, best.center_parallel, best.center_orthogonal);
    BoundingBox::new(
        best.length_parallel,
        best.length_orthogonal,
        rectangle_center,
        best.unit_vector,
    )
}

// Andrew's monotone chain, counter-clockwise, duplicate and collinear points
// dropped. Fewer than 3 output vertices means the input had no area.
pub(crate) fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted: Vec<Point> = points.to_vec();
    sorted.sort_by_key(|&(x, y)| (FloatOrd(x), FloatOrd(y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(sorted.len() + 1);
    for &p in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

struct Candidate {
    area: f64,
    length_parallel: f64,
    length_orthogonal: f64,
    unit_vector: Point,
    center_parallel: f64,
    center_orthogonal: f64,
}

// Rectangle aligned to the hull edge starting at vertex `i`: project every
// hull vertex onto the edge direction and its orthogonal, take the extents.
fn edge_candidate(hull: &[Point], i: usize) -> Candidate {
    let edge_unit = unit_vector(hull[i], hull[(i + 1) % hull.len()]);
    let edge_ortho = orthogonal_vector(edge_unit);

    let parallel: Vec<f64> = hull.iter().map(|&p| dot(edge_unit, p)).collect();
    let orthogonal: Vec<f64> = hull.iter().map(|&p| dot(edge_ortho, p)).collect();
    let min_p = parallel.iter().copied().map(FloatOrd).min().unwrap().0;
    let max_p = parallel.iter().copied().map(FloatOrd).max().unwrap().0;
    let min_o = orthogonal.iter().copied().map(FloatOrd).min().unwrap().0;
    let max_o = orthogonal.iter().copied().map(FloatOrd).max().unwrap().0;

    let length_parallel = max_p - min_p;
    let length_orthogonal = max_o - min_o;
    Candidate {
        area: length_parallel * length_orthogonal,
        length_parallel,
        length_orthogonal,
        unit_vector: edge_unit,
        center_parallel: min_p + length_parallel / 2.0,
        center_orthogonal: min_o + length_orthogonal / 2.0,
    }
}

// Projection-frame coordinates (parallel, orthogonal) back to x/y.
fn to_xy_coordinates(angle: f64, parallel: f64, orthogonal: f64) -> Point {
    let (sin_a, cos_a) = angle.sin_cos();
    (
        parallel * cos_a - orthogonal * sin_a,
        parallel * sin_a + orthogonal * cos_a,
    )
}

fn rectangle_corners(
    center: Point,
    length_parallel: f64,
    length_orthogonal: f64,
    angle: f64,
) -> [Point; 4] {
    let half_p = length_parallel / 2.0;
    let half_o = length_orthogonal / 2.0;
    [
        (half_p, half_o),
        (half_p, -half_o),
        (-half_p, -half_o),
        (-half_p, half_o),
    ]
    .map(|(dx, dy)| rotate_point((center.0 + dx, center.1 + dy), center, angle))
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn unit_vector(from: Point, to: Point) -> Point {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let length = (dx * dx + dy * dy).sqrt();
    (dx / length, dy / length)
}

fn orthogonal_vector(v: Point) -> Point {
    (-v.1, v.0)
}

fn dot(a: Point, b: Point) -> f64 {
    a.0 * b.0 + a.1 * b.1
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn sorted_corners(corners: &[Point]) -> Vec<Point> {
        let mut out = corners.to_vec();
        out.sort_by_key(|&(x, y)| (FloatOrd(x), FloatOrd(y)));
        out
    }

    fn assert_points_eq(actual: &[Point], expected: &[Point]) {
        let actual = sorted_corners(actual);
        let expected = sorted_corners(expected);
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(&expected) {
            assert!(
                (a.0 - e.0).abs() < EPS && (a.1 - e.1).abs() < EPS,
                "{actual:?} != {expected:?}"
            );
        }
    }

    fn shoelace(ring: &[Point]) -> f64 {
        let mut twice_area = 0.0;
        for i in 0..ring.len() {
            let (x0, y0) = ring[i];
            let (x1, y1) = ring[(i + 1) % ring.len()];
            twice_area += x0 * y1 - x1 * y0;
        }
        (twice_area / 2.0).abs()
    }

    #[test]
    fn axis_aligned_square() {
        let points = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (3.0, 7.0)];
        let bbox = minimum_bounding_box(&points).unwrap();

        assert!((bbox.area - 100.0).abs() < EPS);
        assert!((bbox.length_parallel - 10.0).abs() < EPS);
        assert!((bbox.length_orthogonal - 10.0).abs() < EPS);
        assert!(bbox.unit_vector_angle.abs() < EPS);
        assert!((bbox.rectangle_center.0 - 5.0).abs() < EPS);
        assert!((bbox.rectangle_center.1 - 5.0).abs() < EPS);
        assert_points_eq(
            &bbox.corner_points,
            &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
        );
    }

    #[test]
    fn offset_rectangle_center_and_corners() {
        let points = [(2.0, 3.0), (12.0, 3.0), (12.0, 5.0), (2.0, 5.0)];
        let bbox = minimum_bounding_box(&points).unwrap();

        assert!((bbox.area - 20.0).abs() < EPS);
        assert!((bbox.rectangle_center.0 - 7.0).abs() < EPS);
        assert!((bbox.rectangle_center.1 - 4.0).abs() < EPS);
        assert!((bbox.narrow_dimension() - 2.0).abs() < EPS);
        assert_points_eq(&bbox.corner_points, &points);
    }

    #[test]
    fn tilted_square() {
        let points = [(0.0, 0.0), (5.0, 5.0), (10.0, 0.0), (5.0, -5.0)];
        let bbox = minimum_bounding_box(&points).unwrap();

        assert!((bbox.area - 50.0).abs() < EPS);
        assert!((bbox.unit_vector_angle.abs() - std::f64::consts::FRAC_PI_4).abs() < EPS);
        assert_points_eq(&bbox.corner_points, &points);
    }

    #[test]
    fn two_points_rejected() {
        let err = minimum_bounding_box(&[(0.0, 0.0), (5.0, 5.0)]).unwrap_err();
        assert!(matches!(err, Error::InsufficientPoints { found: 2 }));
    }

    #[test]
    fn collinear_points_rejected() {
        let points = [(0.0, 0.0), (5.0, 5.0), (10.0, 10.0), (2.0, 2.0)];
        let err = minimum_bounding_box(&points).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry));
    }

    #[test]
    fn duplicate_points_collapse() {
        let points = [
            (0.0, 0.0),
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (10.0, 10.0),
            (0.0, 10.0),
        ];
        let bbox = minimum_bounding_box(&points).unwrap();
        assert!((bbox.area - 100.0).abs() < EPS);
    }

    #[test]
    fn hull_starts_at_lexicographic_minimum() {
        let hull = convex_hull(&[(4.0, 1.0), (0.0, 3.0), (2.0, -2.0), (5.0, 4.0), (0.0, 0.0)]);
        assert_eq!(hull[0], (0.0, 0.0));
    }

    #[test]
    fn optimal_among_edge_aligned_rectangles() {
        let points = [(0.0, 0.0), (8.0, 2.0), (10.0, 7.0), (3.0, 9.0), (1.0, 4.0)];
        let bbox = minimum_bounding_box(&points).unwrap();
        let hull = convex_hull(&points);

        // Never larger than any hull-edge-aligned rectangle, including the
        // axis-aligned one, and never smaller than the hull itself.
        for i in 0..hull.len() {
            assert!(bbox.area <= edge_candidate(&hull, i).area + EPS);
        }
        assert!(bbox.area + EPS >= shoelace(&hull));

        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let aabb_area = (xs.iter().copied().map(FloatOrd).max().unwrap().0
            - xs.iter().copied().map(FloatOrd).min().unwrap().0)
            * (ys.iter().copied().map(FloatOrd).max().unwrap().0
                - ys.iter().copied().map(FloatOrd).min().unwrap().0);
        assert!(bbox.area <= aabb_area + EPS);
    }

    #[test]
    fn constructor_rejects_flat_boxes() {
        assert!(matches!(
            BoundingBox::new(0.0, 4.0, (0.0, 0.0), (1.0, 0.0)),
            Err(Error::InvalidBox(_))
        ));
        assert!(matches!(
            BoundingBox::new(4.0, -1.0, (0.0, 0.0), (1.0, 0.0)),
            Err(Error::InvalidBox(_))
        ));
    }
}
