use std::f64::consts::{FRAC_PI_2, PI};

use crate::geometry::{BoundingBox, Point};

/// The one rotation primitive shared by every transform in the pipeline:
/// x' = (x−cx)·cosθ − (y−cy)·sinθ + cx, y' = (y−cy)·cosθ + (x−cx)·sinθ + cy.
/// Passing −θ inverts it.
pub fn rotate_point(point: Point, center: Point, angle: f64) -> Point {
    let (sin_a, cos_a) = angle.sin_cos();
    let dx = point.0 - center.0;
    let dy = point.1 - center.1;
    (
        dx * cos_a - dy * sin_a + center.0,
        dy * cos_a + dx * sin_a + center.1,
    )
}

pub fn rotate_points(points: &[Point], center: Point, angle: f64) -> Vec<Point> {
    points
        .iter()
        .map(|&p| rotate_point(p, center, angle))
        .collect()
}

pub fn rotate_rectangle_corners(corners: &[Point; 4], center: Point, angle: f64) -> [Point; 4] {
    corners.map(|p| rotate_point(p, center, angle))
}

/// Fold an angle in (−π, π] into (−π/2, π/2] by shifting a half turn.
pub fn horizontal_angle(angle: f64) -> f64 {
    if angle > FRAC_PI_2 && angle <= PI {
        angle - PI
    } else if angle > -PI && angle < -FRAC_PI_2 {
        angle + PI
    } else {
        angle
    }
}

/// Of a box's orientation and its perpendicular, whichever folded angle is
/// closer to horizontal. This is the derotation angle for a text line.
pub fn get_smaller_angle(bbox: &BoundingBox) -> f64 {
    let (ux, uy) = bbox.unit_vector;
    let angle = horizontal_angle(bbox.unit_vector_angle);
    let orthogonal = horizontal_angle(ux.atan2(-uy));
    if angle.abs() < orthogonal.abs() {
        angle
    } else {
        orthogonal
    }
}
