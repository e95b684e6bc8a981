//! Plane geometry shared by the zone and thermal analyzers.

use crate::parser::pcb_schema::{BoundingBox, Point};

/// Ray-casting point-in-polygon test.
///
/// The `(yi > y) != (yj > y)` half-open test keeps horizontal edges from
/// being counted twice at shared vertices.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[Point]) -> bool {
    let n = polygon.len();
    let mut inside = false;

    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (xi, yi) = (polygon[i].x, polygon[i].y);
        let (xj, yj) = (polygon[j].x, polygon[j].y);

        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Shoelace polygon area: absolute value of the signed area, so vertex
/// order does not matter. Fewer than 3 vertices is degenerate and yields 0.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y;
        sum -= points[j].x * points[i].y;
    }

    (sum / 2.0).abs()
}

/// Axis-aligned bounding box of a vertex list; `None` when empty.
pub fn bounding_box(points: &[Point]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bb = BoundingBox {
        min_x: first.x,
        max_x: first.x,
        min_y: first.y,
        max_y: first.y,
    };

    for p in points {
        bb.min_x = bb.min_x.min(p.x);
        bb.max_x = bb.max_x.max(p.x);
        bb.min_y = bb.min_y.min(p.y);
        bb.max_y = bb.max_y.max(p.y);
    }

    Some(bb)
}

/// Round to `decimals` fractional digits, matching the JSON output
/// precision downstream consumers expect.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_point_inside_square() {
        assert!(point_in_polygon(5.0, 5.0, &square()));
    }

    #[test]
    fn test_point_outside_square() {
        assert!(!point_in_polygon(15.0, 5.0, &square()));
        assert!(!point_in_polygon(5.0, -1.0, &square()));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        // L-shape; (7, 7) is in the notch, outside the copper.
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(2.0, 8.0, &poly));
        assert!(!point_in_polygon(7.0, 7.0, &poly));
    }

    #[test]
    fn test_unit_square_area() {
        let unit = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        assert!((polygon_area(&unit) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_invariant_under_rotation_and_reversal() {
        let mut poly = square();
        let base = polygon_area(&poly);

        poly.rotate_left(2);
        assert!((polygon_area(&poly) - base).abs() < 1e-12);

        poly.reverse();
        assert!((polygon_area(&poly) - base).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_polygon_area_is_zero() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(
            polygon_area(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]),
            0.0
        );
    }

    #[test]
    fn test_bounding_box() {
        let bb = bounding_box(&square()).unwrap();
        assert_eq!((bb.min_x, bb.max_x, bb.min_y, bb.max_y), (0.0, 10.0, 0.0, 10.0));
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(25.3456, 2), 25.35);
        assert_eq!(round_to(0.19999999, 3), 0.2);
    }
}
