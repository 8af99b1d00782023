//! Path Flattening
//!
//! Replaces every cubic Bezier triple in a path with a polyline
//! approximation. The flattener subdivides with de Casteljau midpoints
//! until the control points sit within a quarter pixel of the chord.

use crate::path::{Path, PointType};
use crate::Point;

/// Flattening tolerance (in pixels)
const BEZIER_TOLERANCE: f64 = 0.25;

// ============================================================================
// Cubic Flattener
// ============================================================================

/// Flatten a single cubic into a polyline. The result always starts with
/// `p0` and contains at least two points.
pub fn flatten_cubic(p0: Point, p1: Point, p2: Point, p3: Point) -> Vec<Point> {
    let mut out = vec![p0];
    subdivide(&mut out, p0, p1, p2, p3);
    out
}

fn subdivide(out: &mut Vec<Point>, p0: Point, p1: Point, p2: Point, p3: Point) {
    let dx = (p3.x - p0.x) as i64;
    let dy = (p3.y - p0.y) as i64;
    let len_sq = (dx * dx + dy * dy) as f64;

    if len_sq < 1.0 {
        // Very short curve, a single segment will do
        out.push(p3);
        return;
    }

    // Perpendicular distance of the control points from the chord
    let d1 = ((p1.x - p0.x) as i64 * dy - (p1.y - p0.y) as i64 * dx).abs() as f64;
    let d2 = ((p2.x - p0.x) as i64 * dy - (p2.y - p0.y) as i64 * dx).abs() as f64;
    let max_dist = d1.max(d2) / len_sq.sqrt();

    if max_dist <= BEZIER_TOLERANCE {
        out.push(p3);
    } else {
        let p01 = midpoint(p0, p1);
        let p12 = midpoint(p1, p2);
        let p23 = midpoint(p2, p3);
        let p012 = midpoint(p01, p12);
        let p123 = midpoint(p12, p23);
        let p0123 = midpoint(p012, p123);

        subdivide(out, p0, p01, p012, p0123);
        subdivide(out, p0123, p123, p23, p3);
    }
}

fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2, (p1.y + p2.y) / 2)
}

// ============================================================================
// Path Flattening
// ============================================================================

/// Copy a path, replacing every Bezier triple with line segments. A close
/// flag on the triple's last entry moves to the last emitted line.
pub fn flatten_path(path: &Path) -> Option<Path> {
    let mut new_path = Path::new();

    let points = path.points();
    let tags = path.tags();
    let mut i = 0;

    while i < points.len() {
        let base = tags[i] & !PointType::CLOSEFIGURE;

        if base == PointType::MOVETO || base == PointType::LINETO {
            if !new_path.add_entry(points[i], tags[i]) {
                return None;
            }
        } else if base == PointType::BEZIERTO {
            // A Bezier entry always sits at position i with the cubic in
            // points[i-1..=i+2]
            if i == 0 || i + 2 >= points.len() {
                log::error!("malformed bezier run at entry {}", i);
                return None;
            }

            let flat = flatten_cubic(points[i - 1], points[i], points[i + 1], points[i + 2]);
            // the first point equals the entry already in the buffer
            if new_path.add_points(&flat[1..], PointType::LINETO).is_none() {
                return None;
            }
            if tags[i + 2].contains(PointType::CLOSEFIGURE) {
                new_path.close_figure();
            }
            i += 2;
        } else {
            log::error!("unexpected tag {:?} at entry {}", tags[i], i);
            return None;
        }

        i += 1;
    }

    Some(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{PathDriver, RecordCtx};
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_cubic_is_one_segment() {
        let flat = flatten_cubic(
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(20, 0),
            Point::new(30, 0),
        );
        assert_eq!(flat, vec![Point::new(0, 0), Point::new(30, 0)]);
    }

    #[test]
    fn curved_cubic_subdivides() {
        let flat = flatten_cubic(
            Point::new(0, 0),
            Point::new(0, 100),
            Point::new(100, 100),
            Point::new(100, 0),
        );
        assert!(flat.len() > 2);
        assert_eq!(*flat.first().unwrap(), Point::new(0, 0));
        assert_eq!(*flat.last().unwrap(), Point::new(100, 0));
        // every interior point stays inside the control hull
        for p in &flat {
            assert!(p.x >= 0 && p.x <= 100);
            assert!(p.y >= 0 && p.y <= 100);
        }
    }

    #[test]
    fn flattened_path_has_no_beziers_and_keeps_close() {
        let mut rec = PathDriver::new(Point::new(0, 0));
        let ctx = RecordCtx::identity();
        rec.move_to(&ctx, 0, 0);
        rec.poly_bezier_to(
            &ctx,
            &[Point::new(0, 50), Point::new(50, 50), Point::new(50, 0)],
        );
        rec.close_figure();

        let flat = flatten_path(&rec.path).unwrap();
        assert!(flat
            .tags()
            .iter()
            .all(|t| *t & !PointType::CLOSEFIGURE != PointType::BEZIERTO));
        assert_eq!(flat.tags()[0], PointType::MOVETO);
        assert!(flat.tags().last().unwrap().contains(PointType::CLOSEFIGURE));
        assert_eq!(*flat.points().last().unwrap(), Point::new(50, 0));
    }

    #[test]
    fn moves_and_lines_copy_verbatim() {
        let mut rec = PathDriver::new(Point::new(0, 0));
        let ctx = RecordCtx::identity();
        rec.move_to(&ctx, 1, 1);
        rec.line_to(&ctx, 2, 2);
        rec.line_to(&ctx, 3, 1);
        rec.close_figure();

        let flat = flatten_path(&rec.path).unwrap();
        assert_eq!(flat.points(), rec.path.points());
        assert_eq!(flat.tags(), rec.path.tags());
    }
}
