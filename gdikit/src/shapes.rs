//! Primitive Shapes
//!
//! Shape recorders built on the path recorder: rectangles, rounded
//! rectangles, and the arc family (arc, arc-to, chord, pie, ellipse,
//! angle-arc). Arcs are approximated with one cubic Bezier spline per
//! quadrant; arc endpoints are transformed in floating point so integer
//! snapping does not disturb the computed angles.

use crate::dc::ArcDirection;
use crate::path::{Path, PathDriver, PointType, RecordCtx};
use crate::xform::GraphicsMode;
use crate::{gdi_round, FloatPoint, Point};
use core::f64::consts::{FRAC_PI_2, PI};

// ============================================================================
// Arc Variants
// ============================================================================

/// What the arc emission does besides the curve itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcOp {
    /// Bare arc
    Arc,
    /// Arc starting from the current position (line-joined)
    ArcTo,
    /// Close the figure over the arc endpoints
    Chord,
    /// Close the figure through the ellipse centre
    Pie,
}

// ============================================================================
// Corner Normalisation
// ============================================================================

/// Transform two rectangle corners to device coordinates, order them
/// top-left / bottom-right, and apply the compatible-mode exclusive-edge
/// rule (bottom and right edges are not part of the shape).
pub(crate) fn check_corners(
    ctx: &RecordCtx,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
) -> [Point; 2] {
    let mut corners = [Point::new(x1, y1), Point::new(x2, y2)];
    corners[0] = ctx.to_device.transform(corners[0]);
    corners[1] = ctx.to_device.transform(corners[1]);

    if corners[0].x > corners[1].x {
        let temp = corners[0].x;
        corners[0].x = corners[1].x;
        corners[1].x = temp;
    }
    if corners[0].y > corners[1].y {
        let temp = corners[0].y;
        corners[0].y = corners[1].y;
        corners[1].y = temp;
    }

    if ctx.graphics_mode == GraphicsMode::Compatible {
        corners[1].x -= 1;
        corners[1].y -= 1;
    }

    corners
}

// ============================================================================
// Normalized Arc Geometry
// ============================================================================

/// Scale a unit-circle point into the box whose corners are given;
/// (-1, -1) maps to `corners[0]`, (1, 1) to `corners[1]`
pub(crate) fn scale_normalized_point(corners: &[FloatPoint; 2], x: f64, y: f64) -> Point {
    Point::new(
        gdi_round(corners[0].x + (corners[1].x - corners[0].x) * 0.5 * (x + 1.0)),
        gdi_round(corners[0].y + (corners[1].y - corners[0].y) * 0.5 * (y + 1.0)),
    )
}

/// Normalize a point with respect to the box whose corners are given
fn normalize_point(corners: &[FloatPoint; 2], point: &FloatPoint) -> (f64, f64) {
    (
        (point.x - corners[0].x) / (corners[1].x - corners[0].x) * 2.0 - 1.0,
        (point.y - corners[0].y) / (corners[1].y - corners[0].y) * 2.0 - 1.0,
    )
}

/// Append a Bezier spline corresponding to part of an arc. The angles must
/// span a quarter circle at most. When `start_type` is given, an entry of
/// that type is emitted for the first control point; otherwise the current
/// position is assumed to already be the first control point.
pub(crate) fn do_arc_part(
    path: &mut Path,
    corners: &[FloatPoint; 2],
    angle_start: f64,
    angle_end: f64,
    start_type: Option<PointType>,
) -> bool {
    debug_assert!((angle_end - angle_start).abs() <= FRAC_PI_2 + 1e-9);

    let half_angle = (angle_end - angle_start) / 2.0;
    let mut x_norm = [0.0f64; 4];
    let mut y_norm = [0.0f64; 4];

    if half_angle.abs() > 1e-8 {
        // Control-point offset for a cubic approximating the sweep
        let a = 4.0 / 3.0 * (1.0 - half_angle.cos()) / half_angle.sin();
        x_norm[0] = angle_start.cos();
        y_norm[0] = angle_start.sin();
        x_norm[1] = x_norm[0] - a * y_norm[0];
        y_norm[1] = y_norm[0] + a * x_norm[0];
        x_norm[3] = angle_end.cos();
        y_norm[3] = angle_end.sin();
        x_norm[2] = x_norm[3] + a * y_norm[3];
        y_norm[2] = y_norm[3] - a * x_norm[3];
    } else {
        for i in 0..4 {
            x_norm[i] = angle_start.cos();
            y_norm[i] = angle_start.sin();
        }
    }

    let start = if start_type.is_some() { 0 } else { 1 };
    let mut points = [Point::new(0, 0); 4];
    for i in start..4 {
        points[i] = scale_normalized_point(corners, x_norm[i], y_norm[i]);
    }

    let first = match path.add_points(&points[start..], PointType::BEZIERTO) {
        Some(first) => first,
        None => return false,
    };
    if let Some(tag) = start_type {
        path.tags[first] = tag;
    }
    true
}

// ============================================================================
// Shape Recorders
// ============================================================================

impl PathDriver {
    /// Record a rectangle: four line entries, the first marked MOVETO and
    /// the last closing the figure
    pub fn rectangle(&mut self, ctx: &RecordCtx, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        let corners = check_corners(ctx, x1, y1, x2, y2);

        let points = [
            Point::new(corners[1].x, corners[0].y),
            corners[0],
            Point::new(corners[0].x, corners[1].y),
            corners[1],
        ];

        let first = match self.path.add_points(&points, PointType::LINETO) {
            Some(first) => first,
            None => return false,
        };
        self.path.tags[first] = PointType::MOVETO;
        self.path.tags[first + 3] |= PointType::CLOSEFIGURE;
        true
    }

    /// Record a rounded rectangle: four quarter arcs joined by straight
    /// sides, closed. The side endpoints are rounded with the same rule as
    /// the arc extremes so the joins coincide exactly.
    pub fn round_rect(
        &mut self,
        ctx: &RecordCtx,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        ell_width: i32,
        ell_height: i32,
    ) -> bool {
        let corners = check_corners(ctx, x1, y1, x2, y2);
        let (left, top) = (corners[0].x as f64, corners[0].y as f64);
        let (right, bottom) = (corners[1].x as f64, corners[1].y as f64);
        let (ew, eh) = (ell_width as f64, ell_height as f64);

        // Top-right quarter
        let mut ell = [
            FloatPoint::new(right - ew, top),
            FloatPoint::new(right, top + eh),
        ];
        if !do_arc_part(&mut self.path, &ell, 0.0, -FRAC_PI_2, Some(PointType::MOVETO)) {
            return false;
        }
        let pt = Point::new(gdi_round(left + ew / 2.0), corners[0].y);
        if !self.path.add_entry(pt, PointType::LINETO) {
            return false;
        }

        // Top-left quarter
        ell[0].x = left;
        ell[1].x = left + ew;
        if !do_arc_part(&mut self.path, &ell, -FRAC_PI_2, -PI, None) {
            return false;
        }
        let pt = Point::new(corners[0].x, gdi_round(bottom - eh / 2.0));
        if !self.path.add_entry(pt, PointType::LINETO) {
            return false;
        }

        // Bottom-left quarter
        ell[0].y = bottom - eh;
        ell[1].y = bottom;
        if !do_arc_part(&mut self.path, &ell, PI, FRAC_PI_2, None) {
            return false;
        }
        let pt = Point::new(gdi_round(right - ew / 2.0), corners[1].y);
        if !self.path.add_entry(pt, PointType::LINETO) {
            return false;
        }

        // Bottom-right quarter; the closing edge supplies the right side
        ell[0].x = right - ew;
        ell[1].x = right;
        if !do_arc_part(&mut self.path, &ell, FRAC_PI_2, 0.0, None) {
            return false;
        }

        self.path.close_figure();
        true
    }

    /// Record an elliptical arc bounded by `(x1,y1)-(x2,y2)` with radial
    /// endpoints through `(xs,ys)` and `(xe,ye)`, one Bezier spline per
    /// quadrant spanned
    #[allow(clippy::too_many_arguments)]
    pub fn arc(
        &mut self,
        ctx: &RecordCtx,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        xs: i32,
        ys: i32,
        xe: i32,
        ye: i32,
        direction: ArcDirection,
        op: ArcOp,
    ) -> bool {
        // Zero width or height: nothing to emit
        if x1 == x2 || y1 == y2 {
            return true;
        }

        // Transform in floating point to preserve angular precision
        let mut corners = [
            FloatPoint::new(x1 as f64, y1 as f64),
            FloatPoint::new(x2 as f64, y2 as f64),
        ];
        let mut point_start = [FloatPoint::new(xs as f64, ys as f64)];
        let mut point_end = [FloatPoint::new(xe as f64, ye as f64)];

        let float_transform = |pts: &mut [FloatPoint]| {
            for p in pts.iter_mut() {
                let (x, y) = ctx.to_device.transform_point(p.x, p.y);
                p.x = x;
                p.y = y;
            }
        };
        float_transform(&mut corners);
        float_transform(&mut point_start);
        float_transform(&mut point_end);

        // Order corners top-left / bottom-right
        if corners[0].x > corners[1].x {
            let temp = corners[0].x;
            corners[0].x = corners[1].x;
            corners[1].x = temp;
        }
        if corners[0].y > corners[1].y {
            let temp = corners[0].y;
            corners[0].y = corners[1].y;
            corners[1].y = temp;
        }

        // Compute start and end angle
        let (x, y) = normalize_point(&corners, &point_start[0]);
        let angle_start = y.atan2(x);
        let (x, y) = normalize_point(&corners, &point_end[0]);
        let mut angle_end = y.atan2(x);

        // Make sure the end angle lies on the correct side of the start
        if direction == ArcDirection::Clockwise {
            if angle_end <= angle_start {
                angle_end += 2.0 * PI;
            }
        } else if angle_end >= angle_start {
            angle_end -= 2.0 * PI;
        }

        // Compatible mode excludes the bottom and right edges; applied
        // after the angle computation
        if ctx.graphics_mode == GraphicsMode::Compatible {
            corners[1].x -= 1.0;
            corners[1].y -= 1.0;
        }

        // Arc-to joins the arc onto the current stroke
        if op == ArcOp::ArcTo && !self.start_new_stroke() {
            return false;
        }

        // One Bezier spline per quadrant the arc spans
        let clockwise = direction == ArcDirection::Clockwise;
        let mut start = true;
        let mut quad_start;
        let mut quad_end = 0.0f64;
        loop {
            if start {
                quad_start = angle_start;
                quad_end = if clockwise {
                    ((angle_start / FRAC_PI_2).floor() + 1.0) * FRAC_PI_2
                } else {
                    ((angle_start / FRAC_PI_2).ceil() - 1.0) * FRAC_PI_2
                };
            } else {
                quad_start = quad_end;
                if clockwise {
                    quad_end += FRAC_PI_2;
                } else {
                    quad_end -= FRAC_PI_2;
                }
            }

            // Final piece: clamp to the end angle
            let mut last = false;
            if (clockwise && angle_end <= quad_end) || (!clockwise && angle_end >= quad_end) {
                quad_end = angle_end;
                last = true;
            }

            let entry_type = if start {
                Some(if op == ArcOp::ArcTo { PointType::LINETO } else { PointType::MOVETO })
            } else {
                None
            };
            if !do_arc_part(&mut self.path, &corners, quad_start, quad_end, entry_type) {
                return false;
            }
            start = false;
            if last {
                break;
            }
        }

        // Chord closes the figure; pie closes it through the centre
        match op {
            ArcOp::ArcTo => self.path.update_pos(),
            ArcOp::Chord => self.path.close_figure(),
            ArcOp::Pie => {
                let centre = Point::new(
                    ((corners[0].x + corners[1].x) / 2.0) as i32,
                    ((corners[0].y + corners[1].y) / 2.0) as i32,
                );
                if !self
                    .path
                    .add_entry(centre, PointType::LINETO | PointType::CLOSEFIGURE)
                {
                    return false;
                }
            }
            ArcOp::Arc => {}
        }
        true
    }

    /// Record an ellipse as a full closed arc starting and ending at the
    /// leftmost point
    pub fn ellipse(
        &mut self,
        ctx: &RecordCtx,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        direction: ArcDirection,
    ) -> bool {
        self.arc(
            ctx,
            x1,
            y1,
            x2,
            y2,
            x1,
            (y1 + y2) / 2,
            x1,
            (y1 + y2) / 2,
            direction,
            ArcOp::Chord,
        )
    }

    /// Record a circular arc from a centre, radius, and start/sweep angles
    /// in degrees, joined onto the current stroke
    pub fn angle_arc(
        &mut self,
        ctx: &RecordCtx,
        x: i32,
        y: i32,
        radius: i32,
        start_angle: f64,
        sweep_angle: f64,
    ) -> bool {
        let r = radius as f64;
        let x1 = gdi_round(x as f64 + (start_angle * PI / 180.0).cos() * r);
        let y1 = gdi_round(y as f64 - (start_angle * PI / 180.0).sin() * r);
        let end = (start_angle + sweep_angle) * PI / 180.0;
        let x2 = gdi_round(x as f64 + end.cos() * r);
        let y2 = gdi_round(y as f64 - end.sin() * r);

        let direction = if sweep_angle >= 0.0 {
            ArcDirection::CounterClockwise
        } else {
            ArcDirection::Clockwise
        };
        self.arc(
            ctx,
            x - radius,
            y - radius,
            x + radius,
            y + radius,
            x1,
            y1,
            x2,
            y2,
            direction,
            ArcOp::ArcTo,
        )
    }
}
