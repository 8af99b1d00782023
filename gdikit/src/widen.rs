//! Path Widening
//!
//! Converts a flattened path into a closed outline tracing a stroke of the
//! pen's width. Each stroke is offset to both sides of the center line;
//! unclosed stroke ends receive the pen's end cap (round, square, flat)
//! and interior vertices its join (round, bevel, miter with limit
//! downgrade).

use crate::flatten::flatten_path;
use crate::path::{Path, PointType};
use crate::pen::{EndCap, LineJoin, Pen};
use crate::shapes::do_arc_part;
use crate::{round_away, FloatPoint, Point, Status};
use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

// ============================================================================
// Widening
// ============================================================================

/// Widen a path into a stroke outline. Fails on cosmetic pens and on
/// malformed input (a stroke not starting with MOVETO).
pub fn widen_path(path: &Path, pen: &Pen, miter_limit: f64) -> Option<Path> {
    if !pen.is_geometric() {
        crate::set_last_error(Status::CanNotComplete);
        return None;
    }

    let flat = flatten_path(path)?;

    let pen_width = pen.width.max(0);
    let width_in = pen_width / 2;
    let width_out = pen_width - width_in;

    let strokes = split_strokes(&flat)?;

    let mut new_path = Path::new();

    for stroke in &strokes {
        if !widen_stroke(
            &mut new_path,
            stroke,
            width_in as f64,
            width_out as f64,
            pen,
            miter_limit,
        ) {
            return None;
        }
    }

    Some(new_path)
}

/// Partition a flattened path into strokes at MOVETO boundaries
fn split_strokes(flat: &Path) -> Option<Vec<Path>> {
    let mut strokes: Vec<Path> = Vec::new();

    let points = flat.points();
    let tags = flat.tags();

    for i in 0..points.len() {
        let after_close = i == 0 || tags[i - 1].contains(PointType::CLOSEFIGURE);
        if after_close && tags[i] != PointType::MOVETO {
            log::error!(
                "expected MOVETO {}, got {:?}",
                if i == 0 { "as first entry" } else { "after close" },
                tags[i]
            );
            return None;
        }

        let base = tags[i] & !PointType::CLOSEFIGURE;
        if base == PointType::MOVETO {
            strokes.push(Path::new());
        } else if base != PointType::LINETO {
            // Beziers cannot appear after flattening
            log::error!("unexpected tag {:?} in flattened path", tags[i]);
            return None;
        }

        let stroke = strokes.last_mut()?;
        if !stroke.add_entry(points[i], tags[i]) {
            return None;
        }
    }

    Some(strokes)
}

/// Widen a single stroke: build the two parallel offset sub-paths, then
/// append them (the second reversed) as closed figures
fn widen_stroke(
    new_path: &mut Path,
    stroke: &Path,
    width_in: f64,
    width_out: f64,
    pen: &Pen,
    miter_limit: f64,
) -> bool {
    let points = stroke.points();
    let tags = stroke.tags();
    let count = points.len();
    if count == 0 {
        return true;
    }

    let closed = tags[count - 1].contains(PointType::CLOSEFIGURE);
    if !closed && count < 2 {
        // an isolated move carries no ink
        return true;
    }

    let mut up = Path::new();
    let mut down = Path::new();

    for j in 0..count {
        // Ends of an unclosed stroke get the end cap
        if !closed && (j == 0 || j == count - 1) {
            let (xo, yo) = (points[j].x as f64, points[j].y as f64);
            let (xa, ya) = if j == 0 {
                (points[1].x as f64, points[1].y as f64)
            } else {
                (points[j - 1].x as f64, points[j - 1].y as f64)
            };
            let theta = (ya - yo).atan2(xa - xo);

            if !add_end_cap(&mut up, pen.end_cap(), xo, yo, theta, width_in, width_out, j == 0) {
                return false;
            }
            continue;
        }

        // Interior vertex (every vertex, when the stroke is closed)
        let previous = if j > 0 { j - 1 } else { count - 1 };
        let next = if j < count - 1 { j + 1 } else { 0 };

        let (xo, yo) = (points[j].x as f64, points[j].y as f64);
        let (xa, ya) = (points[previous].x as f64, points[previous].y as f64);
        let (xb, yb) = (points[next].x as f64, points[next].y as f64);

        let theta = (yo - ya).atan2(xo - xa);
        let mut alpha = (yb - yo).atan2(xb - xo) - theta;
        if alpha > 0.0 {
            alpha -= PI;
        } else {
            alpha += PI;
        }

        let mut join = pen.join();
        if join == LineJoin::Miter && miter_limit < (1.0 / (alpha / 2.0).sin()).abs() {
            join = LineJoin::Bevel;
        }

        // The turn direction selects which offset path runs inside
        let (inside, outside) = if alpha > 0.0 {
            (&mut up, &mut down)
        } else if alpha < 0.0 {
            (&mut down, &mut up)
        } else {
            continue;
        };

        // Two inside points, perpendicular to the incoming and outgoing
        // segments
        let sign = if alpha > 0.0 { -1.0 } else { 1.0 };
        let pt = Point::new(
            points[j].x + sign_round(sign, width_in * (theta + FRAC_PI_2).cos()),
            points[j].y + sign_round(sign, width_in * (theta + FRAC_PI_2).sin()),
        );
        if !inside.add_entry(pt, PointType::LINETO) {
            return false;
        }
        let pt = Point::new(
            points[j].x - sign_round(sign, width_in * (FRAC_PI_2 + alpha + theta).cos()),
            points[j].y - sign_round(sign, width_in * (FRAC_PI_2 + alpha + theta).sin()),
        );
        if !inside.add_entry(pt, PointType::LINETO) {
            return false;
        }

        // Outside point(s) per the join rule
        match join {
            LineJoin::Miter => {
                let miter_width = (width_out / (FRAC_PI_2 - alpha.abs() / 2.0).cos()).abs();
                let pt = Point::new(
                    points[j].x + round_away(miter_width * (theta + alpha / 2.0).cos()),
                    points[j].y + round_away(miter_width * (theta + alpha / 2.0).sin()),
                );
                if !outside.add_entry(pt, PointType::LINETO) {
                    return false;
                }
            }
            LineJoin::Bevel => {
                let pt = Point::new(
                    points[j].x - sign_round(sign, width_out * (theta + FRAC_PI_2).cos()),
                    points[j].y - sign_round(sign, width_out * (theta + FRAC_PI_2).sin()),
                );
                if !outside.add_entry(pt, PointType::LINETO) {
                    return false;
                }
                let pt = Point::new(
                    points[j].x + sign_round(sign, width_out * (FRAC_PI_2 + alpha + theta).cos()),
                    points[j].y + sign_round(sign, width_out * (FRAC_PI_2 + alpha + theta).sin()),
                );
                if !outside.add_entry(pt, PointType::LINETO) {
                    return false;
                }
            }
            LineJoin::Round => {
                // Circular arc between the two perpendicular offsets,
                // approximated by one cubic
                let pt = Point::new(
                    points[j].x - sign_round(sign, width_out * (theta + FRAC_PI_2).cos()),
                    points[j].y - sign_round(sign, width_out * (theta + FRAC_PI_2).sin()),
                );
                if !outside.add_entry(pt, PointType::BEZIERTO) {
                    return false;
                }
                let pt = Point::new(
                    points[j].x + round_away(width_out * (theta + alpha / 2.0).cos()),
                    points[j].y + round_away(width_out * (theta + alpha / 2.0).sin()),
                );
                if !outside.add_entry(pt, PointType::BEZIERTO) {
                    return false;
                }
                let pt = Point::new(
                    points[j].x + sign_round(sign, width_out * (FRAC_PI_2 + alpha + theta).cos()),
                    points[j].y + sign_round(sign, width_out * (FRAC_PI_2 + alpha + theta).sin()),
                );
                if !outside.add_entry(pt, PointType::BEZIERTO) {
                    return false;
                }
            }
        }
    }

    // Assemble: the up sub-path forward, then the down sub-path reversed.
    // Every emitted figure is closed; a closed stroke yields two separate
    // figures.
    for (j, pt) in up.points().iter().enumerate() {
        let tag = if j == 0 { PointType::MOVETO } else { PointType::LINETO };
        if !new_path.add_entry(*pt, tag) {
            return false;
        }
    }
    if closed && !up.is_empty() && !down.is_empty() {
        new_path.close_figure();
    }
    for (j, pt) in down.points().iter().rev().enumerate() {
        let tag = if j == 0 && closed { PointType::MOVETO } else { PointType::LINETO };
        if !new_path.add_entry(*pt, tag) {
            return false;
        }
    }
    if !up.is_empty() || !down.is_empty() {
        new_path.close_figure();
    }
    true
}

/// Offset rounded away from zero, with the turn-direction sign applied
/// before rounding
fn sign_round(sign: f64, value: f64) -> i32 {
    round_away(sign * value)
}

/// Append an end cap for an unclosed stroke end at `(xo, yo)`; `theta`
/// points back along the stroke toward the adjacent vertex
#[allow(clippy::too_many_arguments)]
fn add_end_cap(
    up: &mut Path,
    cap: EndCap,
    xo: f64,
    yo: f64,
    theta: f64,
    width_in: f64,
    width_out: f64,
    first: bool,
) -> bool {
    let start_tag = if first { PointType::MOVETO } else { PointType::LINETO };

    match cap {
        EndCap::Square => {
            let d = core::f64::consts::SQRT_2;
            let pt = Point::new(
                xo as i32 + round_away(d * width_out * (FRAC_PI_4 + theta).cos()),
                yo as i32 + round_away(d * width_out * (FRAC_PI_4 + theta).sin()),
            );
            if !up.add_entry(pt, start_tag) {
                return false;
            }
            let pt = Point::new(
                xo as i32 + round_away(d * width_in * (-FRAC_PI_4 + theta).cos()),
                yo as i32 + round_away(d * width_in * (-FRAC_PI_4 + theta).sin()),
            );
            up.add_entry(pt, PointType::LINETO)
        }

        EndCap::Flat => {
            let pt = Point::new(
                xo as i32 + round_away(width_out * (theta + FRAC_PI_2).cos()),
                yo as i32 + round_away(width_out * (theta + FRAC_PI_2).sin()),
            );
            if !up.add_entry(pt, start_tag) {
                return false;
            }
            let pt = Point::new(
                xo as i32 - round_away(width_in * (theta + FRAC_PI_2).cos()),
                yo as i32 - round_away(width_in * (theta + FRAC_PI_2).sin()),
            );
            up.add_entry(pt, PointType::LINETO)
        }

        EndCap::Round => {
            // Semicircle around the stroke end, four quarter-of-a-quarter
            // Bezier parts
            let corners = [
                FloatPoint::new(xo - width_in, yo - width_in),
                FloatPoint::new(xo + width_out, yo + width_out),
            ];
            let start = if first { Some(PointType::MOVETO) } else { None };
            do_arc_part(up, &corners, theta + FRAC_PI_2, theta + 3.0 * FRAC_PI_4, start)
                && do_arc_part(up, &corners, theta + 3.0 * FRAC_PI_4, theta + PI, None)
                && do_arc_part(up, &corners, theta + PI, theta + 5.0 * FRAC_PI_4, None)
                && do_arc_part(up, &corners, theta + 5.0 * FRAC_PI_4, theta + 3.0 * FRAC_PI_2, None)
        }
    }
}
