//! Drawing Operation Dispatch
//!
//! Every drawing call on a device context goes through its driver stack.
//! The bottom display driver accepts geometric primitives (pixel
//! production happens outside this engine); while a path recording is
//! open, the recording driver on top of the stack intercepts the same
//! vocabulary and records the geometry instead.
//!
//! The path transform entry points (`flatten_path`, `widen_path`,
//! `path_to_region`, `fill_path`, `stroke_path`, `stroke_and_fill_path`,
//! `select_clip_path`) operate on the committed path owned by the context.

use crate::dc;
use crate::flatten;
use crate::font::GlyphOutline;
use crate::path::{PathDriver, PointType};
use crate::pen;
use crate::region::{self, CombineMode};
use crate::shapes::ArcOp;
use crate::widen;
use crate::{gdi_round, GdiHandle, Point, Status};

// ============================================================================
// Driver Stack
// ============================================================================

/// Bottom-of-stack driver standing in for a physical device
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayDriver;

/// One drawing driver on a device context's stack
#[derive(Debug, Clone)]
pub enum Driver {
    /// Physical device placeholder
    Display(DisplayDriver),
    /// Path recording driver
    Path(PathDriver),
}

// ============================================================================
// Position Primitives
// ============================================================================

/// Move the current position. While recording, sets the new-stroke latch
/// without emitting an entry.
pub fn move_to(hdc: GdiHandle, x: i32, y: i32) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.move_to(&ctx, x, y),
            _ => true,
        };
        if ok {
            dc.current_pos = Point::new(x, y);
        }
        ok
    })
    .unwrap_or(false)
}

/// Draw a line from the current position
pub fn line_to(hdc: GdiHandle, x: i32, y: i32) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.line_to(&ctx, x, y),
            _ => true,
        };
        if ok {
            dc.current_pos = Point::new(x, y);
        }
        ok
    })
    .unwrap_or(false)
}

// ============================================================================
// Poly Family
// ============================================================================

pub fn polyline(hdc: GdiHandle, points: &[Point]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.polyline(&ctx, points),
            _ => true,
        }
    })
    .unwrap_or(false)
}

pub fn polyline_to(hdc: GdiHandle, points: &[Point]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.polyline_to(&ctx, points),
            _ => true,
        };
        if ok {
            if let Some(last) = points.last() {
                dc.current_pos = *last;
            }
        }
        ok
    })
    .unwrap_or(false)
}

pub fn polygon(hdc: GdiHandle, points: &[Point]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.polygon(&ctx, points),
            _ => true,
        }
    })
    .unwrap_or(false)
}

pub fn poly_polygon(hdc: GdiHandle, points: &[Point], counts: &[usize]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.poly_polygon(&ctx, points, counts),
            _ => counts.iter().all(|&c| c >= 2) && !counts.is_empty(),
        }
    })
    .unwrap_or(false)
}

pub fn poly_polyline(hdc: GdiHandle, points: &[Point], counts: &[usize]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.poly_polyline(&ctx, points, counts),
            _ => counts.iter().all(|&c| c >= 2) && !counts.is_empty(),
        }
    })
    .unwrap_or(false)
}

pub fn poly_bezier(hdc: GdiHandle, points: &[Point]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.poly_bezier(&ctx, points),
            _ => true,
        }
    })
    .unwrap_or(false)
}

pub fn poly_bezier_to(hdc: GdiHandle, points: &[Point]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.poly_bezier_to(&ctx, points),
            _ => true,
        };
        if ok {
            if let Some(last) = points.last() {
                dc.current_pos = *last;
            }
        }
        ok
    })
    .unwrap_or(false)
}

/// Replay a tagged point stream. On success the current position lands on
/// the last input point.
pub fn poly_draw(hdc: GdiHandle, points: &[Point], types: &[PointType]) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.poly_draw(&ctx, points, types),
            _ => true,
        };
        if ok {
            if let Some(last) = points.last() {
                dc.current_pos = *last;
            }
        }
        ok
    })
    .unwrap_or(false)
}

// ============================================================================
// Shapes
// ============================================================================

pub fn rectangle(hdc: GdiHandle, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.rectangle(&ctx, x1, y1, x2, y2),
            _ => true,
        }
    })
    .unwrap_or(false)
}

#[allow(clippy::too_many_arguments)]
pub fn round_rect(
    hdc: GdiHandle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    ell_width: i32,
    ell_height: i32,
) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.round_rect(&ctx, x1, y1, x2, y2, ell_width, ell_height),
            _ => true,
        }
    })
    .unwrap_or(false)
}

// ============================================================================
// Arc Family
// ============================================================================

fn arc_op(hdc: GdiHandle, coords: [i32; 8], op: ArcOp) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let direction = dc.arc_direction;
        let [x1, y1, x2, y2, xs, ys, xe, ye] = coords;
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => {
                rec.arc(&ctx, x1, y1, x2, y2, xs, ys, xe, ye, direction, op)
            }
            _ => true,
        };
        if ok && op == ArcOp::ArcTo {
            dc.current_pos = arc_end_pos(x1, y1, x2, y2, xe, ye);
        }
        ok
    })
    .unwrap_or(false)
}

/// Logical-space ellipse point nearest the radial end point; the current
/// position lands there after an arc-to
fn arc_end_pos(x1: i32, y1: i32, x2: i32, y2: i32, xe: i32, ye: i32) -> Point {
    let cx = (x1 + x2) as f64 / 2.0;
    let cy = (y1 + y2) as f64 / 2.0;
    let a = ((x2 - x1) as f64 / 2.0).abs();
    let b = ((y2 - y1) as f64 / 2.0).abs();
    if a < 1e-9 || b < 1e-9 {
        return Point::new(xe, ye);
    }
    let angle = ((ye as f64 - cy) / b).atan2((xe as f64 - cx) / a);
    Point::new(gdi_round(cx + a * angle.cos()), gdi_round(cy + b * angle.sin()))
}

#[allow(clippy::too_many_arguments)]
pub fn arc(
    hdc: GdiHandle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    xs: i32,
    ys: i32,
    xe: i32,
    ye: i32,
) -> bool {
    arc_op(hdc, [x1, y1, x2, y2, xs, ys, xe, ye], ArcOp::Arc)
}

#[allow(clippy::too_many_arguments)]
pub fn arc_to(
    hdc: GdiHandle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    xs: i32,
    ys: i32,
    xe: i32,
    ye: i32,
) -> bool {
    arc_op(hdc, [x1, y1, x2, y2, xs, ys, xe, ye], ArcOp::ArcTo)
}

#[allow(clippy::too_many_arguments)]
pub fn chord(
    hdc: GdiHandle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    xs: i32,
    ys: i32,
    xe: i32,
    ye: i32,
) -> bool {
    arc_op(hdc, [x1, y1, x2, y2, xs, ys, xe, ye], ArcOp::Chord)
}

#[allow(clippy::too_many_arguments)]
pub fn pie(
    hdc: GdiHandle,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    xs: i32,
    ys: i32,
    xe: i32,
    ye: i32,
) -> bool {
    arc_op(hdc, [x1, y1, x2, y2, xs, ys, xe, ye], ArcOp::Pie)
}

/// Record a full ellipse as a closed figure
pub fn ellipse(hdc: GdiHandle, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let direction = dc.arc_direction;
        match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.ellipse(&ctx, x1, y1, x2, y2, direction),
            _ => true,
        }
    })
    .unwrap_or(false)
}

/// Record a circular arc from a centre, radius, and start/sweep angles in
/// degrees, continuing the current stroke
pub fn angle_arc(hdc: GdiHandle, x: i32, y: i32, radius: i32, start: f64, sweep: f64) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let ctx = dc.record_ctx();
        let ok = match dc.drivers.last_mut() {
            Some(Driver::Path(rec)) => rec.angle_arc(&ctx, x, y, radius, start, sweep),
            _ => true,
        };
        if ok {
            let end = (start + sweep) * core::f64::consts::PI / 180.0;
            dc.current_pos = Point::new(
                gdi_round(x as f64 + end.cos() * radius as f64),
                gdi_round(y as f64 - end.sin() * radius as f64),
            );
        }
        ok
    })
    .unwrap_or(false)
}

// ============================================================================
// Text
// ============================================================================

/// Emit glyph outlines into the open recording. The anchor is in device
/// coordinates; outline buffers are already device-space and bypass the
/// world transform.
pub fn text_path(hdc: GdiHandle, x: i32, y: i32, glyphs: &[GlyphOutline<'_>]) -> bool {
    dc::with_dc_mut(hdc, |dc| match dc.drivers.last_mut() {
        Some(Driver::Path(rec)) => rec.text_out(x, y, glyphs),
        _ => true,
    })
    .unwrap_or(false)
}

// ============================================================================
// Path Transform Entry Points
// ============================================================================

/// Consume and validate the committed path. Pixel production is outside
/// this engine; the consumption protocol matches the drawing operations.
fn consume_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        if dc.path.take().is_none() {
            crate::set_last_error(Status::CanNotComplete);
            return false;
        }
        true
    })
    .unwrap_or(false)
}

/// Fill the committed path with the current brush
pub fn fill_path(hdc: GdiHandle) -> bool {
    consume_path(hdc)
}

/// Stroke the committed path with the current pen
pub fn stroke_path(hdc: GdiHandle) -> bool {
    consume_path(hdc)
}

/// Stroke, then fill, the committed path
pub fn stroke_and_fill_path(hdc: GdiHandle) -> bool {
    consume_path(hdc)
}

/// Replace the committed path with its flattened form
pub fn flatten_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let path = match &dc.path {
            Some(p) => p,
            None => {
                crate::set_last_error(Status::CanNotComplete);
                return false;
            }
        };
        match flatten::flatten_path(path) {
            Some(flat) => {
                dc.path = Some(flat);
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Replace the committed path with its widened stroke outline, using the
/// selected pen's width, end cap, and join, and the context's miter limit
pub fn widen_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        let path = match &dc.path {
            Some(p) => p,
            None => {
                crate::set_last_error(Status::CanNotComplete);
                return false;
            }
        };
        let pen = match pen::get_pen(dc.pen) {
            Some(p) => p,
            None => {
                crate::set_last_error(Status::CanNotComplete);
                return false;
            }
        };
        match widen::widen_path(path, &pen, dc.miter_limit) {
            Some(widened) => {
                dc.path = Some(widened);
                true
            }
            None => false,
        }
    })
    .unwrap_or(false)
}

/// Convert the committed path to a region, consuming it. Returns a null
/// handle when no path exists or the path is empty.
pub fn path_to_region(hdc: GdiHandle) -> GdiHandle {
    let flat = dc::with_dc_mut(hdc, |dc| match dc.path.take() {
        Some(path) => flatten::flatten_path(&path).map(|flat| (flat, dc.fill_mode)),
        None => {
            crate::set_last_error(Status::CanNotComplete);
            None
        }
    })
    .flatten();

    match flat {
        Some((flat, mode)) => region::path_to_region(&flat, mode),
        None => GdiHandle::NULL,
    }
}

/// Convert the committed path to a region and combine it into the clip
/// region of the context, consuming the path
pub fn select_clip_path(hdc: GdiHandle, mode: CombineMode) -> bool {
    let hrgn = path_to_region(hdc);
    if !hrgn.is_valid() {
        return false;
    }

    dc::with_dc_mut(hdc, |dc| {
        if dc.clip_region == GdiHandle::NULL || mode == CombineMode::Copy {
            if dc.clip_region.is_valid() {
                region::delete_region(dc.clip_region);
            }
            dc.clip_region = hrgn;
            true
        } else {
            let ok = region::combine_region(dc.clip_region, dc.clip_region, hrgn, mode);
            region::delete_region(hrgn);
            ok
        }
    })
    .unwrap_or(false)
}
