//! Glyph Outlines
//!
//! Conversion of native glyph outline buffers into path entries. An
//! outline buffer is a sequence of polygon records: a header carrying a
//! 16.16 fixed-point start point and a byte size, followed by curve
//! records (lines, quadratic splines, cubic splines). Quadratic splines
//! are converted to chains of cubic Beziers; the first control point of
//! every spline is the on-curve point immediately preceding the curve
//! record in the byte stream.
//!
//! Outline y coordinates grow upwards and are flipped when emitted.

use crate::path::{Path, PathDriver, PointType};
use crate::Point;

// ============================================================================
// Record Format
// ============================================================================

/// Polygon header record type
pub const POLYGON_TYPE: u32 = 24;

/// Curve record types
pub const PRIM_LINE: u16 = 1;
pub const PRIM_QSPLINE: u16 = 2;
pub const PRIM_CSPLINE: u16 = 3;

/// Size of a polygon header: type (4) + cb (4) + start point (8)
const HEADER_SIZE: usize = 16;

/// Size of a curve record header: type (2) + count (2)
const CURVE_SIZE: usize = 4;

/// Size of an encoded 16.16 fixed-point point
const POINTFX_SIZE: usize = 8;

/// One glyph outline plus its cell advance
#[derive(Debug, Clone, Copy)]
pub struct GlyphOutline<'a> {
    /// Native outline buffer; empty for blank glyphs
    pub data: &'a [u8],
    /// Cell increment applied after the glyph is emitted
    pub advance: Point,
}

// ============================================================================
// Fixed-Point Decoding
// ============================================================================

/// Round a 16.16 fixed-point value half up to an integer
fn int_from_fixed(value: i16, fract: u16) -> i32 {
    if fract >= 0x8000 {
        value as i32 + 1
    } else {
        value as i32
    }
}

fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Decode the point at `offset`: x fixed (fract word, then value word),
/// then y fixed
fn read_pointfx(buf: &[u8], offset: usize) -> Option<(i32, i32)> {
    let x_fract = read_u16(buf, offset)?;
    let x_value = read_u16(buf, offset + 2)? as i16;
    let y_fract = read_u16(buf, offset + 4)?;
    let y_value = read_u16(buf, offset + 6)? as i16;
    Some((
        int_from_fixed(x_value, x_fract),
        int_from_fixed(y_value, y_fract),
    ))
}

// ============================================================================
// Quadratic-to-Cubic Chain
// ============================================================================

/// Append the curve through `points` as lines and cubic Beziers. The first
/// point is the previous on-curve point and is already the path cursor.
/// Between consecutive off-curve points an implicit on-curve midpoint is
/// inserted; the final cubic uses the last two points directly.
fn bezier_chain(path: &mut Path, points: &[Point]) -> bool {
    let n = points.len();
    if n < 2 {
        return true;
    }

    if n == 2 {
        return path.add_entry(points[1], PointType::LINETO);
    }

    if n == 3 {
        return path.add_points(points, PointType::BEZIERTO).is_some();
    }

    let mut pt = [points[0]; 3];
    let mut remaining = n - 1;
    let mut i = 0;

    while remaining > 2 {
        pt[0] = pt[2];
        pt[1] = points[i + 1];
        pt[2] = Point::new(
            (points[i + 2].x + points[i + 1].x) / 2,
            (points[i + 2].y + points[i + 1].y) / 2,
        );
        if path.add_points(&pt, PointType::BEZIERTO).is_none() {
            return false;
        }
        remaining -= 1;
        i += 1;
    }

    pt[0] = pt[2];
    pt[1] = points[i + 1];
    pt[2] = points[i + 2];
    path.add_points(&pt, PointType::BEZIERTO).is_some()
}

// ============================================================================
// Outline Emission
// ============================================================================

impl PathDriver {
    /// Append a native glyph outline positioned at `(x, y)`. Each polygon
    /// record becomes a closed figure. Unknown record types fail.
    pub fn add_outline(&mut self, x: i32, y: i32, buffer: &[u8]) -> bool {
        let mut offset = 0;

        while offset < buffer.len() {
            let header_type = match read_u32(buffer, offset) {
                Some(t) => t,
                None => return false,
            };
            if header_type != POLYGON_TYPE {
                log::error!("unknown outline header type {}", header_type);
                return false;
            }

            let cb = match read_u32(buffer, offset + 4) {
                Some(cb) => cb as usize,
                None => return false,
            };
            if cb < HEADER_SIZE || offset + cb > buffer.len() {
                return false;
            }

            let (sx, sy) = match read_pointfx(buffer, offset + 8) {
                Some(p) => p,
                None => return false,
            };
            if !self
                .path
                .add_entry(Point::new(x + sx, y - sy), PointType::MOVETO)
            {
                return false;
            }

            let mut cur = offset + HEADER_SIZE;
            while cur < offset + cb {
                let curve_type = match read_u16(buffer, cur) {
                    Some(t) => t,
                    None => return false,
                };
                let count = match read_u16(buffer, cur + 2) {
                    Some(c) => c as usize,
                    None => return false,
                };
                if cur + CURVE_SIZE + count * POINTFX_SIZE > offset + cb {
                    return false;
                }

                match curve_type {
                    PRIM_LINE => {
                        for i in 0..count {
                            let (px, py) =
                                match read_pointfx(buffer, cur + CURVE_SIZE + i * POINTFX_SIZE) {
                                    Some(p) => p,
                                    None => return false,
                                };
                            if !self
                                .path
                                .add_entry(Point::new(x + px, y - py), PointType::LINETO)
                            {
                                return false;
                            }
                        }
                    }

                    PRIM_QSPLINE | PRIM_CSPLINE => {
                        // The spline's first control point is the on-curve
                        // point stored just before this curve record
                        let mut pts = Vec::with_capacity(count + 1);
                        let (px, py) = match read_pointfx(buffer, cur - POINTFX_SIZE) {
                            Some(p) => p,
                            None => return false,
                        };
                        pts.push(Point::new(x + px, y - py));

                        for i in 0..count {
                            let (px, py) =
                                match read_pointfx(buffer, cur + CURVE_SIZE + i * POINTFX_SIZE) {
                                    Some(p) => p,
                                    None => return false,
                                };
                            pts.push(Point::new(x + px, y - py));
                        }

                        if !bezier_chain(&mut self.path, &pts) {
                            return false;
                        }
                    }

                    _ => {
                        log::error!("unknown outline curve type {:#06x}", curve_type);
                        return false;
                    }
                }

                cur += CURVE_SIZE + count * POINTFX_SIZE;
            }

            self.path.close_figure();
            offset += cb;
        }
        true
    }

    /// Append a run of glyph outlines starting at `(x, y)`, advancing by
    /// each glyph's cell increment
    pub fn text_out(&mut self, x: i32, y: i32, glyphs: &[GlyphOutline<'_>]) -> bool {
        let mut offset = Point::new(0, 0);

        for glyph in glyphs {
            // blank glyphs contribute only their advance
            if !glyph.data.is_empty()
                && !self.add_outline(x + offset.x, y + offset.y, glyph.data)
            {
                return false;
            }
            offset.x += glyph.advance.x;
            offset.y += glyph.advance.y;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn push_fixed(buf: &mut Vec<u8>, value: i16, fract: u16) {
        buf.extend_from_slice(&fract.to_le_bytes());
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_pointfx(buf: &mut Vec<u8>, x: i16, y: i16) {
        push_fixed(buf, x, 0);
        push_fixed(buf, y, 0);
    }

    /// Polygon header with a patched-in cb once the body is known
    fn outline_polygon(start: (i16, i16), body: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&POLYGON_TYPE.to_le_bytes());
        buf.extend_from_slice(&((16 + body.len()) as u32).to_le_bytes());
        push_pointfx(&mut buf, start.0, start.1);
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn fixed_rounds_half_up() {
        assert_eq!(int_from_fixed(3, 0x7FFF), 3);
        assert_eq!(int_from_fixed(3, 0x8000), 4);
        assert_eq!(int_from_fixed(-2, 0x8000), -1);
    }

    #[test]
    fn line_polygon_becomes_closed_figure_with_flipped_y() {
        let mut body = Vec::new();
        body.extend_from_slice(&PRIM_LINE.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        push_pointfx(&mut body, 10, 0);
        push_pointfx(&mut body, 10, 10);
        let buf = outline_polygon((0, 0), &body);

        let mut rec = PathDriver::new(Point::new(0, 0));
        assert!(rec.add_outline(100, 200, &buf));

        assert_eq!(
            rec.path.points(),
            &[
                Point::new(100, 200),
                Point::new(110, 200),
                Point::new(110, 190),
            ]
        );
        assert_eq!(
            rec.path.tags(),
            &[
                PointType::MOVETO,
                PointType::LINETO,
                PointType::LINETO | PointType::CLOSEFIGURE,
            ]
        );
    }

    #[test]
    fn qspline_emits_one_cubic() {
        let mut body = Vec::new();
        body.extend_from_slice(&PRIM_QSPLINE.to_le_bytes());
        body.extend_from_slice(&2u16.to_le_bytes());
        push_pointfx(&mut body, 5, 5); // off-curve control
        push_pointfx(&mut body, 10, 0); // on-curve end
        let buf = outline_polygon((0, 0), &body);

        let mut rec = PathDriver::new(Point::new(0, 0));
        assert!(rec.add_outline(0, 0, &buf));

        // move + three Bezier entries, figure closed on the last
        assert_eq!(rec.path.len(), 4);
        assert_eq!(rec.path.tags()[0], PointType::MOVETO);
        assert_eq!(rec.path.tags()[1], PointType::BEZIERTO);
        assert_eq!(rec.path.tags()[2], PointType::BEZIERTO);
        assert_eq!(
            rec.path.tags()[3],
            PointType::BEZIERTO | PointType::CLOSEFIGURE
        );
        assert_eq!(rec.path.points()[3], Point::new(10, 0));
    }

    #[test]
    fn long_qspline_inserts_implicit_midpoints() {
        // three consecutive off-curve controls, then the on-curve end
        let mut body = Vec::new();
        body.extend_from_slice(&PRIM_QSPLINE.to_le_bytes());
        body.extend_from_slice(&4u16.to_le_bytes());
        push_pointfx(&mut body, 4, 4);
        push_pointfx(&mut body, 8, 4);
        push_pointfx(&mut body, 12, 4);
        push_pointfx(&mut body, 16, 0);
        let buf = outline_polygon((0, 0), &body);

        let mut rec = PathDriver::new(Point::new(0, 0));
        assert!(rec.add_outline(0, 0, &buf));

        // move + three cubics
        assert_eq!(rec.path.len(), 10);
        // first implicit on-curve midpoint between controls (4,4) and (8,4)
        assert_eq!(rec.path.points()[3], Point::new(6, -4));
    }

    #[test]
    fn unknown_curve_type_fails() {
        let mut body = Vec::new();
        body.extend_from_slice(&0x99u16.to_le_bytes());
        body.extend_from_slice(&0u16.to_le_bytes());
        let buf = outline_polygon((0, 0), &body);

        let mut rec = PathDriver::new(Point::new(0, 0));
        assert!(!rec.add_outline(0, 0, &buf));
    }

    #[test]
    fn text_out_applies_advances() {
        let mut body = Vec::new();
        body.extend_from_slice(&PRIM_LINE.to_le_bytes());
        body.extend_from_slice(&1u16.to_le_bytes());
        push_pointfx(&mut body, 4, 0);
        let buf = outline_polygon((0, 0), &body);

        let glyphs = [
            GlyphOutline { data: &buf, advance: Point::new(6, 0) },
            GlyphOutline { data: &buf, advance: Point::new(6, 0) },
        ];

        let mut rec = PathDriver::new(Point::new(0, 0));
        assert!(rec.text_out(10, 10, &glyphs));

        assert_eq!(rec.path.points()[0], Point::new(10, 10));
        assert_eq!(rec.path.points()[2], Point::new(16, 10));
    }
}
