//! Path Objects
//!
//! Path recording support for complex shapes built from lines, curves, and
//! figures. Paths accumulate device-space points while a recording is open
//! on a device context, and can then be flattened, widened, or converted to
//! a region.
//!
//! # Path Operations
//!
//! - **begin_path**: Start recording drawing calls
//! - **end_path**: Finish recording and commit the path to the context
//! - **abort_path**: Discard the recording and any committed path
//! - **close_figure**: Close the current figure
//! - **get_path**: Copy out points and tags in logical coordinates
//!
//! # Representation
//!
//! Entries live in two parallel growable buffers (points and tags) so the
//! points buffer is directly consumable by the region constructor. A
//! *stroke* is a MOVETO followed by one or more LINETO/BEZIERTO entries up
//! to, but not including, the next MOVETO. A *figure* ends at an entry
//! carrying the CLOSEFIGURE flag; one figure may span several strokes.

use crate::dc;
use crate::draw::Driver;
use crate::xform::{GraphicsMode, XForm};
use crate::{GdiHandle, Point, Status};

// ============================================================================
// Constants
// ============================================================================

/// Maximum entries in a single path
pub const MAX_PATH_POINTS: usize = 65536;

/// Initial size of the points / tags buffers
const NUM_ENTRIES_INITIAL: usize = 16;

// ============================================================================
// Path Point Types
// ============================================================================

bitflags::bitflags! {
    /// Point tag flags; the bit layout is stable and part of the public
    /// contract
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PointType: u8 {
        /// Close figure flag, combinable with LINETO and BEZIERTO
        const CLOSEFIGURE = 0x01;
        /// Line to point
        const LINETO = 0x02;
        /// Bezier control point (always in runs of three)
        const BEZIERTO = 0x04;
        /// Move to point (start new stroke)
        const MOVETO = 0x06;
    }
}

// ============================================================================
// Path Object
// ============================================================================

/// Path object: parallel point/tag buffers plus the recorder cursor state
#[derive(Debug, Clone)]
pub struct Path {
    /// Device-space points
    pub(crate) points: Vec<Point>,
    /// Tags, parallel to `points`
    pub(crate) tags: Vec<PointType>,
    /// Current cursor position (device coords)
    pub(crate) pos: Point,
    /// Set by an explicit move; the next stroke extension must emit a
    /// synthetic MOVETO
    pub(crate) new_stroke: bool,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            points: Vec::with_capacity(NUM_ENTRIES_INITIAL),
            tags: Vec::with_capacity(NUM_ENTRIES_INITIAL),
            pos: Point::new(0, 0),
            new_stroke: true,
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if path is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get path points
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Get path tags
    pub fn tags(&self) -> &[PointType] {
        &self.tags
    }

    /// Get the cursor position (device coords)
    pub fn pos(&self) -> Point {
        self.pos
    }

    /// Ensure room for `count` more entries. The buffers grow by doubling,
    /// which keeps appends amortized constant time; exceeding the entry cap
    /// reports failure instead of growing without bound.
    pub(crate) fn reserve(&mut self, count: usize) -> bool {
        let needed = self.points.len() + count;
        if needed > MAX_PATH_POINTS {
            crate::set_last_error(Status::NotEnoughMemory);
            return false;
        }
        if needed > self.points.capacity() {
            let target = needed.max(self.points.capacity() * 2).max(NUM_ENTRIES_INITIAL);
            self.points.reserve(target - self.points.len());
            self.tags.reserve(target - self.tags.len());
        }
        true
    }

    /// Add an entry. For `tag`, pass MOVETO, LINETO or BEZIERTO, optionally
    /// ORed with CLOSEFIGURE.
    pub(crate) fn add_entry(&mut self, point: Point, tag: PointType) -> bool {
        log::trace!("({},{}) - {:?}", point.x, point.y, tag);

        if !self.reserve(1) {
            return false;
        }

        self.points.push(point);
        self.tags.push(tag);
        true
    }

    /// Add a run of points that are already in device coords, all under one
    /// tag. Returns the index of the first added entry so the caller can
    /// fix up tags (e.g. mark the first entry MOVETO).
    pub(crate) fn add_points(&mut self, points: &[Point], tag: PointType) -> Option<usize> {
        if !self.reserve(points.len()) {
            return None;
        }

        let first = self.points.len();
        self.points.extend_from_slice(points);
        self.tags.resize(first + points.len(), tag);
        Some(first)
    }

    /// Set the CLOSEFIGURE flag on the last entry, ending the figure
    pub(crate) fn close_figure(&mut self) {
        debug_assert!(!self.tags.is_empty());
        if let Some(last) = self.tags.last_mut() {
            *last |= PointType::CLOSEFIGURE;
        }
    }

    /// Set cursor position to the last entry added to the path
    pub(crate) fn update_pos(&mut self) {
        debug_assert!(!self.points.is_empty());
        if let Some(last) = self.points.last() {
            self.pos = *last;
        }
    }
}

// ============================================================================
// Recording Context
// ============================================================================

/// Snapshot of the device-context state a recording operation consumes
#[derive(Debug, Clone, Copy)]
pub struct RecordCtx {
    /// Combined world-to-device transform
    pub to_device: XForm,
    /// Graphics mode, controls the exclusive-edge corner rule
    pub graphics_mode: GraphicsMode,
}

impl RecordCtx {
    pub fn identity() -> Self {
        Self { to_device: XForm::identity(), graphics_mode: GraphicsMode::Advanced }
    }
}

// ============================================================================
// Recording Driver
// ============================================================================

/// Drawing driver that records geometric primitives into a path instead of
/// rendering them
#[derive(Debug, Clone)]
pub struct PathDriver {
    pub(crate) path: Path,
}

impl PathDriver {
    /// Create a recording whose cursor starts at the given device position
    pub fn new(start: Point) -> Self {
        let mut path = Path::new();
        path.pos = start;
        Self { path }
    }

    /// Take the recorded path out of the driver
    pub fn into_path(self) -> Path {
        self.path
    }

    /// Start a new path stroke if necessary: the cursor moved, the last
    /// figure was closed, or an explicit move set the latch.
    pub(crate) fn start_new_stroke(&mut self) -> bool {
        let path = &mut self.path;

        if !path.new_stroke
            && !path.points.is_empty()
            && !path.tags[path.tags.len() - 1].contains(PointType::CLOSEFIGURE)
            && path.points[path.points.len() - 1] == path.pos
        {
            return true;
        }

        path.new_stroke = false;
        let pos = path.pos;
        path.add_entry(pos, PointType::MOVETO)
    }

    /// Add a run of points, converting them to device coords. Returns the
    /// index of the first added tag for fix-up.
    pub(crate) fn add_log_points(
        &mut self,
        ctx: &RecordCtx,
        points: &[Point],
        tag: PointType,
    ) -> Option<usize> {
        if !self.path.reserve(points.len()) {
            return None;
        }

        let first = self.path.points.len();
        for p in points {
            self.path.points.push(ctx.to_device.transform(*p));
        }
        self.path.tags.resize(first + points.len(), tag);
        Some(first)
    }

    /// Add a run of points, starting a new stroke if necessary and leaving
    /// the cursor on the last point
    pub(crate) fn add_log_points_new_stroke(
        &mut self,
        ctx: &RecordCtx,
        points: &[Point],
        tag: PointType,
    ) -> bool {
        if !self.start_new_stroke() {
            return false;
        }
        if self.add_log_points(ctx, points, tag).is_none() {
            return false;
        }
        self.path.update_pos();
        true
    }

    // ------------------------------------------------------------------
    // Recorder operations
    // ------------------------------------------------------------------

    /// Set the new-stroke latch and move the cursor; no entry is appended
    /// until the stroke is extended
    pub fn move_to(&mut self, ctx: &RecordCtx, x: i32, y: i32) -> bool {
        self.path.new_stroke = true;
        self.path.pos = ctx.to_device.transform(Point::new(x, y));
        true
    }

    pub fn line_to(&mut self, ctx: &RecordCtx, x: i32, y: i32) -> bool {
        self.add_log_points_new_stroke(ctx, &[Point::new(x, y)], PointType::LINETO)
    }

    /// Append a Bezier run continuing the current stroke; the caller
    /// guarantees the count is a multiple of three
    pub fn poly_bezier_to(&mut self, ctx: &RecordCtx, points: &[Point]) -> bool {
        debug_assert!(points.len() % 3 == 0);
        self.add_log_points_new_stroke(ctx, points, PointType::BEZIERTO)
    }

    /// Append a Bezier run as its own stroke: first entry becomes MOVETO
    pub fn poly_bezier(&mut self, ctx: &RecordCtx, points: &[Point]) -> bool {
        if points.is_empty() {
            return true;
        }
        debug_assert!((points.len() - 1) % 3 == 0);
        match self.add_log_points(ctx, points, PointType::BEZIERTO) {
            Some(first) => {
                self.path.tags[first] = PointType::MOVETO;
                true
            }
            None => false,
        }
    }

    /// Append a line run as its own stroke, unconditionally: first entry
    /// becomes MOVETO, the cursor is untouched
    pub fn polyline(&mut self, ctx: &RecordCtx, points: &[Point]) -> bool {
        if points.is_empty() {
            return true;
        }
        match self.add_log_points(ctx, points, PointType::LINETO) {
            Some(first) => {
                self.path.tags[first] = PointType::MOVETO;
                true
            }
            None => false,
        }
    }

    /// Append a line run continuing the current stroke
    pub fn polyline_to(&mut self, ctx: &RecordCtx, points: &[Point]) -> bool {
        self.add_log_points_new_stroke(ctx, points, PointType::LINETO)
    }

    /// Append a closed polygon as its own stroke
    pub fn polygon(&mut self, ctx: &RecordCtx, points: &[Point]) -> bool {
        if points.is_empty() {
            return true;
        }
        match self.add_log_points(ctx, points, PointType::LINETO) {
            Some(first) => {
                self.path.tags[first] = PointType::MOVETO;
                if points.len() > 1 {
                    let last = self.path.tags.len() - 1;
                    self.path.tags[last] = PointType::LINETO | PointType::CLOSEFIGURE;
                }
                true
            }
            None => false,
        }
    }

    /// Append several closed polygons; every segment needs at least two
    /// points
    pub fn poly_polygon(&mut self, ctx: &RecordCtx, points: &[Point], counts: &[usize]) -> bool {
        if counts.is_empty() {
            return false;
        }
        let mut total = 0usize;
        for &c in counts {
            if c < 2 {
                return false;
            }
            total += c;
        }
        if total > points.len() {
            return false;
        }

        let first = match self.add_log_points(ctx, &points[..total], PointType::LINETO) {
            Some(first) => first,
            None => return false,
        };

        // Make the first point of each polygon a MOVETO, and close the last
        let mut base = first;
        for &c in counts {
            self.path.tags[base] = PointType::MOVETO;
            self.path.tags[base + c - 1] = PointType::LINETO | PointType::CLOSEFIGURE;
            base += c;
        }
        true
    }

    /// Append several polylines; every segment needs at least two points
    pub fn poly_polyline(&mut self, ctx: &RecordCtx, points: &[Point], counts: &[usize]) -> bool {
        if counts.is_empty() {
            return false;
        }
        let mut total = 0usize;
        for &c in counts {
            if c < 2 {
                return false;
            }
            total += c;
        }
        if total > points.len() {
            return false;
        }

        let first = match self.add_log_points(ctx, &points[..total], PointType::LINETO) {
            Some(first) => first,
            None => return false,
        };

        let mut base = first;
        for &c in counts {
            self.path.tags[base] = PointType::MOVETO;
            base += c;
        }
        true
    }

    /// Replay an arbitrary tagged point stream. A malformed tag sequence
    /// fails and restores the cursor to its value on entry.
    pub fn poly_draw(&mut self, ctx: &RecordCtx, points: &[Point], types: &[PointType]) -> bool {
        if points.len() != types.len() {
            return false;
        }

        // Index of the last explicit move; a close resets the cursor there
        let mut lastmove = 0;
        for (i, tag) in self.path.tags.iter().enumerate() {
            if *tag == PointType::MOVETO {
                lastmove = i;
            }
        }
        let orig_pos = self.path.pos;

        let mut i = 0;
        while i < points.len() {
            let tag = types[i];

            if tag == PointType::MOVETO {
                self.path.new_stroke = true;
                self.path.pos = ctx.to_device.transform(points[i]);
                lastmove = self.path.len();
            } else if tag == PointType::LINETO
                || tag == (PointType::LINETO | PointType::CLOSEFIGURE)
            {
                if !self.add_log_points_new_stroke(ctx, &points[i..i + 1], PointType::LINETO) {
                    return false;
                }
            } else if tag == PointType::BEZIERTO
                && i + 2 < points.len()
                && types[i + 1] == PointType::BEZIERTO
                && (types[i + 2] & !PointType::CLOSEFIGURE) == PointType::BEZIERTO
            {
                if !self.add_log_points_new_stroke(ctx, &points[i..i + 3], PointType::BEZIERTO) {
                    return false;
                }
                i += 2;
            } else {
                // Unknown tag, or a Bezier without its two companions:
                // restore the cursor and bail out
                self.path.pos = orig_pos;
                return false;
            }

            if types[i].contains(PointType::CLOSEFIGURE) {
                self.path.close_figure();
                if lastmove < self.path.len() {
                    self.path.pos = self.path.points[lastmove];
                }
            }
            i += 1;
        }
        true
    }

    /// Set CLOSEFIGURE on the last entry. No line is appended; the close
    /// flag is a virtual closing line itself.
    pub fn close_figure(&mut self) -> bool {
        if !self.path.is_empty() {
            self.path.close_figure();
        }
        true
    }
}

// ============================================================================
// Path Lifecycle API
// ============================================================================

/// Begin recording a path on the device context. Any committed path is
/// discarded; if a recording is already open this is a no-op.
pub fn begin_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        if matches!(dc.drivers.last(), Some(Driver::Path(_))) {
            // recording already open, nothing to do
            return true;
        }

        let mut start = [dc.current_pos];
        dc.transform.lp_to_dp(&mut start);

        dc.drivers.push(Driver::Path(PathDriver::new(start[0])));
        dc.path = None;
        log::debug!("begin_path");
        true
    })
    .unwrap_or(false)
}

/// End the recording and commit the path to the device context
pub fn end_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        if !matches!(dc.drivers.last(), Some(Driver::Path(_))) {
            crate::set_last_error(Status::CanNotComplete);
            return false;
        }

        if let Some(Driver::Path(rec)) = dc.drivers.pop() {
            log::debug!("end_path: {} entries", rec.path.len());
            dc.path = Some(rec.into_path());
        }
        true
    })
    .unwrap_or(false)
}

/// Discard any open recording and any committed path
pub fn abort_path(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| {
        if matches!(dc.drivers.last(), Some(Driver::Path(_))) {
            dc.drivers.pop();
        }
        dc.path = None;
        log::debug!("abort_path");
        true
    })
    .unwrap_or(false)
}

/// Close the current figure of the open recording
pub fn close_figure(hdc: GdiHandle) -> bool {
    dc::with_dc_mut(hdc, |dc| match dc.drivers.last_mut() {
        Some(Driver::Path(rec)) => rec.close_figure(),
        _ => {
            crate::set_last_error(Status::CanNotComplete);
            false
        }
    })
    .unwrap_or(false)
}

/// Copy out the committed path. With empty output slices, returns the entry
/// count; with undersized slices, fails with `InvalidParameter`; otherwise
/// copies the tags and the points converted back to logical coordinates.
/// Returns -1 on failure.
pub fn get_path(hdc: GdiHandle, points: &mut [Point], tags: &mut [PointType]) -> i32 {
    dc::with_dc_mut(hdc, |dc| {
        let path = match &dc.path {
            Some(p) => p,
            None => {
                crate::set_last_error(Status::CanNotComplete);
                return -1;
            }
        };

        let count = path.len();
        let size = points.len().min(tags.len());

        if size == 0 {
            return count as i32;
        }
        if size < count {
            crate::set_last_error(Status::InvalidParameter);
            return -1;
        }

        points[..count].copy_from_slice(path.points());
        tags[..count].copy_from_slice(path.tags());

        if !dc.transform.dp_to_lp(&mut points[..count]) {
            crate::set_last_error(Status::CanNotComplete);
            return -1;
        }
        count as i32
    })
    .unwrap_or(-1)
}
