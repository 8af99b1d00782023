//! Device Context (DC) Implementation
//!
//! A Device Context is the primary object for drawing operations. It
//! carries the drawing state consumed by the path recorder (world-to-device
//! transform, current position, arc direction, fill mode, selected pen,
//! miter limit), the stack of drawing drivers, the committed path, and the
//! save/restore stack.
//!
//! # Driver Stack
//!
//! Every drawing call is dispatched through the context's driver stack.
//! `begin_path` pushes a recording driver; between `begin_path` and
//! `end_path` geometric primitives are intercepted and recorded into a
//! path instead of being rendered.

use crate::draw::{DisplayDriver, Driver};
use crate::path::{Path, PathDriver, RecordCtx};
use crate::xform::{GraphicsMode, ModifyMode, TransformState, XForm};
use crate::{GdiHandle, ObjectType, Point, Status};
use spin::Mutex;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of device contexts
pub const MAX_DC_COUNT: usize = 256;

// ============================================================================
// DC Attributes
// ============================================================================

/// Polygon fill mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Odd-even rule
    #[default]
    Alternate = 1,
    /// Non-zero winding rule
    Winding = 2,
}

/// Arc sweep direction
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArcDirection {
    #[default]
    CounterClockwise = 1,
    Clockwise = 2,
}

// ============================================================================
// Device Context Structure
// ============================================================================

/// Device Context state
#[derive(Debug, Clone)]
pub struct DeviceContext {
    /// Current pen position (logical coords)
    pub current_pos: Point,

    /// Currently selected pen
    pub pen: GdiHandle,

    /// Clipping region
    pub clip_region: GdiHandle,

    /// Polygon fill mode
    pub fill_mode: FillMode,

    /// Arc sweep direction
    pub arc_direction: ArcDirection,

    /// Miter length limit for the widener
    pub miter_limit: f64,

    /// Coordinate transform state
    pub transform: TransformState,

    /// Committed path (between `end_path` and its consumption)
    pub path: Option<Path>,

    /// Drawing driver stack; the bottom entry is the display driver
    pub drivers: Vec<Driver>,

    /// Save/restore snapshots
    saved: Vec<SavedDc>,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self {
            current_pos: Point::new(0, 0),
            pen: crate::pen::get_stock_pen(1), // BLACK_PEN
            clip_region: GdiHandle::NULL,
            fill_mode: FillMode::Alternate,
            arc_direction: ArcDirection::CounterClockwise,
            miter_limit: 10.0,
            transform: TransformState::default(),
            path: None,
            drivers: vec![Driver::Display(DisplayDriver)],
            saved: Vec::new(),
        }
    }
}

impl DeviceContext {
    /// Snapshot of the state a recording operation consumes
    pub fn record_ctx(&self) -> RecordCtx {
        RecordCtx {
            to_device: self.transform.to_device(),
            graphics_mode: self.transform.graphics_mode,
        }
    }

    /// The open recording driver, if a path is being recorded
    pub fn recorder(&mut self) -> Option<&mut PathDriver> {
        match self.drivers.last_mut() {
            Some(Driver::Path(rec)) => Some(rec),
            _ => None,
        }
    }
}

/// One save/restore snapshot
#[derive(Debug, Clone)]
struct SavedDc {
    current_pos: Point,
    pen: GdiHandle,
    clip_region: GdiHandle,
    fill_mode: FillMode,
    arc_direction: ArcDirection,
    miter_limit: f64,
    transform: TransformState,
    path: Option<Path>,
    recording: Option<PathDriver>,
}

// ============================================================================
// DC Table
// ============================================================================

struct DcEntry {
    dc: Option<DeviceContext>,
}

static DC_TABLE: Mutex<DcTable> = Mutex::new(DcTable::new());

struct DcTable {
    entries: [DcEntry; MAX_DC_COUNT],
}

impl DcTable {
    const fn new() -> Self {
        const EMPTY: DcEntry = DcEntry { dc: None };
        Self { entries: [EMPTY; MAX_DC_COUNT] }
    }
}

// ============================================================================
// DC Management
// ============================================================================

/// Allocate a new DC slot
fn allocate_dc_slot() -> Option<u16> {
    let table = DC_TABLE.lock();

    for i in 1..MAX_DC_COUNT {
        if table.entries[i].dc.is_none() {
            return Some(i as u16);
        }
    }

    None
}

/// Create a device context
pub fn create_dc() -> Result<GdiHandle, Status> {
    crate::init();

    let index = allocate_dc_slot().ok_or(Status::NotEnoughMemory)?;
    let dc = DeviceContext::default();
    let handle = GdiHandle::new(index, ObjectType::Dc);

    {
        let mut table = DC_TABLE.lock();
        table.entries[index as usize].dc = Some(dc);
    }

    crate::inc_dc_count();
    log::debug!("create_dc: {:#x}", handle.raw());

    Ok(handle)
}

/// Delete a DC, releasing its committed path and any open recording
pub fn delete_dc(hdc: GdiHandle) -> bool {
    if hdc.object_type() != ObjectType::Dc {
        return false;
    }

    let index = hdc.index() as usize;
    if index >= MAX_DC_COUNT {
        return false;
    }

    let mut table = DC_TABLE.lock();
    if table.entries[index].dc.is_some() {
        table.entries[index].dc = None;
        crate::dec_dc_count();
        true
    } else {
        false
    }
}

/// Get mutable access to a DC (via callback)
pub fn with_dc_mut<F, R>(hdc: GdiHandle, f: F) -> Option<R>
where
    F: FnOnce(&mut DeviceContext) -> R,
{
    if hdc.object_type() != ObjectType::Dc {
        return None;
    }

    let index = hdc.index() as usize;
    if index >= MAX_DC_COUNT {
        return None;
    }

    let mut table = DC_TABLE.lock();
    table.entries[index].dc.as_mut().map(f)
}

// ============================================================================
// DC Operations
// ============================================================================

/// Select a pen or region into the DC, returns the previous object
pub fn select_object(hdc: GdiHandle, obj: GdiHandle) -> GdiHandle {
    with_dc_mut(hdc, |dc| match obj.object_type() {
        ObjectType::Pen => {
            let prev = dc.pen;
            dc.pen = obj;
            prev
        }
        ObjectType::Region => {
            let prev = dc.clip_region;
            dc.clip_region = obj;
            prev
        }
        _ => GdiHandle::NULL,
    })
    .unwrap_or(GdiHandle::NULL)
}

/// Get current position (logical coords)
pub fn get_current_position(hdc: GdiHandle) -> Point {
    with_dc_mut(hdc, |dc| dc.current_pos).unwrap_or(Point::new(0, 0))
}

/// Set the arc sweep direction, returns the previous direction
pub fn set_arc_direction(hdc: GdiHandle, dir: ArcDirection) -> ArcDirection {
    with_dc_mut(hdc, |dc| {
        let prev = dc.arc_direction;
        dc.arc_direction = dir;
        prev
    })
    .unwrap_or(ArcDirection::CounterClockwise)
}

/// Set the polygon fill mode, returns the previous mode
pub fn set_poly_fill_mode(hdc: GdiHandle, mode: FillMode) -> FillMode {
    with_dc_mut(hdc, |dc| {
        let prev = dc.fill_mode;
        dc.fill_mode = mode;
        prev
    })
    .unwrap_or(FillMode::Alternate)
}

/// Get the polygon fill mode
pub fn get_poly_fill_mode(hdc: GdiHandle) -> FillMode {
    with_dc_mut(hdc, |dc| dc.fill_mode).unwrap_or(FillMode::Alternate)
}

/// Set the miter limit, returns the previous limit
pub fn set_miter_limit(hdc: GdiHandle, limit: f64) -> f64 {
    with_dc_mut(hdc, |dc| {
        let prev = dc.miter_limit;
        dc.miter_limit = limit;
        prev
    })
    .unwrap_or(10.0)
}

/// Set the graphics mode. Switching modes resets the world transform.
pub fn set_graphics_mode(hdc: GdiHandle, mode: GraphicsMode) -> Option<GraphicsMode> {
    with_dc_mut(hdc, |dc| {
        let prev = dc.transform.graphics_mode;
        dc.transform.graphics_mode = mode;
        if mode != prev {
            dc.transform.world = XForm::identity();
        }
        prev
    })
}

/// Set the world transform; only valid in advanced graphics mode
pub fn set_world_transform(hdc: GdiHandle, xform: &XForm) -> bool {
    with_dc_mut(hdc, |dc| {
        if dc.transform.graphics_mode != GraphicsMode::Advanced {
            return false;
        }
        dc.transform.world = *xform;
        true
    })
    .unwrap_or(false)
}

/// Get the world transform
pub fn get_world_transform(hdc: GdiHandle) -> Option<XForm> {
    with_dc_mut(hdc, |dc| dc.transform.world)
}

/// Modify the world transform; only valid in advanced graphics mode
pub fn modify_world_transform(hdc: GdiHandle, xform: &XForm, mode: ModifyMode) -> bool {
    with_dc_mut(hdc, |dc| {
        if dc.transform.graphics_mode != GraphicsMode::Advanced {
            return false;
        }
        match mode {
            ModifyMode::Identity => dc.transform.world = XForm::identity(),
            ModifyMode::LeftMultiply => {
                dc.transform.world = xform.multiply(&dc.transform.world)
            }
            ModifyMode::RightMultiply => {
                dc.transform.world = dc.transform.world.multiply(xform)
            }
        }
        true
    })
    .unwrap_or(false)
}

/// Set the viewport origin, returns the previous origin
pub fn set_viewport_org(hdc: GdiHandle, x: i32, y: i32) -> Point {
    with_dc_mut(hdc, |dc| {
        let prev = dc.transform.viewport_org;
        dc.transform.viewport_org = Point::new(x, y);
        prev
    })
    .unwrap_or(Point::new(0, 0))
}

/// Set the window origin, returns the previous origin
pub fn set_window_org(hdc: GdiHandle, x: i32, y: i32) -> Point {
    with_dc_mut(hdc, |dc| {
        let prev = dc.transform.window_org;
        dc.transform.window_org = Point::new(x, y);
        prev
    })
    .unwrap_or(Point::new(0, 0))
}

/// Transform logical points to device points
pub fn lp_to_dp(hdc: GdiHandle, points: &mut [Point]) -> bool {
    with_dc_mut(hdc, |dc| {
        dc.transform.lp_to_dp(points);
        true
    })
    .unwrap_or(false)
}

/// Transform device points to logical points
pub fn dp_to_lp(hdc: GdiHandle, points: &mut [Point]) -> bool {
    with_dc_mut(hdc, |dc| dc.transform.dp_to_lp(points)).unwrap_or(false)
}

// ============================================================================
// Save / Restore
// ============================================================================

/// Save the DC state, including deep copies of the committed path and any
/// in-progress recording. Returns the new stack depth, or 0 on failure.
pub fn save_dc(hdc: GdiHandle) -> i32 {
    with_dc_mut(hdc, |dc| {
        let recording = match dc.drivers.last() {
            Some(Driver::Path(rec)) => Some(rec.clone()),
            _ => None,
        };

        let snap = SavedDc {
            current_pos: dc.current_pos,
            pen: dc.pen,
            clip_region: dc.clip_region,
            fill_mode: dc.fill_mode,
            arc_direction: dc.arc_direction,
            miter_limit: dc.miter_limit,
            transform: dc.transform.clone(),
            path: dc.path.clone(),
            recording,
        };
        dc.saved.push(snap);
        dc.saved.len() as i32
    })
    .unwrap_or(0)
}

/// Restore a saved DC state. A negative level is relative to the top of the
/// stack (-1 restores the most recent save); a positive level is absolute.
pub fn restore_dc(hdc: GdiHandle, level: i32) -> bool {
    with_dc_mut(hdc, |dc| {
        let depth = dc.saved.len() as i32;
        let target = if level < 0 { depth + level + 1 } else { level };
        if target < 1 || target > depth {
            return false;
        }

        let snap = match dc.saved.drain((target - 1) as usize..).next() {
            Some(snap) => snap,
            None => return false,
        };

        dc.current_pos = snap.current_pos;
        dc.pen = snap.pen;
        dc.clip_region = snap.clip_region;
        dc.fill_mode = snap.fill_mode;
        dc.arc_direction = snap.arc_direction;
        dc.miter_limit = snap.miter_limit;
        dc.transform = snap.transform;
        dc.path = snap.path;

        // Drop the live recording, then re-open the saved one if present
        if matches!(dc.drivers.last(), Some(Driver::Path(_))) {
            dc.drivers.pop();
        }
        if let Some(rec) = snap.recording {
            dc.drivers.push(Driver::Path(rec));
        }
        true
    })
    .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_select_delete() {
        let hdc = create_dc().unwrap();
        let pen = crate::pen::ext_create_pen(
            crate::pen::PenStyle::GEOMETRIC,
            3,
            crate::ColorRef::BLACK,
        );

        let prev = select_object(hdc, pen);
        assert!(prev.is_valid()); // default stock pen
        assert_eq!(select_object(hdc, prev), pen);

        assert!(delete_dc(hdc));
        assert!(!delete_dc(hdc));
        crate::pen::delete_pen(pen);
    }

    #[test]
    fn save_restore_round_trips_attributes() {
        let hdc = create_dc().unwrap();

        set_poly_fill_mode(hdc, FillMode::Winding);
        set_miter_limit(hdc, 4.0);
        let depth = save_dc(hdc);
        assert_eq!(depth, 1);

        set_poly_fill_mode(hdc, FillMode::Alternate);
        set_arc_direction(hdc, ArcDirection::Clockwise);

        assert!(restore_dc(hdc, -1));
        assert_eq!(get_poly_fill_mode(hdc), FillMode::Winding);
        let restored = with_dc_mut(hdc, |dc| (dc.miter_limit, dc.arc_direction)).unwrap();
        assert_eq!(restored, (4.0, ArcDirection::CounterClockwise));

        assert!(!restore_dc(hdc, -1));
        delete_dc(hdc);
    }

    #[test]
    fn world_transform_requires_advanced_mode() {
        let hdc = create_dc().unwrap();
        let scale = XForm::scale(2.0, 2.0);

        assert!(!set_world_transform(hdc, &scale));
        set_graphics_mode(hdc, GraphicsMode::Advanced);
        assert!(set_world_transform(hdc, &scale));

        // switching modes resets the transform
        set_graphics_mode(hdc, GraphicsMode::Compatible);
        set_graphics_mode(hdc, GraphicsMode::Advanced);
        assert!(get_world_transform(hdc).unwrap().is_identity());

        delete_dc(hdc);
    }
}
