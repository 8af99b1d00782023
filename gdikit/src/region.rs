//! Region Implementation
//!
//! Regions define arbitrary areas for clipping and hit testing. The
//! constructor consumed by the path bridge builds a region from an array
//! of polygon points plus per-polygon sizes, honoring the alternate
//! (odd-even) or winding (non-zero) fill rule via a scanline pass.

use crate::dc::FillMode;
use crate::path::{Path, PointType};
use crate::{GdiHandle, ObjectType, Point, Rect};
use spin::Mutex;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of regions
pub const MAX_REGIONS: usize = 256;

// ============================================================================
// Region Structure
// ============================================================================

/// Region combine mode
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    And = 1,
    Or = 2,
    Xor = 3,
    Diff = 4,
    Copy = 5,
}

/// Region object: a set of non-overlapping scanline spans
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Span rectangles, ordered by row
    pub rects: Vec<Rect>,
    /// Bounding rectangle
    pub bounds: Rect,
}

impl Region {
    /// Check if a point is in the region
    pub fn contains_point(&self, pt: Point) -> bool {
        self.bounds.contains_point(pt) && self.rects.iter().any(|r| r.contains_point(pt))
    }

    fn recompute_bounds(&mut self) {
        self.bounds = match self.rects.first() {
            Some(first) => self.rects.iter().skip(1).fold(*first, |b, r| b.union(r)),
            None => Rect::default(),
        };
    }
}

// ============================================================================
// Region Table
// ============================================================================

struct RegionEntry {
    region: Option<Region>,
}

static REGION_TABLE: Mutex<RegionTable> = Mutex::new(RegionTable::new());

struct RegionTable {
    entries: [RegionEntry; MAX_REGIONS],
}

impl RegionTable {
    const fn new() -> Self {
        const EMPTY: RegionEntry = RegionEntry { region: None };
        Self { entries: [EMPTY; MAX_REGIONS] }
    }
}

fn allocate_region_slot() -> Option<u16> {
    let table = REGION_TABLE.lock();

    for i in 1..MAX_REGIONS {
        if table.entries[i].region.is_none() {
            return Some(i as u16);
        }
    }

    None
}

fn insert_region(region: Region) -> GdiHandle {
    let index = match allocate_region_slot() {
        Some(i) => i,
        None => {
            crate::set_last_error(crate::Status::NotEnoughMemory);
            return GdiHandle::NULL;
        }
    };

    let handle = GdiHandle::new(index, ObjectType::Region);

    {
        let mut table = REGION_TABLE.lock();
        table.entries[index as usize].region = Some(region);
    }

    crate::inc_region_count();

    handle
}

/// Delete a region
pub fn delete_region(handle: GdiHandle) -> bool {
    if handle.object_type() != ObjectType::Region {
        return false;
    }

    let index = handle.index() as usize;
    if index >= MAX_REGIONS {
        return false;
    }

    let mut table = REGION_TABLE.lock();
    if table.entries[index].region.is_some() {
        table.entries[index].region = None;
        crate::dec_region_count();
        true
    } else {
        false
    }
}

/// Get region by handle
pub fn get_region(handle: GdiHandle) -> Option<Region> {
    if handle.object_type() != ObjectType::Region {
        return None;
    }

    let index = handle.index() as usize;
    if index >= MAX_REGIONS {
        return None;
    }

    let table = REGION_TABLE.lock();
    table.entries[index].region.clone()
}

// ============================================================================
// Region Construction
// ============================================================================

/// Create a rectangular region
pub fn create_rect_region(left: i32, top: i32, right: i32, bottom: i32) -> GdiHandle {
    let rect = Rect::new(left, top, right, bottom);
    let mut region = Region::default();
    if !rect.is_empty() {
        region.rects.push(rect);
        region.bounds = rect;
    }
    insert_region(region)
}

/// Create a region from an array of polygon points plus per-polygon sizes.
/// Edges are scanned row by row; the fill rule decides which spans between
/// edge crossings belong to the region.
pub fn create_poly_polygon_region(
    points: &[Point],
    counts: &[usize],
    mode: FillMode,
) -> GdiHandle {
    let total: usize = counts.iter().sum();
    if counts.is_empty() || total > points.len() {
        crate::set_last_error(crate::Status::InvalidParameter);
        return GdiHandle::NULL;
    }

    // Collect the closing edge of each polygon along with its interior ones
    let mut edges: Vec<(Point, Point)> = Vec::new();
    let mut base = 0;
    for &count in counts {
        let poly = &points[base..base + count];
        for i in 0..poly.len() {
            let p1 = poly[i];
            let p2 = poly[(i + 1) % poly.len()];
            if p1.y != p2.y {
                edges.push((p1, p2));
            }
        }
        base += count;
    }

    let mut region = Region::default();
    if edges.is_empty() {
        return insert_region(region);
    }

    let min_y = edges.iter().map(|e| e.0.y.min(e.1.y)).min().unwrap_or(0);
    let max_y = edges.iter().map(|e| e.0.y.max(e.1.y)).max().unwrap_or(0);

    for y in min_y..max_y {
        // Crossings of this scanline, with the edge winding direction
        let mut crossings: Vec<(i32, i32)> = Vec::new();
        for (p1, p2) in &edges {
            let (y_min, y_max, dir) = if p1.y < p2.y {
                (p1.y, p2.y, 1)
            } else {
                (p2.y, p1.y, -1)
            };
            if y >= y_min && y < y_max {
                let x = p1.x
                    + ((y - p1.y) as i64 * (p2.x - p1.x) as i64 / (p2.y - p1.y) as i64) as i32;
                crossings.push((x, dir));
            }
        }
        crossings.sort_unstable();

        match mode {
            FillMode::Alternate => {
                for pair in crossings.chunks(2) {
                    if let [(x1, _), (x2, _)] = pair {
                        if x1 < x2 {
                            region.rects.push(Rect::new(*x1, y, *x2, y + 1));
                        }
                    }
                }
            }
            FillMode::Winding => {
                let mut winding = 0;
                let mut span_start = 0;
                for (x, dir) in &crossings {
                    let was_inside = winding != 0;
                    winding += dir;
                    if !was_inside && winding != 0 {
                        span_start = *x;
                    } else if was_inside && winding == 0 && span_start < *x {
                        region.rects.push(Rect::new(span_start, y, *x, y + 1));
                    }
                }
            }
        }
    }

    region.recompute_bounds();
    insert_region(region)
}

/// Combine two regions into `dest`. All modes operate on the span lists;
/// `Or`, `Diff`, and `Xor` keep the spans disjoint by splitting one side's
/// rects around the other's.
pub fn combine_region(
    dest: GdiHandle,
    src1: GdiHandle,
    src2: GdiHandle,
    mode: CombineMode,
) -> bool {
    let rgn1 = match get_region(src1) {
        Some(r) => r,
        None => return false,
    };

    if mode == CombineMode::Copy {
        return set_region(dest, rgn1);
    }

    let rgn2 = match get_region(src2) {
        Some(r) => r,
        None => return false,
    };

    let mut result = Region::default();
    match mode {
        CombineMode::And => {
            for r1 in &rgn1.rects {
                for r2 in &rgn2.rects {
                    if let Some(r) = r1.intersect(r2) {
                        result.rects.push(r);
                    }
                }
            }
        }
        CombineMode::Or => {
            // keep the spans disjoint: take rgn1 whole, then only the parts
            // of rgn2 outside it
            result.rects = rgn1.rects.clone();
            result.rects.extend(subtract_all(&rgn2.rects, &rgn1.rects));
        }
        CombineMode::Diff => {
            result.rects = subtract_all(&rgn1.rects, &rgn2.rects);
        }
        CombineMode::Xor => {
            result.rects = subtract_all(&rgn1.rects, &rgn2.rects);
            result.rects.extend(subtract_all(&rgn2.rects, &rgn1.rects));
        }
        CombineMode::Copy => unreachable!(),
    }
    result.recompute_bounds();
    set_region(dest, result)
}

/// Split `r` around `sub`, keeping the parts outside `sub`
fn subtract_rect(r: &Rect, sub: &Rect, out: &mut Vec<Rect>) {
    let ix = match r.intersect(sub) {
        Some(ix) => ix,
        None => {
            out.push(*r);
            return;
        }
    };
    if ix.top > r.top {
        out.push(Rect::new(r.left, r.top, r.right, ix.top));
    }
    if ix.bottom < r.bottom {
        out.push(Rect::new(r.left, ix.bottom, r.right, r.bottom));
    }
    if ix.left > r.left {
        out.push(Rect::new(r.left, ix.top, ix.left, ix.bottom));
    }
    if ix.right < r.right {
        out.push(Rect::new(ix.right, ix.top, r.right, ix.bottom));
    }
}

fn subtract_all(rects: &[Rect], subs: &[Rect]) -> Vec<Rect> {
    let mut current = rects.to_vec();
    for sub in subs {
        let mut next = Vec::new();
        for r in &current {
            subtract_rect(r, sub, &mut next);
        }
        current = next;
    }
    current
}

fn set_region(dest: GdiHandle, region: Region) -> bool {
    if dest.object_type() != ObjectType::Region {
        return false;
    }
    let index = dest.index() as usize;
    if index >= MAX_REGIONS {
        return false;
    }
    let mut table = REGION_TABLE.lock();
    match table.entries[index].region {
        Some(ref mut slot) => {
            *slot = region;
            true
        }
        None => false,
    }
}

// ============================================================================
// Path Bridge
// ============================================================================

/// Convert a flattened path to a region: each MOVETO starts a polygon, and
/// the flat points buffer is handed to the region constructor with the
/// per-polygon sizes. An empty path yields a null handle.
pub fn path_to_region(path: &Path, mode: FillMode) -> GdiHandle {
    if path.is_empty() {
        return GdiHandle::NULL;
    }

    let tags = path.tags();
    debug_assert_eq!(tags[0], PointType::MOVETO);

    let mut counts: Vec<usize> = Vec::new();
    let mut pos = 0;
    let mut i = 1;
    while i < tags.len() {
        if tags[i] == PointType::MOVETO {
            counts.push(i - pos);
            pos = i;
        }
        i += 1;
    }
    if i > pos + 1 {
        counts.push(i - pos);
    }

    create_poly_polygon_region(path.points(), &counts, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn square_region_spans() {
        let pts = [
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(10, 10),
            Point::new(0, 10),
        ];
        let h = create_poly_polygon_region(&pts, &[4], FillMode::Alternate);
        let region = get_region(h).unwrap();

        assert_eq!(region.bounds, Rect::new(0, 0, 10, 10));
        assert!(region.contains_point(Point::new(5, 5)));
        assert!(!region.contains_point(Point::new(15, 5)));
        delete_region(h);
    }

    #[test]
    fn fill_mode_changes_self_intersecting_result() {
        // Two nested squares wound the same way: winding keeps the hole
        // filled, alternate carves it out
        let pts = [
            // outer
            Point::new(0, 0),
            Point::new(20, 0),
            Point::new(20, 20),
            Point::new(0, 20),
            // inner, same winding
            Point::new(5, 5),
            Point::new(15, 5),
            Point::new(15, 15),
            Point::new(5, 15),
        ];
        let alt = create_poly_polygon_region(&pts, &[4, 4], FillMode::Alternate);
        let wind = create_poly_polygon_region(&pts, &[4, 4], FillMode::Winding);

        let centre = Point::new(10, 10);
        assert!(!get_region(alt).unwrap().contains_point(centre));
        assert!(get_region(wind).unwrap().contains_point(centre));

        delete_region(alt);
        delete_region(wind);
    }

    #[test]
    fn combine_and_or() {
        let a = create_rect_region(0, 0, 10, 10);
        let b = create_rect_region(5, 0, 15, 10);
        let dest = create_rect_region(0, 0, 1, 1);

        assert!(combine_region(dest, a, b, CombineMode::And));
        let and = get_region(dest).unwrap();
        assert_eq!(and.bounds, Rect::new(5, 0, 10, 10));

        assert!(combine_region(dest, a, b, CombineMode::Or));
        let or = get_region(dest).unwrap();
        assert_eq!(or.bounds, Rect::new(0, 0, 15, 10));

        // the sources overlap in (5,0)-(10,10); the union's spans must stay
        // disjoint and cover exactly the union area
        let area: i32 = or.rects.iter().map(|r| r.width() * r.height()).sum();
        assert_eq!(area, 150);
        for (i, r1) in or.rects.iter().enumerate() {
            for r2 in &or.rects[i + 1..] {
                assert!(r1.intersect(r2).is_none());
            }
        }

        delete_region(a);
        delete_region(b);
        delete_region(dest);
    }
}
