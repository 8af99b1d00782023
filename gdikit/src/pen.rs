//! Pen Implementation
//!
//! Pens describe how zero-width paths become stroked outlines.
//!
//! # Pen Types
//!
//! - **Cosmetic**: Thin lines (1 pixel wide in device units); cannot be
//!   used for path widening
//! - **Geometric**: Lines with width, end caps, join styles

use crate::{ColorRef, GdiHandle, ObjectType};
use spin::Mutex;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of pens
pub const MAX_PENS: usize = 256;

/// Number of stock pens
pub const STOCK_PEN_COUNT: usize = 3;

// ============================================================================
// Types
// ============================================================================

bitflags::bitflags! {
    /// Pen style word: line style, end cap, join, and pen type bitfields
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PenStyle: u32 {
        const SOLID         = 0x0000_0000;
        const DASH          = 0x0000_0001;
        const DOT           = 0x0000_0002;
        const DASHDOT       = 0x0000_0003;
        const DASHDOTDOT    = 0x0000_0004;
        const NULL          = 0x0000_0005;
        const INSIDEFRAME   = 0x0000_0006;
        const STYLE_MASK    = 0x0000_000F;

        const ENDCAP_ROUND  = 0x0000_0000;
        const ENDCAP_SQUARE = 0x0000_0100;
        const ENDCAP_FLAT   = 0x0000_0200;
        const ENDCAP_MASK   = 0x0000_0F00;

        const JOIN_ROUND    = 0x0000_0000;
        const JOIN_BEVEL    = 0x0000_1000;
        const JOIN_MITER    = 0x0000_2000;
        const JOIN_MASK     = 0x0000_F000;

        const COSMETIC      = 0x0000_0000;
        const GEOMETRIC     = 0x0001_0000;
        const TYPE_MASK     = 0x000F_0000;
    }
}

/// End cap style (geometric pens)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndCap {
    #[default]
    Round = 0,
    Square = 1,
    Flat = 2,
}

/// Line join style (geometric pens)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Round = 0,
    Bevel = 1,
    Miter = 2,
}

// ============================================================================
// Pen Structure
// ============================================================================

/// Pen object
#[derive(Debug, Clone, Copy)]
pub struct Pen {
    /// Full style word (line style | end cap | join | type)
    pub style: PenStyle,

    /// Pen width (in logical units)
    pub width: i32,

    /// Pen color
    pub color: ColorRef,

    /// Is stock object
    pub stock: bool,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            style: PenStyle::SOLID,
            width: 1,
            color: ColorRef::BLACK,
            stock: false,
        }
    }
}

impl Pen {
    /// Decode the end-cap bits of the style word
    pub fn end_cap(&self) -> EndCap {
        let cap = self.style & PenStyle::ENDCAP_MASK;
        if cap == PenStyle::ENDCAP_SQUARE {
            EndCap::Square
        } else if cap == PenStyle::ENDCAP_FLAT {
            EndCap::Flat
        } else {
            EndCap::Round
        }
    }

    /// Decode the join bits of the style word
    pub fn join(&self) -> LineJoin {
        let join = self.style & PenStyle::JOIN_MASK;
        if join == PenStyle::JOIN_BEVEL {
            LineJoin::Bevel
        } else if join == PenStyle::JOIN_MITER {
            LineJoin::Miter
        } else {
            LineJoin::Round
        }
    }

    /// Check whether the pen is geometric (widenable)
    pub fn is_geometric(&self) -> bool {
        self.style & PenStyle::TYPE_MASK == PenStyle::GEOMETRIC
    }
}

// ============================================================================
// Pen Table
// ============================================================================

struct PenEntry {
    pen: Option<Pen>,
}

static PEN_TABLE: Mutex<PenTable> = Mutex::new(PenTable::new());

struct PenTable {
    entries: [PenEntry; MAX_PENS],
}

impl PenTable {
    const fn new() -> Self {
        const EMPTY: PenEntry = PenEntry { pen: None };
        Self { entries: [EMPTY; MAX_PENS] }
    }
}

// Stock pen handles
static STOCK_PENS: Mutex<[GdiHandle; STOCK_PEN_COUNT]> =
    Mutex::new([GdiHandle::NULL; STOCK_PEN_COUNT]);

// ============================================================================
// Initialization
// ============================================================================

/// Create stock pens (white, black, null)
pub fn create_stock_pens() {
    let pens = [
        (ColorRef::WHITE, PenStyle::SOLID, 1), // WHITE_PEN
        (ColorRef::BLACK, PenStyle::SOLID, 1), // BLACK_PEN
        (ColorRef::BLACK, PenStyle::NULL, 0),  // NULL_PEN
    ];

    let mut stock = STOCK_PENS.lock();
    let mut table = PEN_TABLE.lock();

    for (i, (color, style, width)) in pens.iter().enumerate() {
        let pen = Pen {
            style: *style,
            width: *width,
            color: *color,
            stock: true,
        };

        // Stock pens start at index 1
        let index = (i + 1) as u16;
        table.entries[index as usize].pen = Some(pen);
        stock[i] = GdiHandle::new(index, ObjectType::Pen);

        crate::inc_pen_count();
    }

    log::debug!("created {} stock pens", STOCK_PEN_COUNT);
}

/// Get stock pen handle
pub fn get_stock_pen(index: usize) -> GdiHandle {
    if index >= STOCK_PEN_COUNT {
        return GdiHandle::NULL;
    }

    let stock = STOCK_PENS.lock();
    stock[index]
}

// ============================================================================
// Pen Operations
// ============================================================================

/// Allocate a pen slot
fn allocate_pen_slot() -> Option<u16> {
    let table = PEN_TABLE.lock();

    // Start after stock pens
    for i in (STOCK_PEN_COUNT + 1)..MAX_PENS {
        if table.entries[i].pen.is_none() {
            return Some(i as u16);
        }
    }

    None
}

fn insert_pen(pen: Pen) -> GdiHandle {
    let index = match allocate_pen_slot() {
        Some(i) => i,
        None => {
            crate::set_last_error(crate::Status::NotEnoughMemory);
            return GdiHandle::NULL;
        }
    };

    let handle = GdiHandle::new(index, ObjectType::Pen);

    {
        let mut table = PEN_TABLE.lock();
        table.entries[index as usize].pen = Some(pen);
    }

    crate::inc_pen_count();

    handle
}

/// Create a cosmetic pen from a line style, width, and color
pub fn create_pen(style: PenStyle, width: i32, color: ColorRef) -> GdiHandle {
    let style = style & PenStyle::STYLE_MASK;
    insert_pen(Pen {
        style,
        width: if style == PenStyle::NULL { 0 } else { width.max(1) },
        color,
        stock: false,
    })
}

/// Create an extended pen from a full style word (type | end cap | join |
/// line style)
pub fn ext_create_pen(style: PenStyle, width: i32, color: ColorRef) -> GdiHandle {
    insert_pen(Pen {
        style,
        width: if style & PenStyle::STYLE_MASK == PenStyle::NULL { 0 } else { width.max(1) },
        color,
        stock: false,
    })
}

/// Delete a pen
pub fn delete_pen(handle: GdiHandle) -> bool {
    if handle.object_type() != ObjectType::Pen {
        return false;
    }

    let index = handle.index() as usize;
    if index >= MAX_PENS {
        return false;
    }

    let mut table = PEN_TABLE.lock();

    if let Some(ref pen) = table.entries[index].pen {
        // Can't delete stock objects
        if pen.stock {
            return false;
        }
    }

    if table.entries[index].pen.is_some() {
        table.entries[index].pen = None;
        crate::dec_pen_count();
        true
    } else {
        false
    }
}

/// Get pen by handle
pub fn get_pen(handle: GdiHandle) -> Option<Pen> {
    if handle.object_type() != ObjectType::Pen {
        return None;
    }

    let index = handle.index() as usize;
    if index >= MAX_PENS {
        return None;
    }

    let table = PEN_TABLE.lock();
    table.entries[index].pen
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn style_word_decodes_cap_and_join() {
        let pen = Pen {
            style: PenStyle::GEOMETRIC | PenStyle::ENDCAP_FLAT | PenStyle::JOIN_MITER,
            width: 4,
            color: ColorRef::BLACK,
            stock: false,
        };
        assert_eq!(pen.end_cap(), EndCap::Flat);
        assert_eq!(pen.join(), LineJoin::Miter);
        assert!(pen.is_geometric());

        let cosmetic = Pen::default();
        assert_eq!(cosmetic.end_cap(), EndCap::Round);
        assert_eq!(cosmetic.join(), LineJoin::Round);
        assert!(!cosmetic.is_geometric());
    }

    #[test]
    fn pen_table_create_get_delete() {
        let h = ext_create_pen(PenStyle::GEOMETRIC | PenStyle::ENDCAP_SQUARE, 7, ColorRef::WHITE);
        assert!(h.is_valid());

        let pen = get_pen(h).unwrap();
        assert_eq!(pen.width, 7);
        assert_eq!(pen.end_cap(), EndCap::Square);

        assert!(delete_pen(h));
        assert!(get_pen(h).is_none());
        assert!(!delete_pen(h));
    }
}
