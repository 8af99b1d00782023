//! Coordinate Transforms
//!
//! World-to-device transformation support for device contexts. Logical
//! coordinates supplied by drawing calls are projected through a 2x3 affine
//! matrix before entering a path; `get_path` applies the inverse on the way
//! back out.
//!
//! # Transform Chain
//!
//! Logical coords -> World transform (advanced mode) -> Viewport/window
//! translation -> Device coords
//!
//! # Operations
//!
//! - **set_world_transform**: Set the world transformation matrix
//! - **modify_world_transform**: Modify existing transform (multiply, prepend)
//! - **set_graphics_mode**: Enable/disable advanced graphics mode

use crate::{gdi_round, FloatPoint, Point};

// ============================================================================
// Graphics Mode
// ============================================================================

/// Graphics mode controlling world transform availability and the
/// exclusive-edge rule for rectangle corners
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphicsMode {
    /// No world transform; rectangles exclude their bottom/right edges
    #[default]
    Compatible = 1,
    /// World transform enabled, inclusive rectangle edges
    Advanced = 2,
}

/// World transform modification mode
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyMode {
    Identity = 1,
    LeftMultiply = 2,
    RightMultiply = 3,
}

// ============================================================================
// Transform Matrix
// ============================================================================

/// 2D affine transformation matrix
///
/// Represented as a 3x2 matrix:
/// ```text
/// | m11  m12  0 |
/// | m21  m22  0 |
/// | dx   dy   1 |
/// ```
///
/// Transform: x' = x*m11 + y*m21 + dx
///            y' = x*m12 + y*m22 + dy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XForm {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for XForm {
    fn default() -> Self {
        Self::identity()
    }
}

impl XForm {
    /// Create identity transform
    pub const fn identity() -> Self {
        Self { m11: 1.0, m12: 0.0, m21: 0.0, m22: 1.0, dx: 0.0, dy: 0.0 }
    }

    /// Create translation transform
    pub const fn translate(dx: f64, dy: f64) -> Self {
        Self { m11: 1.0, m12: 0.0, m21: 0.0, m22: 1.0, dx, dy }
    }

    /// Create scaling transform
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self { m11: sx, m12: 0.0, m21: 0.0, m22: sy, dx: 0.0, dy: 0.0 }
    }

    /// Create rotation transform (angle in radians)
    pub fn rotate(angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self { m11: cos_a, m12: sin_a, m21: -sin_a, m22: cos_a, dx: 0.0, dy: 0.0 }
    }

    /// Multiply two transforms (self * other)
    pub fn multiply(&self, other: &XForm) -> XForm {
        XForm {
            m11: self.m11 * other.m11 + self.m12 * other.m21,
            m12: self.m11 * other.m12 + self.m12 * other.m22,
            m21: self.m21 * other.m11 + self.m22 * other.m21,
            m22: self.m21 * other.m12 + self.m22 * other.m22,
            dx: self.dx * other.m11 + self.dy * other.m21 + other.dx,
            dy: self.dx * other.m12 + self.dy * other.m22 + other.dy,
        }
    }

    /// Compute the inverse transform
    pub fn inverse(&self) -> Option<XForm> {
        let det = self.m11 * self.m22 - self.m12 * self.m21;

        if det.abs() < 1e-10 {
            return None;
        }

        let inv_det = 1.0 / det;

        Some(XForm {
            m11: self.m22 * inv_det,
            m12: -self.m12 * inv_det,
            m21: -self.m21 * inv_det,
            m22: self.m11 * inv_det,
            dx: (self.m21 * self.dy - self.m22 * self.dx) * inv_det,
            dy: (self.m12 * self.dx - self.m11 * self.dy) * inv_det,
        })
    }

    /// Transform a point
    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        let new_x = x * self.m11 + y * self.m21 + self.dx;
        let new_y = x * self.m12 + y * self.m22 + self.dy;
        (new_x, new_y)
    }

    /// Transform an integer point, rounding half up
    pub fn transform(&self, p: Point) -> Point {
        let (fx, fy) = self.transform_point(p.x as f64, p.y as f64);
        Point::new(gdi_round(fx), gdi_round(fy))
    }

    /// Check if this is an identity transform
    pub fn is_identity(&self) -> bool {
        (self.m11 - 1.0).abs() < 1e-6
            && self.m12.abs() < 1e-6
            && self.m21.abs() < 1e-6
            && (self.m22 - 1.0).abs() < 1e-6
            && self.dx.abs() < 1e-6
            && self.dy.abs() < 1e-6
    }
}

// ============================================================================
// Per-DC Transform State
// ============================================================================

/// Transform state carried by a device context
#[derive(Debug, Clone)]
pub struct TransformState {
    /// Graphics mode (compatible or advanced)
    pub graphics_mode: GraphicsMode,
    /// World transform (only applied in advanced mode)
    pub world: XForm,
    /// Viewport origin (device coords)
    pub viewport_org: Point,
    /// Window origin (logical coords)
    pub window_org: Point,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            graphics_mode: GraphicsMode::Compatible,
            world: XForm::identity(),
            viewport_org: Point::new(0, 0),
            window_org: Point::new(0, 0),
        }
    }
}

impl TransformState {
    /// Window-to-viewport translation
    fn page_transform(&self) -> XForm {
        XForm::translate(
            (self.viewport_org.x - self.window_org.x) as f64,
            (self.viewport_org.y - self.window_org.y) as f64,
        )
    }

    /// The combined world-to-device transform
    pub fn to_device(&self) -> XForm {
        match self.graphics_mode {
            GraphicsMode::Advanced => self.world.multiply(&self.page_transform()),
            GraphicsMode::Compatible => self.page_transform(),
        }
    }

    /// Transform logical points to device points in place
    pub fn lp_to_dp(&self, points: &mut [Point]) {
        let xform = self.to_device();
        for p in points.iter_mut() {
            *p = xform.transform(*p);
        }
    }

    /// Transform logical points to device points in floating point,
    /// preserving sub-pixel precision
    pub fn lp_to_dp_float(&self, points: &mut [FloatPoint]) {
        let xform = self.to_device();
        for p in points.iter_mut() {
            let (x, y) = xform.transform_point(p.x, p.y);
            p.x = x;
            p.y = y;
        }
    }

    /// Transform device points back to logical points in place; fails when
    /// the combined transform is singular
    pub fn dp_to_lp(&self, points: &mut [Point]) -> bool {
        match self.to_device().inverse() {
            Some(inv) => {
                for p in points.iter_mut() {
                    *p = inv.transform(*p);
                }
                true
            }
            None => false,
        }
    }
}
