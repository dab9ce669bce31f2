//! Geometry primitives for the placement engine
//!
//! Two coordinate spaces are in play:
//! - Document space: the floor plan's own coordinates, independent of pan/zoom
//! - Screen space: where the pointer is reported after the viewport applied
//!   its pan and zoom
//!
//! Bounding boxes use the document's convention of a top-left origin with
//! `width`/`height` extending right and down.

use serde::{Deserialize, Serialize};

/// Point in document space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentPoint {
    pub x: f64,
    pub y: f64,
}

impl DocumentPoint {
    /// Create a new document point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &DocumentPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Point in screen space, as reported by pointer events
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Shift the point back by a grab offset
    pub fn minus_offset(&self, offset: PointerOffset) -> Self {
        Self { x: self.x - offset.dx, y: self.y - offset.dy }
    }

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Distance between where the pointer grabbed an item and the item's anchor,
/// in screen units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerOffset {
    pub dx: f64,
    pub dy: f64,
}

impl PointerOffset {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Axis-aligned bounding box in document space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Create a box from its origin and size
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a box spanning two arbitrary corners
    pub fn from_corners(a: DocumentPoint, b: DocumentPoint) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self {
            x: min_x,
            y: min_y,
            width: a.x.max(b.x) - min_x,
            height: a.y.max(b.y) - min_y,
        }
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Center of the box
    pub fn center(&self) -> DocumentPoint {
        DocumentPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Boundary-inclusive containment test
    pub fn contains(&self, point: &DocumentPoint) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }

    /// Finite origin and non-negative finite size
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Affine viewport matrix mapping document space to screen space
///
/// Laid out like an SVG/canvas matrix `[a b c d e f]`:
/// - `screen.x = a * x + c * y + e`
/// - `screen.y = b * x + d * y + f`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform =
        ViewportTransform { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    /// Create a transform from raw matrix components
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Uniform zoom followed by a pan, the shape a pan/zoom controller produces
    pub fn pan_zoom(zoom: f64, pan_x: f64, pan_y: f64) -> Self {
        Self { a: zoom, b: 0.0, c: 0.0, d: zoom, e: pan_x, f: pan_y }
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f].iter().all(|v| v.is_finite())
    }

    /// Map a document point into screen space
    pub fn apply(&self, point: DocumentPoint) -> ScreenPoint {
        ScreenPoint::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
