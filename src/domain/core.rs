//! Core domain types and operations
//!
//! This module defines pure geometry types that work exclusively with
//! physical pixels and have no knowledge of Win32 or DPI concepts.

use serde::{Deserialize, Serialize};

/// Upper bound of the absolute input coordinate range (inclusive)
pub const ABSOLUTE_MAX: i32 = 65535;

/// Number of absolute units spanning the full virtual desktop extent
pub const ABSOLUTE_SPAN: f64 = 65536.0;

/// A location on the virtual desktop in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    /// Creates a new point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Signed per-axis distance from `other` to this point
    pub fn delta_from(&self, other: ScreenPoint) -> (i32, i32) {
        (self.x - other.x, self.y - other.y)
    }

    /// Returns true if both axes are within `tolerance` pixels of `other`
    pub fn is_near(&self, other: ScreenPoint, tolerance: u32) -> bool {
        let (dx, dy) = self.delta_from(other);
        dx.unsigned_abs() <= tolerance && dy.unsigned_abs() <= tolerance
    }
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The union rectangle of every attached monitor
///
/// `left` and `top` may be negative when a monitor sits to the left of or
/// above the primary one. Bounds are always re-queried from the platform and
/// never cached across operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl ScreenBounds {
    /// Creates new bounds
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Returns the right edge coordinate (exclusive)
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Returns the bottom edge coordinate (exclusive)
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Returns true if the bounds describe a usable, non-empty desktop
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Returns true if these bounds contain the given point
    ///
    /// Left and top edges are inclusive, right and bottom edges exclusive.
    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }

    /// Returns the bounding box that contains both rectangles
    pub fn union(&self, other: &ScreenBounds) -> ScreenBounds {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());

        ScreenBounds::new(left, top, right - left, bottom - top)
    }
}

impl std::fmt::Display for ScreenBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({}, {}) - ({}, {})]",
            self.left,
            self.top,
            self.right(),
            self.bottom()
        )
    }
}

/// A point in the fixed-point absolute input range
///
/// Both axes lie in `0..=65535`. Values are only produced by
/// [`crate::input::normalizer::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: i32,
    pub y: i32,
}

/// Opaque OS window identifier
///
/// The handle is never owned: the OS controls the window's lifetime and a
/// handle is resolved per call, never retained. Zero means "no window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    /// The "no window" handle
    pub const NULL: WindowHandle = WindowHandle(0);

    /// Returns true if this is the "no window" handle
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
