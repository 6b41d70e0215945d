//! Physical pixel to absolute input coordinate conversion
//!
//! Absolute mouse moves address the virtual desktop as a fixed-point
//! `0..=65535` range on each axis, independent of resolution. This module
//! maps physical pixels into that range.
//!
//! CRITICAL: The virtual desktop origin can be negative when monitors sit to
//! the left of or above the primary monitor. Bounds are queried fresh on every
//! call so monitor hot-plug and resolution changes are seen immediately.

use std::sync::Arc;

use tracing::debug;

use crate::domain::core::{ABSOLUTE_MAX, ABSOLUTE_SPAN};
use crate::domain::{NormalizedPoint, ScreenBounds, ScreenPoint};
use crate::error::PlatformResult;
use crate::platform::ScreenQuery;

/// Maps a physical point into the absolute input range of `bounds`
///
/// `n = round((p - origin) / extent * 65536)`, clamped to `0..=65535`.
/// A degenerate extent maps to 0 on that axis.
pub fn normalize(point: ScreenPoint, bounds: ScreenBounds) -> NormalizedPoint {
    NormalizedPoint {
        x: normalize_axis(point.x, bounds.left, bounds.width),
        y: normalize_axis(point.y, bounds.top, bounds.height),
    }
}

fn normalize_axis(value: i32, origin: i32, extent: i32) -> i32 {
    if extent <= 0 {
        return 0;
    }
    let offset = f64::from(value) - f64::from(origin);
    let scaled = (offset / f64::from(extent) * ABSOLUTE_SPAN).round();
    scaled.clamp(0.0, f64::from(ABSOLUTE_MAX)) as i32
}

/// Validates and normalizes points against the live virtual desktop
#[derive(Clone)]
pub struct CoordinateNormalizer {
    screen: Arc<dyn ScreenQuery>,
}

impl CoordinateNormalizer {
    pub fn new(screen: Arc<dyn ScreenQuery>) -> Self {
        Self { screen }
    }

    /// Current virtual desktop bounds, never cached
    pub fn virtual_screen_bounds(&self) -> PlatformResult<ScreenBounds> {
        self.screen.virtual_screen_bounds()
    }

    /// Checks that `point` lies on the current virtual desktop
    ///
    /// # Returns
    /// Whether the point is inside, together with the bounds that were used
    /// so callers can report them on failure.
    pub fn validate(&self, point: ScreenPoint) -> PlatformResult<(bool, ScreenBounds)> {
        let bounds = self.virtual_screen_bounds()?;
        let valid = bounds.is_valid() && bounds.contains(point);
        debug!(%point, %bounds, valid, "validated coordinates");
        Ok((valid, bounds))
    }
}
