//! General Windows platform utilities
//!
//! [`Win32Platform`] is the live implementation of every capability trait.
//! The trait impls are split across the sibling modules by concern; this
//! module holds the handle and geometry conversions they share.

use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::UI::HiDpi::{
    DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2, SetProcessDpiAwarenessContext,
};

use crate::domain::{ScreenBounds, ScreenPoint, WindowHandle};
use crate::error::{PlatformError, PlatformResult};

/// Live desktop, keyboard, window and process state of this session
///
/// Stateless: every call goes to the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Platform;

impl Win32Platform {
    pub fn new() -> Self {
        Self
    }
}

/// Opts the process into per-monitor DPI awareness
///
/// CRITICAL: Must run before any other Win32 call so cursor positions,
/// window rectangles and system metrics come back in physical pixels.
pub fn enable_per_monitor_dpi_awareness() -> PlatformResult<()> {
    unsafe { SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) }
        .map_err(win32_error("SetProcessDpiAwarenessContext"))
}

/// Wraps a failed Win32 call with the name of the call
pub fn win32_error(operation: &'static str) -> impl FnOnce(windows::core::Error) -> PlatformError {
    move |source| PlatformError::Win32 { operation, source }
}

pub fn hwnd_from_handle(handle: WindowHandle) -> HWND {
    HWND(handle.0)
}

pub fn handle_from_hwnd(hwnd: HWND) -> WindowHandle {
    WindowHandle(hwnd.0)
}

pub fn point_to_win32(point: ScreenPoint) -> POINT {
    POINT {
        x: point.x,
        y: point.y,
    }
}

pub fn point_from_win32(point: POINT) -> ScreenPoint {
    ScreenPoint::new(point.x, point.y)
}

/// Converts a Windows RECT to bounds
pub fn bounds_from_win32(rect: &RECT) -> ScreenBounds {
    ScreenBounds::new(
        rect.left,
        rect.top,
        rect.right - rect.left,
        rect.bottom - rect.top,
    )
}
