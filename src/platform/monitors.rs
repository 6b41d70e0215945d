//! Monitor enumeration and virtual desktop layout
//!
//! This module is responsible for:
//! - Enumerating all connected monitors with their DPI
//! - Describing the virtual desktop they span
//!
//! CRITICAL: Secondary monitors can have negative coordinates. The virtual
//! desktop origin is the top-left of the union, not of the primary monitor.

use serde::Serialize;
use thiserror::Error;

use crate::domain::ScreenBounds;

/// One attached monitor, in physical pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Monitor {
    /// Zero-based enumeration order
    pub index: usize,
    pub bounds: ScreenBounds,
    /// Bounds minus the taskbar and docked toolbars
    pub work_area: ScreenBounds,
    /// DPI scale factor (1.0 = 96 DPI, 1.25 = 120 DPI, etc.)
    pub dpi_scale: f32,
    pub dpi_x: u32,
    pub dpi_y: u32,
    pub is_primary: bool,
}

/// The virtual desktop rectangle as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VirtualScreenInfo {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<ScreenBounds> for VirtualScreenInfo {
    fn from(bounds: ScreenBounds) -> Self {
        Self {
            x: bounds.left,
            y: bounds.top,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// Error types for monitor operations
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Failed to enumerate monitors")]
    EnumerationFailed,
    #[error("No monitors found during enumeration")]
    NoMonitors,
}

/// Union of every monitor's bounds, or `None` for an empty list
pub fn union_bounds(monitors: &[Monitor]) -> Option<ScreenBounds> {
    let (first, rest) = monitors.split_first()?;
    Some(
        rest.iter()
            .fold(first.bounds, |acc, monitor| acc.union(&monitor.bounds)),
    )
}

pub fn primary_monitor(monitors: &[Monitor]) -> Option<&Monitor> {
    monitors.iter().find(|m| m.is_primary)
}

#[cfg(windows)]
pub use self::enumeration::enumerate_monitors;

#[cfg(windows)]
mod enumeration {
    use windows::Win32::Foundation::{BOOL, FALSE, LPARAM, RECT, TRUE};
    use windows::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO, MONITORINFOEXW,
    };
    use windows::Win32::UI::HiDpi::{GetDpiForMonitor, MDT_EFFECTIVE_DPI};

    use super::{Monitor, MonitorError};
    use crate::platform::windows::bounds_from_win32;

    /// Context for monitor enumeration callback
    struct EnumContext {
        monitors: Vec<Monitor>,
    }

    /// Callback function for monitor enumeration
    ///
    /// Keeps enumerating when one monitor fails to report its info; partial
    /// data beats no data.
    unsafe extern "system" fn enum_monitor_proc(
        hmonitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        lparam: LPARAM,
    ) -> BOOL {
        unsafe {
            let context = &mut *(lparam.0 as *mut EnumContext);

            let mut monitor_info = MONITORINFOEXW {
                monitorInfo: MONITORINFO {
                    cbSize: std::mem::size_of::<MONITORINFOEXW>() as u32,
                    ..Default::default()
                },
                ..Default::default()
            };

            if GetMonitorInfoW(hmonitor, &mut monitor_info.monitorInfo) == FALSE {
                return TRUE;
            }

            let mut dpi_x: u32 = 96;
            let mut dpi_y: u32 = 96;
            if GetDpiForMonitor(hmonitor, MDT_EFFECTIVE_DPI, &mut dpi_x, &mut dpi_y).is_err() {
                dpi_x = 96;
                dpi_y = 96;
            }

            let info = &monitor_info.monitorInfo;
            context.monitors.push(Monitor {
                index: context.monitors.len(),
                bounds: bounds_from_win32(&info.rcMonitor),
                work_area: bounds_from_win32(&info.rcWork),
                dpi_scale: dpi_x as f32 / 96.0,
                dpi_x,
                dpi_y,
                is_primary: (info.dwFlags & 1) != 0, // MONITORINFOF_PRIMARY
            });

            TRUE
        }
    }

    /// Enumerates all monitors in physical pixels
    ///
    /// Requires per-monitor DPI awareness to have been enabled first.
    pub fn enumerate_monitors() -> Result<Vec<Monitor>, MonitorError> {
        let mut context = EnumContext {
            monitors: Vec::new(),
        };

        unsafe {
            if EnumDisplayMonitors(
                None,
                None,
                Some(enum_monitor_proc),
                LPARAM(&mut context as *mut _ as isize),
            ) == FALSE
            {
                return Err(MonitorError::EnumerationFailed);
            }
        }

        if context.monitors.is_empty() {
            return Err(MonitorError::NoMonitors);
        }
        Ok(context.monitors)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(index: usize, bounds: ScreenBounds, is_primary: bool) -> Monitor {
        Monitor {
            index,
            bounds,
            work_area: ScreenBounds::new(
                bounds.left,
                bounds.top,
                bounds.width,
                bounds.height - 40,
            ),
            dpi_scale: 1.0,
            dpi_x: 96,
            dpi_y: 96,
            is_primary,
        }
    }

    #[test]
    fn union_spans_monitor_left_of_primary() {
        let monitors = [
            monitor(0, ScreenBounds::new(0, 0, 1920, 1080), true),
            monitor(1, ScreenBounds::new(-1920, 0, 1920, 1080), false),
        ];
        assert_eq!(
            union_bounds(&monitors),
            Some(ScreenBounds::new(-1920, 0, 3840, 1080))
        );
        assert_eq!(primary_monitor(&monitors).map(|m| m.index), Some(0));
    }

    #[test]
    fn union_of_stacked_monitors_with_offset() {
        let monitors = [
            monitor(0, ScreenBounds::new(0, 0, 1920, 1080), true),
            monitor(1, ScreenBounds::new(320, -1440, 2560, 1440), false),
        ];
        assert_eq!(
            union_bounds(&monitors),
            Some(ScreenBounds::new(0, -1440, 2880, 2520))
        );
    }

    #[test]
    fn no_monitors_no_union() {
        assert_eq!(union_bounds(&[]), None);
    }

    #[test]
    fn virtual_screen_info_uses_caller_field_names() {
        let info = VirtualScreenInfo::from(ScreenBounds::new(-1920, 0, 3840, 1080));
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            serde_json::json!({ "x": -1920, "y": 0, "width": 3840, "height": 1080 })
        );
    }
}
