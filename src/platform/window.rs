//! Foreground window control and window ownership queries
//!
//! CRITICAL: The foreground calls here report what the OS returned, which is
//! not proof that anything changed. `SetForegroundWindow` in particular
//! returns success while only flashing the taskbar button. Callers verify by
//! reading the foreground window back.

use std::ffi::c_void;
use std::mem::size_of;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::Security::{GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation};
use windows::Win32::System::Threading::{
    AttachThreadInput, GetCurrentProcess, GetCurrentProcessId, GetCurrentThreadId, OpenProcess,
    OpenProcessToken, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BringWindowToTop, GA_ROOT, GetAncestor, GetForegroundWindow, GetWindowThreadProcessId,
    IsIconic, IsWindow, SW_MINIMIZE, SW_RESTORE, SetForegroundWindow, ShowWindow, WindowFromPoint,
};

use super::windows::{
    Win32Platform, handle_from_hwnd, hwnd_from_handle, point_to_win32, win32_error,
};
use super::{ForegroundAccess, ProcessAccess};
use crate::domain::{ScreenPoint, WindowHandle};
use crate::error::PlatformResult;

/// Kernel handle closed on drop
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // Guaranteed cleanup
        let _ = unsafe { CloseHandle(self.0) };
    }
}

/// Reads the elevation flag from the primary token of `process`
fn token_is_elevated(process: HANDLE) -> PlatformResult<bool> {
    let mut raw_token = HANDLE::default();
    unsafe { OpenProcessToken(process, TOKEN_QUERY, &mut raw_token) }
        .map_err(win32_error("OpenProcessToken"))?;
    let token = OwnedHandle(raw_token);

    let mut elevation = TOKEN_ELEVATION::default();
    let mut returned = 0u32;
    unsafe {
        GetTokenInformation(
            token.0,
            TokenElevation,
            Some(&mut elevation as *mut TOKEN_ELEVATION as *mut c_void),
            size_of::<TOKEN_ELEVATION>() as u32,
            &mut returned,
        )
    }
    .map_err(win32_error("GetTokenInformation"))?;

    Ok(elevation.TokenIsElevated != 0)
}

impl ForegroundAccess for Win32Platform {
    fn foreground_window(&self) -> WindowHandle {
        handle_from_hwnd(unsafe { GetForegroundWindow() })
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        unsafe { IsWindow(hwnd_from_handle(window)) }.as_bool()
    }

    fn is_minimized(&self, window: WindowHandle) -> bool {
        unsafe { IsIconic(hwnd_from_handle(window)) }.as_bool()
    }

    fn set_foreground(&self, window: WindowHandle) -> bool {
        unsafe { SetForegroundWindow(hwnd_from_handle(window)) }.as_bool()
    }

    fn bring_to_top(&self, window: WindowHandle) -> bool {
        unsafe { BringWindowToTop(hwnd_from_handle(window)) }.is_ok()
    }

    fn minimize(&self, window: WindowHandle) {
        // Return value is the previous visibility, not success
        let _ = unsafe { ShowWindow(hwnd_from_handle(window), SW_MINIMIZE) };
    }

    fn restore(&self, window: WindowHandle) {
        let _ = unsafe { ShowWindow(hwnd_from_handle(window), SW_RESTORE) };
    }

    fn current_thread_id(&self) -> u32 {
        unsafe { GetCurrentThreadId() }
    }

    fn window_thread_id(&self, window: WindowHandle) -> Option<u32> {
        match unsafe { GetWindowThreadProcessId(hwnd_from_handle(window), None) } {
            0 => None,
            thread => Some(thread),
        }
    }

    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> bool {
        unsafe { AttachThreadInput(from, to, attach) }.as_bool()
    }
}

impl ProcessAccess for Win32Platform {
    fn root_window_at(&self, point: ScreenPoint) -> WindowHandle {
        unsafe {
            let hwnd = WindowFromPoint(point_to_win32(point));
            if hwnd.0 == 0 {
                return WindowHandle::NULL;
            }
            handle_from_hwnd(GetAncestor(hwnd, GA_ROOT))
        }
    }

    fn window_process_id(&self, window: WindowHandle) -> Option<u32> {
        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd_from_handle(window), Some(&mut pid as *mut u32)) };
        (pid != 0).then_some(pid)
    }

    fn current_process_id(&self) -> u32 {
        unsafe { GetCurrentProcessId() }
    }

    fn is_process_elevated(&self, pid: u32) -> PlatformResult<bool> {
        let process = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }
            .map_err(win32_error("OpenProcess"))?;
        let process = OwnedHandle(process);
        token_is_elevated(process.0)
    }

    fn is_current_process_elevated(&self) -> PlatformResult<bool> {
        // Pseudo handle, never closed
        token_is_elevated(unsafe { GetCurrentProcess() })
    }
}
