//! Input desktop access

use windows::Win32::System::StationsAndDesktops::{
    CloseDesktop, DESKTOP_CONTROL_FLAGS, DESKTOP_SWITCHDESKTOP, HDESK, OpenInputDesktop,
};

use super::windows::{Win32Platform, win32_error};
use super::{DesktopAccess, DesktopHandle};
use crate::error::PlatformResult;

impl DesktopAccess for Win32Platform {
    fn open_input_desktop(&self) -> PlatformResult<DesktopHandle> {
        let desktop =
            unsafe { OpenInputDesktop(DESKTOP_CONTROL_FLAGS(0), false, DESKTOP_SWITCHDESKTOP) }
                .map_err(win32_error("OpenInputDesktop"))?;
        Ok(DesktopHandle(desktop.0))
    }

    fn close_desktop(&self, desktop: DesktopHandle) {
        let _ = unsafe { CloseDesktop(HDESK(desktop.0)) };
    }
}
