//! SendInput-based injection and live cursor/keyboard queries

use std::mem::size_of;

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBD_EVENT_FLAGS, KEYBDINPUT,
    KEYEVENTF_KEYUP, MOUSE_EVENT_FLAGS, MOUSEEVENTF_ABSOLUTE, MOUSEEVENTF_HWHEEL,
    MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP,
    MOUSEEVENTF_MOVE, MOUSEEVENTF_RIGHTDOWN, MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_VIRTUALDESK,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, SendInput, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetSystemMetrics, SM_CXVIRTUALSCREEN, SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN,
    SM_YVIRTUALSCREEN,
};

use super::windows::{Win32Platform, point_from_win32, win32_error};
use super::{InputEvent, InputInjector, KeyboardState, ScreenQuery};
use crate::domain::{MouseButton, ScreenBounds, ScreenPoint, VirtualKey, WheelOrientation};
use crate::error::{PlatformError, PlatformResult};

fn mouse_input(dx: i32, dy: i32, mouse_data: u32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: mouse_data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn key_input(key: VirtualKey, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(key.code()),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn button_flags(button: MouseButton, down: bool) -> MOUSE_EVENT_FLAGS {
    match (button, down) {
        (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
        (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
        (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
        (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
        (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
        (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
    }
}

/// Builds the native record for one event
fn to_native(event: &InputEvent) -> INPUT {
    match *event {
        InputEvent::MoveAbsolute(point) => mouse_input(
            point.x,
            point.y,
            0,
            MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE | MOUSEEVENTF_VIRTUALDESK,
        ),
        InputEvent::ButtonDown(button) => mouse_input(0, 0, 0, button_flags(button, true)),
        InputEvent::ButtonUp(button) => mouse_input(0, 0, 0, button_flags(button, false)),
        InputEvent::Wheel { orientation, delta } => {
            let flags = match orientation {
                WheelOrientation::Vertical => MOUSEEVENTF_WHEEL,
                WheelOrientation::Horizontal => MOUSEEVENTF_HWHEEL,
            };
            // Signed delta travels in an unsigned field
            mouse_input(0, 0, delta as u32, flags)
        }
        InputEvent::KeyDown(key) => key_input(key, KEYBD_EVENT_FLAGS(0)),
        InputEvent::KeyUp(key) => key_input(key, KEYEVENTF_KEYUP),
    }
}

impl InputInjector for Win32Platform {
    fn send(&self, events: &[InputEvent]) -> PlatformResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }
        let inputs: Vec<INPUT> = events.iter().map(to_native).collect();
        let accepted = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) } as usize;
        if accepted == 0 {
            // Blocked by another thread or by UIPI; the OS gives no detail
            return Err(PlatformError::InjectionRejected {
                requested: inputs.len(),
                accepted,
            });
        }
        Ok(accepted)
    }
}

impl ScreenQuery for Win32Platform {
    fn virtual_screen_bounds(&self) -> PlatformResult<ScreenBounds> {
        let bounds = unsafe {
            ScreenBounds::new(
                GetSystemMetrics(SM_XVIRTUALSCREEN),
                GetSystemMetrics(SM_YVIRTUALSCREEN),
                GetSystemMetrics(SM_CXVIRTUALSCREEN),
                GetSystemMetrics(SM_CYVIRTUALSCREEN),
            )
        };
        if !bounds.is_valid() {
            return Err(PlatformError::QueryFailed(format!(
                "virtual screen metrics are empty: {bounds}"
            )));
        }
        Ok(bounds)
    }

    fn cursor_position(&self) -> PlatformResult<ScreenPoint> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }.map_err(win32_error("GetCursorPos"))?;
        Ok(point_from_win32(point))
    }
}

impl KeyboardState for Win32Platform {
    fn is_key_down(&self, key: VirtualKey) -> bool {
        // High bit set means the key is down right now
        unsafe { GetAsyncKeyState(i32::from(key.code())) < 0 }
    }
}
