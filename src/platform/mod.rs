//! Platform capability contracts and their Windows implementation
//!
//! The rest of the crate never talks to Win32 directly. It consumes the
//! narrow traits below, which lets tests substitute fakes for live desktop,
//! keyboard and process state. Every method re-queries the OS; implementors
//! must not cache.

use crate::domain::{
    MouseButton, NormalizedPoint, ScreenBounds, ScreenPoint, VirtualKey, WheelOrientation,
    WindowHandle,
};
use crate::error::PlatformResult;

pub mod monitors;

#[cfg(windows)]
pub mod desktop;
#[cfg(windows)]
pub mod input;
#[cfg(windows)]
pub mod window;
#[cfg(windows)]
pub mod windows;

#[cfg(test)]
pub(crate) mod fakes;

#[cfg(windows)]
pub use self::windows::Win32Platform;

/// One synthesized input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Absolute move across the whole virtual desktop
    MoveAbsolute(NormalizedPoint),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    /// Wheel rotation in multiples of [`crate::domain::mouse::WHEEL_DELTA`]
    Wheel {
        orientation: WheelOrientation,
        delta: i32,
    },
    KeyDown(VirtualKey),
    KeyUp(VirtualKey),
}

impl InputEvent {
    /// Returns true for key and button transitions
    pub fn changes_held_state(&self) -> bool {
        matches!(
            self,
            InputEvent::ButtonDown(_)
                | InputEvent::ButtonUp(_)
                | InputEvent::KeyDown(_)
                | InputEvent::KeyUp(_)
        )
    }
}

/// Injects batches of input events into the OS input stream
pub trait InputInjector: Send + Sync {
    /// Sends `events` as one uninterrupted batch
    ///
    /// # Returns
    /// Number of events the OS accepted. The OS may accept fewer than
    /// requested without reporting an error.
    fn send(&self, events: &[InputEvent]) -> PlatformResult<usize>;
}

/// Live screen geometry and cursor state
pub trait ScreenQuery: Send + Sync {
    /// Union rectangle of all monitors, in physical pixels
    fn virtual_screen_bounds(&self) -> PlatformResult<ScreenBounds>;

    /// Current cursor position, in physical pixels
    fn cursor_position(&self) -> PlatformResult<ScreenPoint>;
}

/// Live keyboard state
pub trait KeyboardState: Send + Sync {
    /// Returns true if `key` is physically or synthetically down right now
    fn is_key_down(&self, key: VirtualKey) -> bool;
}

/// Foreground window primitives used by the activation ladder
///
/// Return values of the mutating calls are what the OS reported and must not
/// be trusted as proof that the foreground changed.
pub trait ForegroundAccess: Send + Sync {
    /// May be null during transitions or while a secure desktop is up
    fn foreground_window(&self) -> WindowHandle;
    fn is_window(&self, window: WindowHandle) -> bool;
    fn is_minimized(&self, window: WindowHandle) -> bool;
    fn set_foreground(&self, window: WindowHandle) -> bool;
    fn bring_to_top(&self, window: WindowHandle) -> bool;
    fn minimize(&self, window: WindowHandle);
    fn restore(&self, window: WindowHandle);
    fn current_thread_id(&self) -> u32;
    fn window_thread_id(&self, window: WindowHandle) -> Option<u32>;
    /// Attaches (or detaches) the input queue of thread `from` to thread `to`
    fn attach_thread_input(&self, from: u32, to: u32, attach: bool) -> bool;
}

/// Window ownership and process elevation queries
pub trait ProcessAccess: Send + Sync {
    /// Top-level window under a physical point, or null
    fn root_window_at(&self, point: ScreenPoint) -> WindowHandle;
    fn window_process_id(&self, window: WindowHandle) -> Option<u32>;
    fn current_process_id(&self) -> u32;
    /// Reads the token-elevation flag of process `pid`
    fn is_process_elevated(&self, pid: u32) -> PlatformResult<bool>;
    fn is_current_process_elevated(&self) -> PlatformResult<bool>;
}

/// Raw handle to an opened desktop object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesktopHandle(pub isize);

/// Access to the interactive input desktop
pub trait DesktopAccess: Send + Sync {
    /// Opens the desktop currently receiving user input with switch rights
    fn open_input_desktop(&self) -> PlatformResult<DesktopHandle>;
    fn close_desktop(&self, desktop: DesktopHandle);
}
