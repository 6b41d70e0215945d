//! In-memory desktop used by unit tests
//!
//! Implements every platform capability over a single shared state so tests
//! can observe exactly which events reached the "OS".

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use super::{
    DesktopAccess, DesktopHandle, ForegroundAccess, InputEvent, InputInjector, KeyboardState,
    ProcessAccess, ScreenQuery,
};
use crate::domain::core::ABSOLUTE_SPAN;
use crate::domain::{MouseButton, ScreenBounds, ScreenPoint, VirtualKey, WindowHandle};
use crate::error::{PlatformError, PlatformResult};

/// When a foreground request actually takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ForegroundPolicy {
    Always,
    Never,
    /// Only while the caller's input queue is attached to the target's thread
    WhenAttached,
    /// Only after the target was minimized and restored
    AfterNudge,
}

pub(crate) const CALLER_THREAD: u32 = 1;
pub(crate) const CALLER_PID: u32 = 100;

pub(crate) struct FakeState {
    pub bounds: ScreenBounds,
    pub cursor: ScreenPoint,
    /// Cursor stays here no matter what is injected
    pub pinned_cursor: Option<ScreenPoint>,
    pub cursor_query_fails: bool,
    pub keys_down: HashSet<VirtualKey>,
    pub buttons_down: HashSet<MouseButton>,
    pub events: Vec<InputEvent>,
    /// Accept at most this many events per batch
    pub accept_limit: Option<usize>,
    /// Batches containing a key-down are accepted with zero events
    pub reject_key_down: bool,
    /// This many batches containing a key-up fail outright
    pub failing_key_up_batches: usize,

    pub foreground: WindowHandle,
    pub windows: HashSet<WindowHandle>,
    pub minimized: HashSet<WindowHandle>,
    pub window_threads: HashMap<WindowHandle, u32>,
    pub policy: ForegroundPolicy,
    pub attached: bool,
    pub nudged: HashSet<WindowHandle>,
    pub foreground_calls: Vec<&'static str>,

    pub windows_at: Vec<(ScreenBounds, WindowHandle)>,
    pub window_pids: HashMap<WindowHandle, u32>,
    pub elevated_pids: HashSet<u32>,
    pub token_denied_pids: HashSet<u32>,
    pub caller_elevated: bool,
    pub elevation_queries: usize,

    pub secure_desktop: bool,
    pub desktop_opens: usize,
    pub desktop_closes: usize,
}

pub(crate) struct FakeDesktop {
    state: Mutex<FakeState>,
}

impl FakeDesktop {
    pub fn new(bounds: ScreenBounds) -> Self {
        Self {
            state: Mutex::new(FakeState {
                bounds,
                cursor: ScreenPoint::new(bounds.left, bounds.top),
                pinned_cursor: None,
                cursor_query_fails: false,
                keys_down: HashSet::new(),
                buttons_down: HashSet::new(),
                events: Vec::new(),
                accept_limit: None,
                reject_key_down: false,
                failing_key_up_batches: 0,
                foreground: WindowHandle::NULL,
                windows: HashSet::new(),
                minimized: HashSet::new(),
                window_threads: HashMap::new(),
                policy: ForegroundPolicy::Always,
                attached: false,
                nudged: HashSet::new(),
                foreground_calls: Vec::new(),
                windows_at: Vec::new(),
                window_pids: HashMap::new(),
                elevated_pids: HashSet::new(),
                token_denied_pids: HashSet::new(),
                caller_elevated: false,
                elevation_queries: 0,
                secure_desktop: false,
                desktop_opens: 0,
                desktop_closes: 0,
            }),
        }
    }

    /// Single 1920x1080 monitor at the origin
    pub fn primary() -> Self {
        Self::new(ScreenBounds::new(0, 0, 1920, 1080))
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.with(|s| s.events.clone())
    }

    /// Key and button transitions that reached the OS
    pub fn held_state_events(&self) -> Vec<InputEvent> {
        self.with(|s| {
            s.events
                .iter()
                .copied()
                .filter(InputEvent::changes_held_state)
                .collect()
        })
    }

    /// Registers a top-level window covering `area`, owned by `pid`
    pub fn add_window(&self, handle: WindowHandle, area: ScreenBounds, pid: u32, thread: u32) {
        self.with(|s| {
            s.windows.insert(handle);
            s.windows_at.push((area, handle));
            s.window_pids.insert(handle, pid);
            s.window_threads.insert(handle, thread);
        });
    }
}

impl FakeState {
    fn denormalize(&self, x: i32, y: i32) -> ScreenPoint {
        let px = self.bounds.left
            + (f64::from(x) * f64::from(self.bounds.width) / ABSOLUTE_SPAN).round() as i32;
        let py = self.bounds.top
            + (f64::from(y) * f64::from(self.bounds.height) / ABSOLUTE_SPAN).round() as i32;
        ScreenPoint::new(px, py)
    }

    fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::MoveAbsolute(point) => {
                self.cursor = self.denormalize(point.x, point.y);
            }
            InputEvent::ButtonDown(button) => {
                self.buttons_down.insert(button);
            }
            InputEvent::ButtonUp(button) => {
                self.buttons_down.remove(&button);
            }
            InputEvent::KeyDown(key) => {
                self.keys_down.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.keys_down.remove(&key);
            }
            InputEvent::Wheel { .. } => {}
        }
    }
}

impl InputInjector for FakeDesktop {
    fn send(&self, events: &[InputEvent]) -> PlatformResult<usize> {
        self.with(|s| {
            let has = |wanted: fn(&InputEvent) -> bool| events.iter().any(wanted);
            if s.reject_key_down && has(|e| matches!(e, InputEvent::KeyDown(_))) {
                return Ok(0);
            }
            if s.failing_key_up_batches > 0 && has(|e| matches!(e, InputEvent::KeyUp(_))) {
                s.failing_key_up_batches -= 1;
                return Err(PlatformError::InjectionRejected {
                    requested: events.len(),
                    accepted: 0,
                });
            }

            let accepted = s.accept_limit.map_or(events.len(), |l| l.min(events.len()));
            for event in &events[..accepted] {
                s.events.push(*event);
                s.apply(*event);
            }
            Ok(accepted)
        })
    }
}

impl ScreenQuery for FakeDesktop {
    fn virtual_screen_bounds(&self) -> PlatformResult<ScreenBounds> {
        Ok(self.with(|s| s.bounds))
    }

    fn cursor_position(&self) -> PlatformResult<ScreenPoint> {
        self.with(|s| {
            if s.cursor_query_fails {
                return Err(PlatformError::QueryFailed("cursor position".into()));
            }
            Ok(s.pinned_cursor.unwrap_or(s.cursor))
        })
    }
}

impl KeyboardState for FakeDesktop {
    fn is_key_down(&self, key: VirtualKey) -> bool {
        self.with(|s| s.keys_down.contains(&key))
    }
}

impl ForegroundAccess for FakeDesktop {
    fn foreground_window(&self) -> WindowHandle {
        self.with(|s| s.foreground)
    }

    fn is_window(&self, window: WindowHandle) -> bool {
        self.with(|s| s.windows.contains(&window))
    }

    fn is_minimized(&self, window: WindowHandle) -> bool {
        self.with(|s| s.minimized.contains(&window))
    }

    fn set_foreground(&self, window: WindowHandle) -> bool {
        self.with(|s| {
            s.foreground_calls.push("set_foreground");
            let granted = match s.policy {
                ForegroundPolicy::Always => true,
                ForegroundPolicy::Never => false,
                ForegroundPolicy::WhenAttached => s.attached,
                ForegroundPolicy::AfterNudge => s.nudged.contains(&window),
            };
            if granted {
                s.foreground = window;
            }
            // The OS reports success even when it silently denies the change
            true
        })
    }

    fn bring_to_top(&self, _window: WindowHandle) -> bool {
        self.with(|s| s.foreground_calls.push("bring_to_top"));
        true
    }

    fn minimize(&self, window: WindowHandle) {
        self.with(|s| {
            s.foreground_calls.push("minimize");
            s.minimized.insert(window);
        });
    }

    fn restore(&self, window: WindowHandle) {
        self.with(|s| {
            s.foreground_calls.push("restore");
            if s.minimized.remove(&window) {
                s.nudged.insert(window);
            }
        });
    }

    fn current_thread_id(&self) -> u32 {
        CALLER_THREAD
    }

    fn window_thread_id(&self, window: WindowHandle) -> Option<u32> {
        self.with(|s| s.window_threads.get(&window).copied())
    }

    fn attach_thread_input(&self, _from: u32, _to: u32, attach: bool) -> bool {
        self.with(|s| {
            s.foreground_calls
                .push(if attach { "attach" } else { "detach" });
            s.attached = attach;
            true
        })
    }
}

impl ProcessAccess for FakeDesktop {
    fn root_window_at(&self, point: ScreenPoint) -> WindowHandle {
        self.with(|s| {
            s.windows_at
                .iter()
                .rev()
                .find(|(area, _)| area.contains(point))
                .map(|(_, handle)| *handle)
                .unwrap_or(WindowHandle::NULL)
        })
    }

    fn window_process_id(&self, window: WindowHandle) -> Option<u32> {
        self.with(|s| s.window_pids.get(&window).copied())
    }

    fn current_process_id(&self) -> u32 {
        CALLER_PID
    }

    fn is_process_elevated(&self, pid: u32) -> PlatformResult<bool> {
        self.with(|s| {
            s.elevation_queries += 1;
            if s.token_denied_pids.contains(&pid) {
                return Err(PlatformError::AccessDenied(format!("token of process {pid}")));
            }
            Ok(s.elevated_pids.contains(&pid))
        })
    }

    fn is_current_process_elevated(&self) -> PlatformResult<bool> {
        Ok(self.with(|s| s.caller_elevated))
    }
}

impl DesktopAccess for FakeDesktop {
    fn open_input_desktop(&self) -> PlatformResult<DesktopHandle> {
        self.with(|s| {
            if s.secure_desktop {
                return Err(PlatformError::AccessDenied("input desktop".into()));
            }
            s.desktop_opens += 1;
            Ok(DesktopHandle(0x40))
        })
    }

    fn close_desktop(&self, _desktop: DesktopHandle) {
        self.with(|s| s.desktop_closes += 1);
    }
}
