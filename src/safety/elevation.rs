//! Elevated target detection
//!
//! User Interface Privilege Isolation silently drops input sent from a
//! non-elevated process to an elevated window. `SendInput` still reports
//! success, so the block has to be detected before injecting.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ScreenPoint;
use crate::platform::ProcessAccess;

/// Reports whether input aimed at a point would be dropped by UIPI
pub trait ElevationDetector: Send + Sync {
    /// True only if the window under `point` is elevated and the caller is not
    fn is_target_elevated(&self, point: ScreenPoint) -> bool;
}

/// Compares token elevation of the target's owning process with our own
pub struct TokenElevationDetector {
    processes: Arc<dyn ProcessAccess>,
}

impl TokenElevationDetector {
    pub fn new(processes: Arc<dyn ProcessAccess>) -> Self {
        Self { processes }
    }
}

impl ElevationDetector for TokenElevationDetector {
    fn is_target_elevated(&self, point: ScreenPoint) -> bool {
        match self.processes.is_current_process_elevated() {
            // An elevated caller can reach every window
            Ok(true) => return false,
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "could not read own elevation, assuming not elevated");
            }
        }

        let window = self.processes.root_window_at(point);
        if window.is_null() {
            debug!(%point, "no window under point");
            return false;
        }

        let Some(pid) = self.processes.window_process_id(window) else {
            debug!(%window, "window has no owning process");
            return false;
        };

        if pid == self.processes.current_process_id() {
            return false;
        }

        match self.processes.is_process_elevated(pid) {
            Ok(elevated) => {
                debug!(%point, %window, pid, elevated, "target elevation");
                elevated
            }
            // A non-elevated caller is refused the token of an elevated process
            Err(e) if e.is_access_denied() => {
                debug!(%window, pid, "token access denied, treating target as elevated");
                true
            }
            Err(e) => {
                warn!(%window, pid, error = %e, "could not read target elevation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ScreenBounds, WindowHandle};
    use crate::platform::fakes::{CALLER_PID, FakeDesktop};

    const ADMIN_PID: u32 = 4242;
    const USER_PID: u32 = 777;

    fn desktop_with_windows() -> Arc<FakeDesktop> {
        let fake = Arc::new(FakeDesktop::primary());
        fake.add_window(WindowHandle(1), ScreenBounds::new(0, 0, 960, 1080), USER_PID, 10);
        fake.add_window(WindowHandle(2), ScreenBounds::new(960, 0, 960, 1080), ADMIN_PID, 20);
        fake.with(|s| s.elevated_pids.insert(ADMIN_PID));
        fake
    }

    #[test]
    fn elevated_target_with_normal_caller_is_blocked() {
        let fake = desktop_with_windows();
        let detector = TokenElevationDetector::new(fake.clone());

        assert!(detector.is_target_elevated(ScreenPoint::new(1500, 500)));
        assert!(!detector.is_target_elevated(ScreenPoint::new(100, 500)));
    }

    #[test]
    fn elevated_caller_reaches_everything() {
        let fake = desktop_with_windows();
        fake.with(|s| s.caller_elevated = true);
        let detector = TokenElevationDetector::new(fake.clone());

        assert!(!detector.is_target_elevated(ScreenPoint::new(1500, 500)));
        assert_eq!(fake.with(|s| s.elevation_queries), 0);
    }

    #[test]
    fn no_window_under_point_is_not_elevated() {
        let fake = Arc::new(FakeDesktop::primary());
        let detector = TokenElevationDetector::new(fake);

        assert!(!detector.is_target_elevated(ScreenPoint::new(50, 50)));
    }

    #[test]
    fn own_window_is_not_elevated() {
        let fake = Arc::new(FakeDesktop::primary());
        fake.add_window(WindowHandle(9), ScreenBounds::new(0, 0, 1920, 1080), CALLER_PID, 1);
        let detector = TokenElevationDetector::new(fake.clone());

        assert!(!detector.is_target_elevated(ScreenPoint::new(10, 10)));
        assert_eq!(fake.with(|s| s.elevation_queries), 0);
    }

    #[test]
    fn denied_token_counts_as_elevated() {
        let fake = desktop_with_windows();
        fake.with(|s| {
            s.elevated_pids.clear();
            s.token_denied_pids.insert(ADMIN_PID)
        });
        let detector = TokenElevationDetector::new(fake);

        assert!(detector.is_target_elevated(ScreenPoint::new(1500, 500)));
    }
}
