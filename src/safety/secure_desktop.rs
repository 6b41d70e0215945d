//! Secure desktop detection
//!
//! The UAC consent prompt, the lock screen and the Ctrl+Alt+Del screen run
//! on an isolated desktop object that a normal process cannot open. Input
//! injected while one of them is up goes nowhere.

use std::sync::Arc;

use tracing::debug;

use crate::platform::DesktopAccess;

/// Reports whether a secure desktop currently owns user input
pub trait SecureDesktopDetector: Send + Sync {
    fn is_secure_desktop_active(&self) -> bool;
}

/// Detects the secure desktop by trying to open the input desktop
///
/// Single snapshot, no retry: desktop state may legitimately flip between
/// calls, so callers check right before they inject.
pub struct InputDesktopDetector {
    desktop: Arc<dyn DesktopAccess>,
}

impl InputDesktopDetector {
    pub fn new(desktop: Arc<dyn DesktopAccess>) -> Self {
        Self { desktop }
    }
}

impl SecureDesktopDetector for InputDesktopDetector {
    fn is_secure_desktop_active(&self) -> bool {
        match self.desktop.open_input_desktop() {
            Ok(handle) => {
                self.desktop.close_desktop(handle);
                false
            }
            Err(e) => {
                debug!(error = %e, "input desktop not accessible, assuming secure desktop");
                true
            }
        }
    }
}
