//! Pre-injection policy checks
//!
//! Every input operation runs [`SafetyGate::check`] before it touches a key or
//! a button. A violation aborts the operation with zero injected events.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use super::{ElevationDetector, SecureDesktopDetector};
use crate::domain::{MouseErrorCode, ScreenPoint};

/// Reason an operation was refused before injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateViolation {
    #[error("Cannot perform operation: secure desktop (UAC, lock screen) is active")]
    SecureDesktopActive,
    #[error(
        "Cannot send input to elevated (administrator) window at {point}. \
         Input to elevated processes is blocked by UIPI unless this process also runs elevated."
    )]
    ElevatedTarget { point: ScreenPoint },
}

impl GateViolation {
    pub fn error_code(&self) -> MouseErrorCode {
        match self {
            GateViolation::SecureDesktopActive => MouseErrorCode::SecureDesktopActive,
            GateViolation::ElevatedTarget { .. } => MouseErrorCode::ElevatedProcessTarget,
        }
    }
}

/// Combines the secure desktop and elevated target checks
#[derive(Clone)]
pub struct SafetyGate {
    secure_desktop: Arc<dyn SecureDesktopDetector>,
    elevation: Arc<dyn ElevationDetector>,
}

impl SafetyGate {
    pub fn new(
        secure_desktop: Arc<dyn SecureDesktopDetector>,
        elevation: Arc<dyn ElevationDetector>,
    ) -> Self {
        Self {
            secure_desktop,
            elevation,
        }
    }

    /// Checks the secure desktop once, then every target point in order
    pub fn check(&self, targets: &[ScreenPoint]) -> Result<(), GateViolation> {
        if self.secure_desktop.is_secure_desktop_active() {
            info!("secure desktop active, refusing input");
            return Err(GateViolation::SecureDesktopActive);
        }

        for &point in targets {
            if self.elevation.is_target_elevated(point) {
                info!(%point, "elevated target, refusing input");
                return Err(GateViolation::ElevatedTarget { point });
            }
        }

        debug!(targets = targets.len(), "safety gate passed");
        Ok(())
    }
}
