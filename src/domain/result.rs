//! Operation outcomes handed back to the tool layer
//!
//! Expected conditions (blocked targets, bad coordinates, timeouts) are
//! represented here as result codes rather than as `Err` values, so the caller
//! can serialize them without reinterpretation.

use serde::{Deserialize, Serialize};

use crate::domain::core::{ScreenBounds, ScreenPoint};

/// Fixed error taxonomy shared by every public operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseErrorCode {
    Success,
    /// Target window belongs to an elevated process; never retried
    ElevatedProcessTarget,
    /// UAC prompt, lock screen or Ctrl+Alt+Del screen is up; never retried
    SecureDesktopActive,
    /// Target lies outside the virtual desktop
    InvalidCoordinates,
    /// Foreground activation ladder exhausted
    ActivationFailed,
    /// Activation or verification exceeded its budget
    Timeout,
    /// Unexpected query or injection failure
    SystemError,
}

impl MouseErrorCode {
    pub fn is_success(self) -> bool {
        self == MouseErrorCode::Success
    }
}

impl std::fmt::Display for MouseErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MouseErrorCode::Success => "success",
            MouseErrorCode::ElevatedProcessTarget => "elevated_process_target",
            MouseErrorCode::SecureDesktopActive => "secure_desktop_active",
            MouseErrorCode::InvalidCoordinates => "invalid_coordinates",
            MouseErrorCode::ActivationFailed => "activation_failed",
            MouseErrorCode::Timeout => "timeout",
            MouseErrorCode::SystemError => "system_error",
        };
        f.write_str(name)
    }
}

/// Cursor read-back taken after injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCheck {
    /// Where the cursor actually is
    pub actual: ScreenPoint,
    /// `actual - requested` per axis
    pub delta: (i32, i32),
    /// Whether `actual` was within tolerance of the requested point
    pub verified: bool,
}

/// Outcome of a mouse operation
///
/// Construct through [`MouseControlResult::succeeded`] or
/// [`MouseControlResult::failed`]; `success` is true exactly when the error
/// code is [`MouseErrorCode::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseControlResult {
    success: bool,
    error_code: MouseErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested_position: Option<ScreenPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_position: Option<ScreenPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    position_delta: Option<(i32, i32)>,
    position_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    screen_bounds: Option<ScreenBounds>,
}

impl MouseControlResult {
    /// A completed operation with its cursor read-back
    pub fn succeeded(requested: ScreenPoint, check: PositionCheck) -> Self {
        Self {
            success: true,
            error_code: MouseErrorCode::Success,
            error: None,
            requested_position: Some(requested),
            final_position: Some(check.actual),
            position_delta: Some(check.delta),
            position_verified: check.verified,
            screen_bounds: None,
        }
    }

    /// A failed operation
    ///
    /// Passing [`MouseErrorCode::Success`] here is a programming error and is
    /// reported as [`MouseErrorCode::SystemError`] instead.
    pub fn failed(code: MouseErrorCode, message: impl Into<String>) -> Self {
        let code = if code.is_success() {
            MouseErrorCode::SystemError
        } else {
            code
        };
        Self {
            success: false,
            error_code: code,
            error: Some(message.into()),
            requested_position: None,
            final_position: None,
            position_delta: None,
            position_verified: false,
            screen_bounds: None,
        }
    }

    /// Attaches the virtual desktop bounds used for validation
    pub fn with_bounds(mut self, bounds: ScreenBounds) -> Self {
        self.screen_bounds = Some(bounds);
        self
    }

    /// Attaches the point the operation targeted
    pub fn with_requested(mut self, requested: ScreenPoint) -> Self {
        self.requested_position = Some(requested);
        self
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn error_code(&self) -> MouseErrorCode {
        self.error_code
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn requested_position(&self) -> Option<ScreenPoint> {
        self.requested_position
    }

    pub fn final_position(&self) -> Option<ScreenPoint> {
        self.final_position
    }

    pub fn position_delta(&self) -> Option<(i32, i32)> {
        self.position_delta
    }

    pub fn position_verified(&self) -> bool {
        self.position_verified
    }

    pub fn screen_bounds(&self) -> Option<ScreenBounds> {
        self.screen_bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_flag_tracks_error_code() {
        let check = PositionCheck {
            actual: ScreenPoint::new(10, 10),
            delta: (0, 0),
            verified: true,
        };
        let ok = MouseControlResult::succeeded(ScreenPoint::new(10, 10), check);
        assert!(ok.success());
        assert_eq!(ok.error_code(), MouseErrorCode::Success);
        assert!(ok.error().is_none());

        let failed = MouseControlResult::failed(MouseErrorCode::Timeout, "timed out");
        assert!(!failed.success());
        assert_eq!(failed.error_code(), MouseErrorCode::Timeout);
    }

    #[test]
    fn failure_cannot_carry_success_code() {
        let result = MouseControlResult::failed(MouseErrorCode::Success, "oops");
        assert!(!result.success());
        assert_eq!(result.error_code(), MouseErrorCode::SystemError);
    }

    #[test]
    fn serializes_error_code_in_snake_case() {
        let result = MouseControlResult::failed(MouseErrorCode::InvalidCoordinates, "outside")
            .with_bounds(ScreenBounds::new(0, 0, 1920, 1080));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error_code"], "invalid_coordinates");
        assert_eq!(json["success"], false);
        assert_eq!(json["screen_bounds"]["width"], 1920);
        assert!(json.get("final_position").is_none());
    }
}
