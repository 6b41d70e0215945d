//! Safety gates that run before any input is synthesized

pub mod elevation;
pub mod gate;
pub mod secure_desktop;

pub use elevation::{ElevationDetector, TokenElevationDetector};
pub use gate::{GateViolation, SafetyGate};
pub use secure_desktop::{InputDesktopDetector, SecureDesktopDetector};
