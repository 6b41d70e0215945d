//! Safety-gated mouse input and window activation for Windows desktops
//!
//! Operations are driven by an external automation caller. Every input
//! operation is checked against the secure desktop and UIPI before anything is
//! synthesized, and every effect is confirmed by reading OS state back.
//!
//! OS access goes through the capability traits in [`platform`]; the live
//! implementation is [`platform::Win32Platform`] on Windows.

pub mod config;
pub mod domain;
pub mod error;
pub mod input;
pub mod logging;
pub mod platform;
pub mod safety;
pub mod window;

pub use config::{MouseConfiguration, WindowConfiguration};
pub use domain::{
    ModifierSet, MouseButton, MouseControlResult, MouseErrorCode, ScreenBounds, ScreenPoint,
    ScrollDirection, WindowHandle,
};
pub use error::{PlatformError, PlatformResult};
pub use input::MouseInputService;
pub use safety::SafetyGate;
pub use window::{ActivationOutcome, ForegroundActivator, WindowActivator};
